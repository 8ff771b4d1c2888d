use std::process::ExitCode;

fn main() -> ExitCode {
    posty_cli::run()
}
