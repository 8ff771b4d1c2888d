pub mod drafter;
pub mod extractor;
pub mod llm;
pub mod openai;
pub mod parse;

pub use drafter::LlmDrafter;
pub use extractor::LlmExtractor;
pub use llm::LlmClient;
pub use openai::OpenAiClient;
