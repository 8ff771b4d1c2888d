pub mod draft;
pub mod reply;
pub mod session;
pub mod supplier;
