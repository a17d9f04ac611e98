mod extract;
mod generator;
mod prompt;
mod types;

pub use extract::extract_embedded_json;
pub use generator::FeedbackGenerator;
pub use prompt::build_instruction;
pub use types::{FeedbackRecord, FeedbackRequest, PromptInfo};
