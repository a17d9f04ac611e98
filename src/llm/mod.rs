mod client;
mod types;

pub use client::{AnthropicClient, ReasoningClient};
pub use types::*;
