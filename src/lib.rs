pub mod audio;
pub mod config;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
