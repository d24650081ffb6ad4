pub mod chat;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::launch;
