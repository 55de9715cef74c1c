pub mod commands;
pub mod error;
pub mod interactive;
pub mod llm;
pub mod output;
pub mod paths;
pub mod progress;
pub mod prompt;
pub mod proto;
pub mod settings;
pub mod source;
