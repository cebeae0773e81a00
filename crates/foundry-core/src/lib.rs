pub mod config;
pub mod labels;
pub mod types;

pub use config::FoundryConfig;
pub use types::*;
