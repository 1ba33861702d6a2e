#[cfg(feature = "gemini")]
pub mod client;
pub mod extractor;
pub mod prompts;
pub mod service;
pub mod types;

#[cfg(feature = "gemini")]
pub use client::*;
pub use extractor::*;
pub use service::*;
pub use types::*;
