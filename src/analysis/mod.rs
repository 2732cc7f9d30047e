pub mod analyzer;
pub mod context;
pub mod prompt;
pub mod types;


pub use analyzer::{Analyzer, FallbackFactory};
pub use context::ContextBuilder;
pub use prompt::render;
pub use types::*;
