pub mod config;
pub mod gemini;
pub mod resolver;
pub mod system_prompt;
pub mod value_resolver;

pub use vibe_protocol as protocol;
