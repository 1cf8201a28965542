mod modules;

pub use modules::{config, gemini, protocol, resolver, system_prompt, value_resolver};
pub use resolver::{ResolutionError, VibeSettingsResolver};
pub use vibe_protocol::VibeParams;
