pub mod ai_service;
pub mod models;

pub use ai_service::{
    AiProvider, AiService, DEFAULT_FAST_INSTRUCTION, DEFAULT_RESEARCH_INSTRUCTION,
};
pub use models::{AiConfig, GenerationMode, ModeProfile};
