pub mod config;
pub mod engine;
pub mod error;
pub mod interactive;
pub mod language;
pub mod translate;

pub use config::Config;
pub use engine::{EngineOptions, EngineState, EngineStats, TranslationEngine};
pub use error::{LingoError, Result};
pub use language::{Language, LanguagePair};
pub use translate::{create_translator, Translator};
