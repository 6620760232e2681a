pub mod deepl;
pub mod gemini;

pub use deepl::DeepLTranslator;
pub use gemini::GeminiTranslator;

use crate::config::{Config, Provider};
use crate::error::{LingoError, Result};
use crate::language::LanguagePair;
use async_trait::async_trait;

/// A backend that translates many texts in one round trip.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` from `pair.source` to `pair.target`.
    ///
    /// The result is aligned by position with `texts`. A position the backend
    /// left unanswered is `None`, and the vector may be shorter than `texts`.
    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<Option<String>>>;

    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<Option<String>> {
        let results = self.translate_batch(&[text.to_string()], pair).await?;
        Ok(results.into_iter().next().flatten())
    }

    fn name(&self) -> &'static str;
}

/// Build the backend selected in `config`.
pub fn create_translator(config: &Config) -> Result<Box<dyn Translator>> {
    match config.provider {
        Provider::DeepL => {
            let key = config.deepl_api_key.clone().ok_or_else(|| {
                LingoError::Config("DEEPL_API_KEY not set".to_string())
            })?;
            let mut translator = DeepLTranslator::new(key);
            if let Some(ref url) = config.deepl_api_url {
                translator = translator.with_base_url(url.clone());
            }
            Ok(Box::new(translator))
        }
        Provider::Gemini => {
            let key = config.gemini_api_key.clone().ok_or_else(|| {
                LingoError::Config("GEMINI_API_KEY not set".to_string())
            })?;
            Ok(Box::new(GeminiTranslator::new(key)))
        }
    }
}
