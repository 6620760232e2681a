//! DeepL-based translation using the v2 REST API.

use crate::error::{LingoError, Result};
use crate::language::LanguagePair;
use crate::translate::Translator;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Endpoint for DeepL API Free keys.
pub const DEEPL_FREE_URL: &str = "https://api-free.deepl.com";

/// Endpoint for DeepL API Pro keys.
pub const DEEPL_PRO_URL: &str = "https://api.deepl.com";

/// Translator using the DeepL API.
pub struct DeepLTranslator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepLTranslator {
    /// Create a new DeepL translator with the given auth key.
    ///
    /// Free-tier keys end in `:fx` and are served from a separate host.
    pub fn new(api_key: String) -> Self {
        let base_url = if api_key.ends_with(":fx") {
            DEEPL_FREE_URL
        } else {
            DEEPL_PRO_URL
        };
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.to_string(),
        }
    }

    /// Point the client at another host (Pro endpoint, proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/translate", self.base_url)
    }

    /// Form fields for one batch. DeepL takes one `text` field per input and
    /// answers in the same order.
    fn build_form(texts: &[String], pair: LanguagePair) -> Vec<(&'static str, String)> {
        let mut form = Vec::with_capacity(texts.len() + 3);
        form.push(("source_lang", pair.source.deepl_code()));
        form.push(("target_lang", pair.target.deepl_target_code()));
        form.push(("split_sentences", "0".to_string()));
        form.extend(texts.iter().map(|text| ("text", text.clone())));
        form
    }
}

#[derive(Deserialize, Debug)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize, Debug)]
struct DeepLTranslation {
    #[allow(dead_code)]
    detected_source_language: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DeepLError {
    message: String,
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<Option<String>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Sending {} text(s) to DeepL ({})", texts.len(), pair);

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&Self::build_form(texts, pair))
            .send()
            .await
            .map_err(|e| LingoError::Api(format!("DeepL request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LingoError::Api(format!("Failed to read DeepL response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<DeepLError>(&body) {
                return Err(LingoError::Api(format!(
                    "DeepL error ({}): {}",
                    status, error.message
                )));
            }
            return Err(LingoError::Api(format!(
                "DeepL API error ({}): {}",
                status, body
            )));
        }

        let parsed: DeepLResponse = serde_json::from_str(&body)?;

        if parsed.translations.len() != texts.len() {
            debug!(
                "DeepL answered {} of {} texts",
                parsed.translations.len(),
                texts.len()
            );
        }

        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }

    fn name(&self) -> &'static str {
        "deepl"
    }
}
