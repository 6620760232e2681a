//! Gemini-based translation using the Generative AI API.

use crate::error::{LingoError, Result};
use crate::language::LanguagePair;
use crate::translate::Translator;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// `[n]` at the start of a line. Brackets elsewhere belong to the translated text.
static NUMBER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[(\d+)\]").expect("number marker pattern is valid")
});

/// Translator using Google Gemini API.
pub struct GeminiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTranslator {
    /// Create a new Gemini translator with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gemini-2.0-flash".to_string(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Set a different model (e.g., "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_prompt(texts: &[String], pair: LanguagePair) -> String {
        let source = pair.source.name();
        let target = pair.target.name();

        if texts.len() == 1 {
            return format!(
                "Translate the following {source} UI text to {target}.\n\
                 Return ONLY the translated text, nothing else.\n\n{}",
                texts[0]
            );
        }

        let numbered = texts
            .iter()
            .enumerate()
            .map(|(i, t)| format!("[{}] {}", i + 1, t))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Translate each of the following numbered {source} UI texts to {target}.\n\
             Return ONLY the translations, each prefixed with its number in brackets.\n\n\
             {numbered}"
        )
    }
}

/// Split a numbered reply back into positions.
///
/// Markers must count upwards within `1..=count`. A line-start marker that
/// breaks that order means the reply is not laid out as asked, so the entry it
/// falls in is discarded instead of being merged into a neighbour. Numbers
/// that never appear, or appear with no text, stay `None`.
fn parse_numbered_reply(reply: &str, count: usize) -> Vec<Option<String>> {
    let mut markers: Vec<(usize, usize, usize)> = Vec::new();
    let mut stray: Vec<usize> = Vec::new();
    let mut last = 0;
    for caps in NUMBER_MARKER.captures_iter(reply) {
        let (Some(whole), Ok(number)) = (caps.get(0), caps[1].parse::<usize>()) else {
            continue;
        };
        if number <= last || number > count {
            stray.push(whole.start());
            continue;
        }
        last = number;
        markers.push((number, whole.start(), whole.end()));
    }

    let mut results = vec![None; count];
    for (i, &(number, _, text_start)) in markers.iter().enumerate() {
        let text_end = markers
            .get(i + 1)
            .map(|&(_, start, _)| start)
            .unwrap_or(reply.len());
        if stray.iter().any(|&pos| (text_start..text_end).contains(&pos)) {
            continue;
        }
        let text = reply[text_start..text_end].trim();
        if !text.is_empty() {
            results[number - 1] = Some(text.to_string());
        }
    }
    results
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<Option<String>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Translating {} text(s) with Gemini ({})", texts.len(), pair);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Self::build_prompt(texts, pair),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| LingoError::Api(format!("Translation request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LingoError::Api(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(LingoError::Api(format!(
                "Translation API error ({}): {}",
                status, body
            )));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)?;

        if let Some(error) = gemini_response.error {
            return Err(LingoError::Api(format!("Gemini error: {}", error.message)));
        }

        let reply = gemini_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        if texts.len() == 1 {
            let text = reply.trim();
            return Ok(vec![(!text.is_empty()).then(|| text.to_string())]);
        }

        let results = parse_numbered_reply(&reply, texts.len());
        let missing = results.iter().filter(|r| r.is_none()).count();
        if missing > 0 {
            warn!("Gemini reply is missing {} of {} translations", missing, texts.len());
        }
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
