use serde::{Deserialize, Serialize};

/// Languages the engine can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Nl,
    Pl,
    Ru,
    Ja,
    Ko,
    Zh,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Nl,
        Language::Pl,
        Language::Ru,
        Language::Ja,
        Language::Ko,
        Language::Zh,
    ];

    /// ISO 639-1 code, lowercase.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Nl => "nl",
            Language::Pl => "pl",
            Language::Ru => "ru",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
        }
    }

    /// Code in the form DeepL expects as a source language (`EN`, `ES`, ...).
    pub fn deepl_code(&self) -> String {
        self.code().to_uppercase()
    }

    /// DeepL requires a regional variant when English or Portuguese is the target.
    pub fn deepl_target_code(&self) -> String {
        match self {
            Language::En => "EN-US".to_string(),
            Language::Pt => "PT-PT".to_string(),
            other => other.deepl_code(),
        }
    }

    /// Human-readable name, used when prompting LLM backends.
    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Nl => "Dutch",
            Language::Pl => "Polish",
            Language::Ru => "Russian",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Zh => "Chinese",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowercase = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == lowercase)
            .ok_or_else(|| format!("Unknown language: {}", s))
    }
}

/// Source and target language. All cached translations are scoped to one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Translating within one language is the identity; no backend call is needed.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl std::fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("ES".parse::<Language>().unwrap(), Language::Es);
        assert_eq!(" ja ".parse::<Language>().unwrap(), Language::Ja);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Es.code(), "es");
        assert_eq!(Language::Es.deepl_code(), "ES");
        assert_eq!(Language::Es.deepl_target_code(), "ES");
        assert_eq!(Language::En.deepl_code(), "EN");
        assert_eq!(Language::En.deepl_target_code(), "EN-US");
        assert_eq!(Language::Zh.name(), "Chinese");
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn test_identity_pair() {
        assert!(LanguagePair::new(Language::En, Language::En).is_identity());
        assert!(!LanguagePair::new(Language::En, Language::Es).is_identity());
        assert_eq!(
            LanguagePair::new(Language::En, Language::Es).to_string(),
            "en->es"
        );
    }
}
