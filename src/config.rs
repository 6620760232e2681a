use crate::error::{LingoError, Result};
use crate::language::{Language, LanguagePair};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    DeepL,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::DeepL => write!(f, "deepl"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(Provider::DeepL),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(format!("Unknown provider: {}. Use 'deepl' or 'gemini'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub deepl_api_key: Option<String>,
    pub deepl_api_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub source_language: Language,
    pub target_language: Language,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            deepl_api_key: None,
            deepl_api_url: None,
            gemini_api_key: None,
            source_language: Language::En,
            target_language: Language::Es,
            debounce_ms: 100,
        }
    }
}

impl Config {
    /// Load the user config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a specific config file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("DEEPL_API_KEY") {
            self.deepl_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LINGOBATCH_DEEPL_URL") {
            self.deepl_api_url = Some(url);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("LINGOBATCH_PROVIDER") {
            if let Ok(p) = provider.parse() {
                self.provider = p;
            }
        }
        if let Ok(source) = std::env::var("LINGOBATCH_SOURCE") {
            if let Ok(lang) = source.parse() {
                self.source_language = lang;
            }
        }
        if let Ok(target) = std::env::var("LINGOBATCH_TARGET") {
            if let Ok(lang) = target.parse() {
                self.target_language = lang;
            }
        }
        if let Ok(debounce) = std::env::var("LINGOBATCH_DEBOUNCE_MS") {
            if let Ok(ms) = debounce.parse() {
                self.debounce_ms = ms;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.provider {
            Provider::DeepL => {
                if self.deepl_api_key.is_none() {
                    return Err(LingoError::Config(
                        "DEEPL_API_KEY not set. Get one at https://www.deepl.com/pro-api"
                            .to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if self.gemini_api_key.is_none() {
                    return Err(LingoError::Config(
                        "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                            .to_string(),
                    ));
                }
            }
        }

        if self.debounce_ms == 0 {
            return Err(LingoError::Config(
                "Debounce window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(self.source_language, self.target_language)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lingobatch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("deepl".parse::<Provider>().unwrap(), Provider::DeepL);
        assert_eq!("DeepL".parse::<Provider>().unwrap(), Provider::DeepL);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::DeepL);
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert_eq!(
            config.language_pair(),
            LanguagePair::new(Language::En, Language::Es)
        );
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.provider = Provider::Gemini;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_with_api_key() {
        let mut config = Config::default();
        config.deepl_api_key = Some("key:fx".to_string());
        assert!(config.validate().is_ok());

        config.provider = Provider::Gemini;
        config.gemini_api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_debounce() {
        let mut config = Config::default();
        config.deepl_api_key = Some("key:fx".to_string());
        config.debounce_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            provider = "gemini"
            target_language = "fr"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.source_language, Language::En);
        assert_eq!(config.target_language, Language::Fr);
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("LINGOBATCH_PROVIDER", "gemini");
        std::env::set_var("LINGOBATCH_TARGET", "de");
        std::env::set_var("LINGOBATCH_DEBOUNCE_MS", "not-a-number");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var("LINGOBATCH_PROVIDER");
        std::env::remove_var("LINGOBATCH_TARGET");
        std::env::remove_var("LINGOBATCH_DEBOUNCE_MS");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.target_language, Language::De);
        assert_eq!(config.debounce_ms, 100);
    }
}
