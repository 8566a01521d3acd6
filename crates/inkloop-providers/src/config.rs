//! Provider endpoints, sampling settings and credentials.
//!
//! Everything is read from the environment once, when the registry is built.
//! Credentials are never re-read per call.

use std::fmt;
use std::time::Duration;

use crate::models::Provider;
use crate::ProviderError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

pub const TAVILY_KEY_VAR: &str = "TAVILY_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub google_base_url: String,
    pub tavily_base_url: String,
    /// Sampling temperature for every generator.
    pub temperature: f32,
    /// Output token ceiling, required by the Anthropic API.
    pub max_output_tokens: u32,
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
            google_base_url: GOOGLE_BASE_URL.to_string(),
            tavily_base_url: TAVILY_BASE_URL.to_string(),
            temperature: 0.7,
            max_output_tokens: 4096,
            http_timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset variables keep their
    /// defaults; set but unparseable ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("INKLOOP_OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Some(url) = get("INKLOOP_ANTHROPIC_BASE_URL") {
            config.anthropic_base_url = url;
        }
        if let Some(url) = get("INKLOOP_GOOGLE_BASE_URL") {
            config.google_base_url = url;
        }
        if let Some(url) = get("INKLOOP_TAVILY_BASE_URL") {
            config.tavily_base_url = url;
        }
        if let Some(raw) = get("INKLOOP_TEMPERATURE") {
            config.temperature = parse_var("INKLOOP_TEMPERATURE", &raw)?;
            if !(0.0..=2.0).contains(&config.temperature) {
                return Err(ProviderError::InvalidVar {
                    var: "INKLOOP_TEMPERATURE",
                    value: raw,
                });
            }
        }
        if let Some(raw) = get("INKLOOP_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = parse_var("INKLOOP_MAX_OUTPUT_TOKENS", &raw)?;
        }
        if let Some(raw) = get("INKLOOP_HTTP_TIMEOUT_SECS") {
            config.http_timeout =
                Duration::from_secs(parse_var("INKLOOP_HTTP_TIMEOUT_SECS", &raw)?);
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ProviderError> {
    raw.trim().parse().map_err(|_| ProviderError::InvalidVar {
        var,
        value: raw.to_string(),
    })
}

/// API keys, read once.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
    pub tavily: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            openai: get(Provider::OpenAi.key_var()),
            anthropic: get(Provider::Anthropic.key_var()),
            google: get(Provider::Google.key_var()),
            tavily: get(TAVILY_KEY_VAR),
        }
    }

    pub fn for_provider(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::Google => self.google.as_deref(),
        }
    }

    pub fn tavily(&self) -> Option<&str> {
        self.tavily.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
        f.debug_struct("Credentials")
            .field("openai", &mask(&self.openai))
            .field("anthropic", &mask(&self.anthropic))
            .field("google", &mask(&self.google))
            .field("tavily", &mask(&self.tavily))
            .finish()
    }
}
