//! Provider names, `provider:model` parsing and the selectable model catalog.

use std::fmt;

use inkloop_core::{CapabilityError, ModelId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Google];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "anthropic" => Some(Provider::Anthropic),
            "google" | "gemini" => Some(Provider::Google),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
}

impl ModelSpec {
    /// Parse `provider:model`. Any model name is accepted for a known
    /// provider; the catalog is advisory.
    pub fn parse(id: &ModelId) -> Result<Self, CapabilityError> {
        let raw = id.as_str();
        let (provider, model) = raw.split_once(':').ok_or_else(|| {
            CapabilityError::Configuration(format!(
                "model id {raw:?} must have the form provider:model"
            ))
        })?;
        let provider = Provider::parse(provider).ok_or_else(|| {
            CapabilityError::Configuration(format!(
                "unknown provider {provider:?} in {raw:?} (expected openai, anthropic or google)"
            ))
        })?;
        let model = model.trim();
        if model.is_empty() {
            return Err(CapabilityError::Configuration(format!(
                "model id {raw:?} names no model"
            )));
        }
        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    pub provider: Provider,
    pub model: &'static str,
    pub display_name: &'static str,
}

impl CatalogEntry {
    pub fn id(&self) -> ModelId {
        ModelId::new(format!("{}:{}", self.provider, self.model))
    }
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        provider: Provider::OpenAi,
        model: "gpt-4o",
        display_name: "GPT-4o",
    },
    CatalogEntry {
        provider: Provider::OpenAi,
        model: "gpt-4o-mini",
        display_name: "GPT-4o Mini",
    },
    CatalogEntry {
        provider: Provider::Anthropic,
        model: "claude-3-5-sonnet-latest",
        display_name: "Claude 3.5 Sonnet",
    },
    CatalogEntry {
        provider: Provider::Anthropic,
        model: "claude-3-5-haiku-latest",
        display_name: "Claude 3.5 Haiku",
    },
    CatalogEntry {
        provider: Provider::Google,
        model: "gemini-1.5-pro",
        display_name: "Gemini 1.5 Pro",
    },
    CatalogEntry {
        provider: Provider::Google,
        model: "gemini-1.5-flash",
        display_name: "Gemini 1.5 Flash",
    },
];

pub fn catalog() -> &'static [CatalogEntry] {
    CATALOG
}

/// First catalog entry for `provider`.
pub fn default_model(provider: Provider) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.provider == provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_provider() {
        let spec = ModelSpec::parse(&ModelId::from("anthropic:claude-3-5-haiku-latest")).unwrap();
        assert_eq!(spec.provider, Provider::Anthropic);
        assert_eq!(spec.model, "claude-3-5-haiku-latest");
        assert_eq!(spec.to_string(), "anthropic:claude-3-5-haiku-latest");
    }

    #[test]
    fn test_parse_accepts_uncatalogued_model() {
        let spec = ModelSpec::parse(&ModelId::from("openai:o1-preview")).unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
    }

    #[test]
    fn test_gemini_alias() {
        let spec = ModelSpec::parse(&ModelId::from("gemini:gemini-1.5-pro")).unwrap();
        assert_eq!(spec.provider, Provider::Google);
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for raw in ["gpt-4o", "mistral:large", "openai:", "openai:  "] {
            let err = ModelSpec::parse(&ModelId::from(raw)).unwrap_err();
            assert!(err.is_configuration(), "{raw}: {err}");
        }
    }

    #[test]
    fn test_catalog_covers_every_provider() {
        for provider in Provider::ALL {
            let entry = default_model(provider).unwrap();
            let spec = ModelSpec::parse(&entry.id()).unwrap();
            assert_eq!(spec.provider, provider);
        }
        assert_eq!(catalog().len(), 6);
    }
}
