//! Resolves `provider:model` identifiers into bound backends.

use std::sync::Arc;

use inkloop_core::{CapabilityError, CapabilityResolver, Generator, ModelId, Retriever};
use tracing::debug;

use crate::anthropic::AnthropicGenerator;
use crate::config::{Credentials, ProviderConfig, TAVILY_KEY_VAR};
use crate::google::GoogleGenerator;
use crate::http;
use crate::models::{ModelSpec, Provider};
use crate::openai::OpenAiGenerator;
use crate::ProviderError;

/// Registry over one shared HTTP client. Credentials are captured at
/// construction; a missing key surfaces as a configuration error when a
/// model of that provider is resolved.
pub struct ProviderRegistry {
    config: ProviderConfig,
    credentials: Credentials,
    client: reqwest::Client,
}

impl ProviderRegistry {
    pub fn new(config: ProviderConfig, credentials: Credentials) -> Result<Self, ProviderError> {
        let client = http::build_client(config.http_timeout)?;
        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(ProviderConfig::from_env()?, Credentials::from_env())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn key_for(&self, provider: Provider) -> Result<&str, CapabilityError> {
        self.credentials.for_provider(provider).ok_or_else(|| {
            CapabilityError::Configuration(format!(
                "{} is not set (required for {provider} models)",
                provider.key_var()
            ))
        })
    }
}

impl CapabilityResolver for ProviderRegistry {
    fn generator(&self, model: &ModelId) -> Result<Arc<dyn Generator>, CapabilityError> {
        let spec = ModelSpec::parse(model)?;
        let key = self.key_for(spec.provider)?;
        debug!(model = %spec, "binding generator");

        let cfg = &self.config;
        let client = self.client.clone();
        let generator: Arc<dyn Generator> = match spec.provider {
            Provider::OpenAi => Arc::new(OpenAiGenerator::new(
                client,
                &cfg.openai_base_url,
                key,
                spec.model,
                cfg.temperature,
            )),
            Provider::Anthropic => Arc::new(AnthropicGenerator::new(
                client,
                &cfg.anthropic_base_url,
                key,
                spec.model,
                cfg.temperature,
                cfg.max_output_tokens,
            )),
            Provider::Google => Arc::new(GoogleGenerator::new(
                client,
                &cfg.google_base_url,
                key,
                spec.model,
                cfg.temperature,
            )),
        };
        Ok(generator)
    }

    fn retriever(&self) -> Result<Arc<dyn Retriever>, CapabilityError> {
        let key = self.credentials.tavily().ok_or_else(|| {
            CapabilityError::Configuration(format!("{TAVILY_KEY_VAR} is not set"))
        })?;
        Ok(Arc::new(crate::tavily::TavilyRetriever::new(
            self.client.clone(),
            &self.config.tavily_base_url,
            key,
        )))
    }
}
