//! inkloop providers
//!
//! HTTP backends behind the `inkloop-core` capability traits: OpenAI,
//! Anthropic and Google generators, a Tavily retriever, the model catalog,
//! and [`ProviderRegistry`], which binds `provider:model` identifiers to
//! live backends.

pub mod anthropic;
pub mod config;
pub mod google;
pub mod http;
pub mod models;
pub mod openai;
pub mod registry;
pub mod tavily;

pub use config::{Credentials, ProviderConfig};
pub use models::{catalog, default_model, CatalogEntry, ModelSpec, Provider};
pub use registry::ProviderRegistry;

/// Failure building provider configuration or the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
