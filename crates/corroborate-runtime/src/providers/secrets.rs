//! Backend API keys.
//!
//! Each backend declares a [`CredentialSpec`] naming its config key and
//! environment variable. Resolved keys live in a [`SecretString`]; `Debug`
//! and `Display` never print them.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a key was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
    Programmatic,
}

impl CredentialSource {
    fn as_str(self) -> &'static str {
        match self {
            CredentialSource::Config => "config",
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        }
    }
}

/// How a backend finds its API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSpec {
    /// Human-readable name for errors and logs
    pub label: &'static str,
    pub config_key: &'static str,
    pub env_var: &'static str,
}

pub const ANTHROPIC_CREDENTIAL: CredentialSpec = CredentialSpec {
    label: "Anthropic API key",
    config_key: "api_key",
    env_var: "ANTHROPIC_API_KEY",
};

pub const OPENAI_CREDENTIAL: CredentialSpec = CredentialSpec {
    label: "OpenAI API key",
    config_key: "api_key",
    env_var: "OPENAI_API_KEY",
};

impl CredentialSpec {
    /// Resolve from `config`, then the environment. Blank values count as unset.
    pub fn resolve(&self, config: &JsonValue) -> Result<ApiCredential, ProviderError> {
        let from_config = config[self.config_key]
            .as_str()
            .filter(|v| !v.trim().is_empty())
            .map(|v| (v.to_string(), CredentialSource::Config));

        from_config
            .or_else(|| self.env_value().map(|v| (v, CredentialSource::Environment)))
            .map(|(value, source)| ApiCredential::new(value, source, self.label))
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "{} missing: set '{}' in config or the {} environment variable",
                    self.label, self.config_key, self.env_var
                ))
            })
    }

    /// Resolve from the environment only.
    pub fn resolve_env(&self) -> Result<ApiCredential, ProviderError> {
        self.resolve(&JsonValue::Null)
    }

    fn env_value(&self) -> Option<String> {
        std::env::var(self.env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// A resolved API key.
///
/// # Security
///
/// The value is only reachable through [`ApiCredential::expose`]; `Debug` and
/// `Display` print `[REDACTED]`.
///
/// # Example
///
/// ```ignore
/// let cred = ANTHROPIC_CREDENTIAL.resolve_env()?;
/// tracing::info!("Using {}", cred); // Anthropic API key (environment, [REDACTED])
/// let key = cred.expose();
/// ```
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    label: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, label: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            label,
        }
    }

    /// Raw key, for building the auth header only.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, [REDACTED])", self.label, self.source.as_str())
    }
}
