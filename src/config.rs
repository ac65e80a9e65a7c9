use std::env;

use crate::error::{PrepError, PrepResult};
use crate::services::{MalformedPolicy, ModelVariant};

/// Runtime settings taken from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub datasource_host: Option<String>,
    pub malformed_policy: MalformedPolicy,
    pub model: ModelVariant,
}

impl Settings {
    pub fn from_env() -> PrepResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> PrepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let datasource_host = lookup("DATASOURCE_HOST")
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty());

        let malformed_policy = match lookup("MALFORMED_POLICY") {
            Some(raw) => raw.parse()?,
            None => MalformedPolicy::default(),
        };

        let model = match lookup("RATING_MODEL") {
            Some(raw) => raw.parse()?,
            None => ModelVariant::default(),
        };

        Ok(Self {
            datasource_host,
            malformed_policy,
            model,
        })
    }

    /// Host of the data source; required by every command that fetches.
    pub fn require_host(&self) -> PrepResult<&str> {
        self.datasource_host
            .as_deref()
            .ok_or_else(|| PrepError::Config("DATASOURCE_HOST not set".to_string()))
    }
}
