use std::env;

use crate::core::error::{ClientError, ClientResult};

pub const API_KEY_VAR: &str = "MODELRUN_API_KEY";
pub const BASE_URL_VAR: &str = "MODELRUN_BASE_URL";

/// Resolves one named setting from the process environment.
pub fn resolve(name: &str) -> ClientResult<String> {
    env::var(name).map_err(|_| ClientError::MissingConfig(name.to_string()))
}

/// The two settings the client needs: an API key and the service base URL.
/// Resolved before any client is constructed so a missing setting fails
/// fast, not mid-operation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
}

impl Settings {
    pub fn new(api_key: String, base_url: String) -> Self {
        // Request paths are appended directly, so the base must end in "/".
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        Self { api_key, base_url }
    }

    pub fn from_env() -> ClientResult<Self> {
        Ok(Self::new(resolve(API_KEY_VAR)?, resolve(BASE_URL_VAR)?))
    }
}
