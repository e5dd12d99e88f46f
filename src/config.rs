use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub provider: ProviderConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Call-provider endpoints and credentials.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    pub api_base_url: String,
    pub ws_endpoint: String,
    pub api_key: String,
}

/// Response backend (the dashboard's persistence API).
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CANVASS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
