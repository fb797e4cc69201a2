use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use http_fetch::{FetchPolicy, HttpClient, RequestSpec, TransportError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Prefix for environment overrides, e.g. `HTTP_FETCH_REQUEST__URL`
pub const ENV_PREFIX: &str = "HTTP_FETCH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub url: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    pub request_body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub strict_status: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub proxy: Option<Url>,
    pub user_agent: Option<String>,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: Some(format!("http-fetch/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub request: Request,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub client: Client,
}

impl Settings {
    /// Load defaults, then `config_file` if given, then the process environment
    pub fn new(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load(config_file, None)
    }

    /// Same as [`Settings::new`], reading environment overrides from `env`
    /// instead of the process environment when it is `Some`
    fn load(
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // use defaults
            .add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = config_file {
            // override with file contents
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config = builder
            // override with environment
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        config.try_deserialize()
    }

    /// The request described by these settings, `None` if no URL is set
    pub fn request_spec(&self) -> Option<RequestSpec> {
        let url = self.request.url.as_ref()?;
        let mut spec = RequestSpec::new(url).headers(self.request.request_headers.clone());
        if let Some(method) = &self.request.method {
            spec = spec.method(method);
        }
        if let Some(body) = &self.request.request_body {
            spec = spec.body(body);
        }
        Some(spec)
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        let policy = FetchPolicy::new().strict_status(self.policy.strict_status);
        match self.policy.timeout_secs {
            Some(secs) => policy.timeout(Duration::from_secs(secs)),
            None => policy,
        }
    }

    pub fn http_client(&self) -> Result<HttpClient, TransportError> {
        let mut builder = HttpClient::builder();
        if let Some(proxy) = &self.client.proxy {
            builder = builder.proxy(proxy.clone());
        }
        if let Some(user_agent) = &self.client.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.build()
    }
}
