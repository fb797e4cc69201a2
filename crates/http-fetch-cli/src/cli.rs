use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use url::Url;

use crate::config::Settings;

/// Fetch a single HTTP resource and print it as JSON
#[derive(Debug, Parser)]
#[command(name = "http-fetch", author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// URL to fetch
    #[arg(short, long)]
    pub url: Option<String>,
    /// Request method (GET, POST, PUT, PATCH or DELETE)
    #[arg(short = 'X', long)]
    pub method: Option<String>,
    /// Request header as NAME:VALUE, may be repeated
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Request body
    #[arg(short, long)]
    pub body: Option<String>,
    /// Fail on non-2xx status codes
    #[arg(long)]
    pub strict_status: bool,
    /// Timeout in seconds for the whole fetch
    #[arg(short, long)]
    pub timeout: Option<u64>,
    /// Proxy for all requests
    #[arg(short, long)]
    pub proxy: Option<Url>,
    /// Use the <file name> as the location of the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: Level,
}

impl Cli {
    /// Apply command line flags on top of loaded settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.url {
            settings.request.url = Some(url.clone());
        }
        if let Some(method) = &self.method {
            settings.request.method = Some(method.clone());
        }
        for (name, value) in &self.headers {
            settings
                .request
                .request_headers
                .insert(name.clone(), value.clone());
        }
        if let Some(body) = &self.body {
            settings.request.request_body = Some(body.clone());
        }
        if self.strict_status {
            settings.policy.strict_status = true;
        }
        if let Some(timeout) = self.timeout {
            settings.policy.timeout_secs = Some(timeout);
        }
        if let Some(proxy) = &self.proxy {
            settings.client.proxy = Some(proxy.clone());
        }
    }
}

fn parse_header(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {input:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {input:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
