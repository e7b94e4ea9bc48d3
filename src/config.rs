use thiserror::Error;

/// Environment variable consulted when no URL argument is given.
pub const ENDPOINT_ENV_VAR: &str = "WEBHOOK_URL";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no webhook endpoint configured; pass a URL argument or set WEBHOOK_URL")]
    MissingEndpoint,
    #[error("webhook endpoint {0:?} is not an http(s) URL")]
    InvalidEndpoint(String),
}

/// Resolve the target endpoint: an explicit argument wins, then the
/// `WEBHOOK_URL` environment variable. An unset or blank endpoint is a
/// configuration error, not a URL to request.
pub fn resolve_endpoint(arg: Option<String>) -> Result<String, ConfigError> {
    resolve_endpoint_with(arg, std::env::var(ENDPOINT_ENV_VAR).ok())
}

/// [`resolve_endpoint`] with the environment lookup already performed, so the
/// precedence rules can be exercised without touching process state.
pub fn resolve_endpoint_with(
    arg: Option<String>,
    env: Option<String>,
) -> Result<String, ConfigError> {
    let url = arg
        .or(env)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingEndpoint)?;

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ConfigError::InvalidEndpoint(url))
    }
}
