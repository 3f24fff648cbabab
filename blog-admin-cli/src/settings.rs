use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use blog_admin::HttpTimeouts;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub log_level: String,
    pub http_request_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("BLOG_API_URL")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());
        let http_request_timeout_secs = parse_u64(&lookup, "HTTP_REQUEST_TIMEOUT_SECS", 15)?;
        let http_connect_timeout_secs = parse_u64(&lookup, "HTTP_CONNECT_TIMEOUT_SECS", 5)?;

        Ok(Self {
            api_url,
            log_level,
            http_request_timeout_secs,
            http_connect_timeout_secs,
        })
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.http_connect_timeout_secs),
            request: Duration::from_secs(self.http_request_timeout_secs),
        }
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = settings(&[]).expect("defaults");
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.timeouts().request, Duration::from_secs(15));
        assert_eq!(settings.timeouts().connect, Duration::from_secs(5));
    }

    #[test]
    fn reads_overrides() {
        let settings = settings(&[
            ("BLOG_API_URL", "https://blog.example.com/api"),
            ("HTTP_REQUEST_TIMEOUT_SECS", "30"),
            ("RUST_LOG", "debug"),
        ])
        .expect("settings");
        assert_eq!(settings.api_url, "https://blog.example.com/api");
        assert_eq!(settings.http_request_timeout_secs, 30);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = settings(&[("HTTP_CONNECT_TIMEOUT_SECS", "0")]).expect_err("zero");
        assert!(err.to_string().contains("HTTP_CONNECT_TIMEOUT_SECS"));
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        assert!(settings(&[("HTTP_REQUEST_TIMEOUT_SECS", "soon")]).is_err());
    }
}
