//! Logging configuration
//!
//! The Functions host collects a custom handler's stdout line by line and
//! sets `FUNCTIONS_CUSTOMHANDLER_PORT`. Under the host the default is one
//! JSON object per line without ANSI escapes; a local run (`replay`) gets
//! compact text instead.

/// Default filter when `RUST_LOG` is unset; HTTP internals stay quiet.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn,h2=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" | "plain" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_filter: String,
    pub format: LogFormat,
    pub ansi: bool,
    /// Function app name when running under the host
    pub app_name: Option<String>,
}

impl TelemetryConfig {
    pub fn from_env(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let hosted = value("FUNCTIONS_CUSTOMHANDLER_PORT").is_some();
        let format = value("ADMS_LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or(if hosted { LogFormat::Json } else { LogFormat::Compact });

        Self {
            service_name: value("SERVICE_NAME").unwrap_or_else(|| service_name.to_string()),
            log_filter: value("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            format,
            ansi: !hosted && format == LogFormat::Compact,
            app_name: value("WEBSITE_SITE_NAME"),
        }
    }
}
