use crate::utils::json_context;
use custom_error::custom_error;

custom_error! {
    pub DownloadError
    Config { source: config::ConfigError } = "Error while reading download config from environment: {source}",
    Validation { source: serde_valid::validation::Errors } = "Invalid download config: {source}",
    Request { source: reqwest::Error } = "Request error: {source}",
    BadJson {
        url: String,
        ctx: String,
        source: serde_json::Error
    } = @{
        format!("Malformed JSON from {}: {}. Context at {}:{} (may be truncated) \" {} \"", url, source, source.line(), source.column(), ctx)
    },
}

impl DownloadError {
    pub fn from_json_err(err: serde_json::Error, url: &str, body: &str) -> Self {
        Self::BadJson {
            url: url.to_string(),
            ctx: json_context(&err, body, 40),
            source: err,
        }
    }
}
