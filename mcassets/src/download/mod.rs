pub mod errors;

use std::time::Duration;

use libmcassets::models::AssetKind;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use serde_valid::Validate;
use tracing::debug;

use crate::download::errors::DownloadError;

fn default_blockstates_url() -> String {
    "https://raw.githubusercontent.com/misode/mcmeta/summary/assets/block_definition/data.min.json"
        .to_string()
}

fn default_models_url() -> String {
    "https://raw.githubusercontent.com/misode/mcmeta/summary/assets/model/data.min.json".to_string()
}

fn default_textures_url() -> String {
    "https://raw.githubusercontent.com/misode/mcmeta/atlas/all/data.min.json".to_string()
}

fn default_atlas_url() -> String {
    "https://raw.githubusercontent.com/misode/mcmeta/atlas/all/atlas.png".to_string()
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct SourcesConfig {
    #[serde(default = "default_blockstates_url")]
    #[validate(pattern = r"^https?://")]
    pub blockstates_url: String,
    #[serde(default = "default_models_url")]
    #[validate(pattern = r"^https?://")]
    pub models_url: String,
    #[serde(default = "default_textures_url")]
    #[validate(pattern = r"^https?://")]
    pub textures_url: String,
    #[serde(default = "default_atlas_url")]
    #[validate(pattern = r"^https?://")]
    pub atlas_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            blockstates_url: default_blockstates_url(),
            models_url: default_models_url(),
            textures_url: default_textures_url(),
            atlas_url: default_atlas_url(),
        }
    }
}

impl SourcesConfig {
    pub fn from_config() -> Result<Self, DownloadError> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MCASSETS_SOURCE"))
            .build()?;

        let sources = config.try_deserialize::<'_, Self>()?;
        sources.validate()?;
        Ok(sources)
    }

    /// Returns the endpoint serving the JSON document for `kind`.
    pub fn url_for(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Blockstates => &self.blockstates_url,
            AssetKind::Models => &self.models_url,
            AssetKind::Textures => &self.textures_url,
        }
    }
}

pub fn build_client(user_agent: &str, timeout: Option<Duration>) -> Result<Client, DownloadError> {
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(Into::into)
}

pub async fn fetch_json(client: &Client, url: &str) -> Result<Value, DownloadError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!("Fetched {} bytes of JSON from {}", body.len(), url);

    serde_json::from_str(&body).map_err(|err| DownloadError::from_json_err(err, url, &body))
}

pub async fn fetch_binary(client: &Client, url: &str) -> Result<Vec<u8>, DownloadError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::isolated_env;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client() -> Client {
        build_client("mcassets-test", Some(Duration::from_secs(10))).unwrap()
    }

    #[test]
    fn test_default_sources_are_valid() {
        let sources = SourcesConfig::default();
        assert!(sources.validate().is_ok());
        assert!(sources
            .url_for(AssetKind::Models)
            .ends_with("/assets/model/data.min.json"));
    }

    #[test]
    fn test_non_http_sources_are_rejected() {
        let sources = SourcesConfig {
            atlas_url: "file:///tmp/atlas.png".to_string(),
            ..SourcesConfig::default()
        };
        assert!(sources.validate().is_err());
    }

    #[test]
    fn test_sources_from_environment() {
        let _env = isolated_env();
        std::env::set_var("MCASSETS_SOURCE_MODELS_URL", "http://mirror.local/model.json");

        let sources = SourcesConfig::from_config().unwrap();

        assert_eq!(sources.models_url, "http://mirror.local/model.json");
        assert_eq!(sources.blockstates_url, default_blockstates_url());
        assert_eq!(sources.atlas_url, default_atlas_url());
    }

    #[test]
    fn test_non_http_source_from_environment_is_rejected() {
        let _env = isolated_env();
        std::env::set_var("MCASSETS_SOURCE_ATLAS_URL", "ftp://mirror.local/atlas.png");

        let result = SourcesConfig::from_config();

        assert!(matches!(result, Err(DownloadError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_request_timeout_is_enforced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow.json");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({}));
            })
            .await;

        let client = build_client("mcassets-test", Some(Duration::from_millis(500))).unwrap();
        let err = fetch_json(&client, &server.url("/slow.json"))
            .await
            .unwrap_err();

        match err {
            DownloadError::Request { source } => assert!(source.is_timeout(), "{}", source),
            other => panic!("expected a timeout, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/model/data.min.json")
                    .header("user-agent", "mcassets-test");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({"block/stone": {"parent": "block/cube_all"}}));
            })
            .await;

        let value = fetch_json(&client(), &server.url("/model/data.min.json"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(value["block/stone"]["parent"], "block/cube_all");
    }

    #[tokio::test]
    async fn test_fetch_json_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.json");
                then.status(404).body("Not Found");
            })
            .await;

        let err = fetch_json(&client(), &server.url("/missing.json"))
            .await
            .unwrap_err();

        match err {
            DownloadError::Request { source } => {
                assert_eq!(source.status(), Some(reqwest::StatusCode::NOT_FOUND))
            }
            other => panic!("expected a request error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken.json");
                then.status(200).body(r#"{"stone":[0,0,16,16],"dirt":[0,16,,16]}"#);
            })
            .await;

        let url = server.url("/broken.json");
        let err = fetch_json(&client(), &url).await.unwrap_err();

        match &err {
            DownloadError::BadJson { url: bad_url, ctx, .. } => {
                assert_eq!(bad_url, &url);
                assert!(ctx.contains(",,"), "{}", ctx);
            }
            other => panic!("expected malformed JSON, got {}", other),
        }
        assert!(err.to_string().contains("may be truncated"));
    }

    #[tokio::test]
    async fn test_fetch_binary_is_verbatim() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/atlas.png");
                then.status(200)
                    .header("Content-Type", "image/png")
                    .body(payload.clone());
            })
            .await;

        let bytes = fetch_binary(&client(), &server.url("/atlas.png"))
            .await
            .unwrap();
        assert_eq!(bytes, payload);
    }
}
