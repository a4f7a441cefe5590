use crate::download::errors::DownloadError;
use crate::storage::StorageError;
use custom_error::custom_error;
use libmcassets::models::ModelError;

custom_error! {
    pub AssetsError
    Download { source: DownloadError } = "Error while downloading assets: {source}",
    Config { source: config::ConfigError } = "Error while reading config from environment: {source}",
    Validation { source: serde_valid::validation::Errors } = "Invalid configuration: {source}",
    Storage { source: StorageError } = "Error while writing assets: {source}",
    Model { source: ModelError } = "Error while building assets: {source}",
    Stale { path: String } = "{path} is missing or out of date",
}
