use libmcassets::models::{AssetBundle, AssetBundleBuilder, AssetKind};
use libmcassets::script::render_assets_script;
use reqwest::Client;
use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::download::{self, SourcesConfig};
use crate::errors::AssetsError;
use crate::storage::{self, FileStatus, WrittenFile};

/// Everything downloaded in one run, held in memory until all requests succeed.
pub struct FetchedAssets {
    pub bundle: AssetBundle,
    pub atlas: Vec<u8>,
}

/// The exact bytes each output file should contain.
pub struct RenderedOutputs {
    pub assets_script: String,
    pub atlas: Vec<u8>,
    pub debug_json: Option<String>,
}

#[derive(Debug)]
pub struct UpdateReport {
    pub assets: WrittenFile,
    pub atlas: WrittenFile,
    pub debug: Option<WrittenFile>,
}

impl UpdateReport {
    pub fn changed(&self) -> bool {
        self.assets.status != FileStatus::Unchanged || self.atlas.status != FileStatus::Unchanged
    }
}

pub async fn fetch_assets(
    client: &Client,
    sources: &SourcesConfig,
) -> Result<FetchedAssets, AssetsError> {
    let mut builder = AssetBundleBuilder::new();
    for kind in AssetKind::ALL {
        info!("Processing: {}", kind);
        let payload = download::fetch_json(client, sources.url_for(kind)).await?;
        builder.insert(kind, payload);
    }

    info!("Processing: atlas");
    let atlas = download::fetch_binary(client, &sources.atlas_url).await?;

    Ok(FetchedAssets {
        bundle: builder.build()?,
        atlas,
    })
}

pub fn render_outputs(
    fetched: FetchedAssets,
    with_debug: bool,
) -> Result<RenderedOutputs, AssetsError> {
    let assets_script = render_assets_script(&fetched.bundle)?;
    let debug_json = if with_debug {
        Some(fetched.bundle.to_pretty_json()?)
    } else {
        None
    };

    Ok(RenderedOutputs {
        assets_script,
        atlas: fetched.atlas,
        debug_json,
    })
}

async fn fetch_and_render(
    config: &AppConfig,
    sources: &SourcesConfig,
) -> Result<RenderedOutputs, AssetsError> {
    let client = download::build_client(&config.user_agent, config.request_timeout())?;
    let fetched = fetch_assets(&client, sources).await?;
    render_outputs(fetched, config.debug_path().is_some())
}

/// Downloads every asset and replaces the output files. Nothing is written
/// unless all four downloads succeed.
pub async fn update_assets(
    config: &AppConfig,
    sources: &SourcesConfig,
) -> Result<UpdateReport, AssetsError> {
    let assets_path = config.assets_path();
    let atlas_path = config.atlas_path();
    let debug_path = config.debug_path();
    for path in [Some(&assets_path), Some(&atlas_path), debug_path.as_ref()]
        .into_iter()
        .flatten()
    {
        storage::ensure_parent_dir(path)?;
    }

    let outputs = fetch_and_render(config, sources).await?;

    let assets = storage::store(&assets_path, outputs.assets_script.as_bytes())?;
    let atlas = storage::store(&atlas_path, &outputs.atlas)?;
    let debug = match (debug_path, &outputs.debug_json) {
        (Some(path), Some(json)) => Some(storage::store(&path, json.as_bytes())?),
        _ => None,
    };

    Ok(UpdateReport {
        assets,
        atlas,
        debug,
    })
}

/// Downloads every asset and fails with [`AssetsError::Stale`] if either
/// output file on disk differs from what [`update_assets`] would write.
pub async fn check_assets(config: &AppConfig, sources: &SourcesConfig) -> Result<(), AssetsError> {
    let outputs = fetch_and_render(config, sources).await?;

    let expected = [
        (config.assets_path(), outputs.assets_script.as_bytes()),
        (config.atlas_path(), outputs.atlas.as_slice()),
    ];
    for (path, contents) in expected {
        let current = storage::read_existing(&path)?;
        if current.as_deref() != Some(contents) {
            warn!("{} is out of date", path.display());
            return Err(AssetsError::Stale {
                path: path.display().to_string(),
            });
        }
        info!("{} is up to date", path.display());
    }
    Ok(())
}
