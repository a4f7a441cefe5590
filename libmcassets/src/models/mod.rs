use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod canonical;

custom_error! { pub ModelError
    MissingAsset { kind: AssetKind } = "No payload was provided for the {kind} asset",
    MalformedScript { reason: String } = "Generated assets script is malformed: {reason}",
    Json { source: serde_json::Error } = "Error while serializing or deserializing JSON: {source}",
}

/// One of the JSON documents merged into an [`AssetBundle`].
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum AssetKind {
    /// Block definitions, keyed by block id.
    Blockstates,
    /// Block and item models, keyed by model id.
    Models,
    /// Atlas UV rectangles, keyed by texture id.
    Textures,
}

impl AssetKind {
    /// All kinds, in the order they are fetched.
    pub const ALL: [AssetKind; 3] = [AssetKind::Blockstates, AssetKind::Models, AssetKind::Textures];

    /// Returns the key the asset is stored under in the merged object.
    pub fn key(&self) -> &'static str {
        match self {
            AssetKind::Blockstates => "blockstates",
            AssetKind::Models => "models",
            AssetKind::Textures => "textures",
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The merged asset document embedded in the generated script.
///
/// Payloads are kept as opaque JSON trees; nothing about their shape is
/// checked beyond them being valid JSON.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AssetBundle {
    pub blockstates: Value,
    pub models: Value,
    pub textures: Value,
}

impl AssetBundle {
    /// Serializes the bundle with sorted keys, no whitespace and ASCII-only
    /// string escapes.
    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        let value = serde_json::to_value(self)?;
        canonical::to_string(&value).map_err(Into::into)
    }

    /// Serializes the bundle with sorted keys and two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, ModelError> {
        let value = serde_json::to_value(self)?;
        canonical::to_string_pretty(&value).map_err(Into::into)
    }
}

/// Collects fetched payloads until every [`AssetKind`] is present.
#[derive(Debug, Default, Clone)]
pub struct AssetBundleBuilder {
    payloads: BTreeMap<AssetKind, Value>,
}

impl AssetBundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the payload for `kind`, replacing any earlier one.
    pub fn insert(&mut self, kind: AssetKind, payload: Value) -> &mut Self {
        self.payloads.insert(kind, payload);
        self
    }

    pub fn build(mut self) -> Result<AssetBundle, ModelError> {
        let mut take = |kind: AssetKind| {
            self.payloads
                .remove(&kind)
                .ok_or(ModelError::MissingAsset { kind })
        };

        Ok(AssetBundle {
            blockstates: take(AssetKind::Blockstates)?,
            models: take(AssetKind::Models)?,
            textures: take(AssetKind::Textures)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_bundle() -> AssetBundle {
        let mut builder = AssetBundleBuilder::new();
        builder
            .insert(
                AssetKind::Textures,
                json!({"block/stone": [0, 16, 16, 16], "block/dirt": [0, 0, 16, 16]}),
            )
            .insert(
                AssetKind::Blockstates,
                json!({"stone": {"variants": {"": {"model": "minecraft:block/stone"}}}}),
            )
            .insert(
                AssetKind::Models,
                json!({"block/stone": {"parent": "block/cube_all", "textures": {"all": "block/stone"}}}),
            );
        builder.build().unwrap()
    }

    #[test]
    fn test_asset_kind_keys() {
        let keys: Vec<&str> = AssetKind::ALL.iter().map(AssetKind::key).collect();
        assert_eq!(keys, vec!["blockstates", "models", "textures"]);
        assert_eq!(AssetKind::Textures.to_string(), "textures");
    }

    #[test]
    fn test_builder_requires_every_kind() {
        let mut builder = AssetBundleBuilder::new();
        builder
            .insert(AssetKind::Blockstates, json!({}))
            .insert(AssetKind::Textures, json!({}));
        match builder.build() {
            Err(ModelError::MissingAsset { kind }) => assert_eq!(kind, AssetKind::Models),
            other => panic!("expected missing models, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_json_is_sorted_and_compact() {
        let json = sample_bundle().to_canonical_json().unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"blockstates":{"stone":{"variants":{"":{"model":"minecraft:block/stone"}}}},"#,
                r#""models":{"block/stone":{"parent":"block/cube_all","textures":{"all":"block/stone"}}},"#,
                r#""textures":{"block/dirt":[0,0,16,16],"block/stone":[0,16,16,16]}}"#
            )
        );
    }

    #[test]
    fn test_canonical_json_round_trips() {
        let bundle = sample_bundle();
        let parsed: AssetBundle =
            serde_json::from_str(&bundle.to_canonical_json().unwrap()).unwrap();
        assert_eq!(parsed, bundle);
        assert_eq!(parsed.textures["block/dirt"][2], 16);
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let pretty = sample_bundle().to_pretty_json().unwrap();
        assert!(pretty.starts_with("{\n  \"blockstates\": {\n    \"stone\""));
        let parsed: AssetBundle = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, sample_bundle());
    }
}
