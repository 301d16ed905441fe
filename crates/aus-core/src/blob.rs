use std::cmp::Ordering;
use std::collections::BTreeMap;

use aus_backend::{Payload, ProductVersion, UpdateQuery, compare_build_ids};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const APP_SCHEMA_VERSION: u64 = 1;
pub const PLUGIN_SCHEMA_VERSION: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("blob has no schema_version")]
    MissingSchema,
    #[error("unknown blob schema_version {0}")]
    UnknownSchema(u64),
    #[error("invalid schema {schema} blob: {details}")]
    Invalid { schema: u64, details: String },
}

/// Application release: one build of the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBlob {
    pub name: String,
    pub app_version: String,
    pub build_id: String,
    #[serde(default)]
    pub display_version: Option<String>,
    #[serde(default)]
    pub update_url: Option<String>,
}

impl Payload for AppBlob {
    fn name(&self) -> &str {
        &self.name
    }

    /// Serve only when the release is ahead of the client: a newer version,
    /// or the same version with a strictly newer build.
    fn should_serve_update(&self, query: &UpdateQuery) -> bool {
        let release_version = match self.app_version.parse::<ProductVersion>() {
            Ok(version) => version,
            Err(error) => {
                log::warn!("Release {} has unusable app_version: {error}", self.name);
                return false;
            }
        };
        let client_version = match query.version.parse::<ProductVersion>() {
            Ok(version) => version,
            Err(error) => {
                log::debug!("Client version for {} is unusable: {error}", self.name);
                return false;
            }
        };

        match release_version.cmp(&client_version) {
            Ordering::Less => {
                log::debug!(
                    "Release {} ({release_version}) is older than client version {client_version}",
                    self.name
                );
                false
            }
            Ordering::Equal => {
                let newer_build =
                    compare_build_ids(&self.build_id, &query.build_id) == Ordering::Greater;
                if !newer_build {
                    log::debug!(
                        "Release {} has the client's version and build {} is not newer than {}",
                        self.name,
                        self.build_id,
                        query.build_id
                    );
                }
                newer_build
            }
            Ordering::Greater => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginVendor {
    pub version: String,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Plugin bundle (codecs and the like). Vendors track their own versions,
/// so the bundle is always offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginBlob {
    pub name: String,
    #[serde(default)]
    pub vendors: BTreeMap<String, PluginVendor>,
}

impl Payload for PluginBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_serve_update(&self, _query: &UpdateQuery) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Blob {
    App(AppBlob),
    Plugin(PluginBlob),
}

impl Blob {
    #[must_use]
    pub fn schema_version(&self) -> u64 {
        match self {
            Self::App(_) => APP_SCHEMA_VERSION,
            Self::Plugin(_) => PLUGIN_SCHEMA_VERSION,
        }
    }

    /// Download links carried by the payload.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Self::App(blob) => blob.update_url.as_deref().into_iter().collect(),
            Self::Plugin(blob) => blob
                .vendors
                .values()
                .filter_map(|vendor| vendor.file_url.as_deref())
                .collect(),
        }
    }
}

impl Payload for Blob {
    fn name(&self) -> &str {
        match self {
            Self::App(blob) => blob.name(),
            Self::Plugin(blob) => blob.name(),
        }
    }

    fn should_serve_update(&self, query: &UpdateQuery) -> bool {
        match self {
            Self::App(blob) => blob.should_serve_update(query),
            Self::Plugin(blob) => blob.should_serve_update(query),
        }
    }
}

/// Wrap a stored release document in the payload type its
/// `schema_version` names.
///
/// # Errors
/// Returns an error when the document has no schema version, names an
/// unknown schema, or does not match the schema's shape.
pub fn create_blob(document: &Value) -> Result<Blob, BlobError> {
    let schema = document
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or(BlobError::MissingSchema)?;

    let invalid = |error: serde_json::Error| BlobError::Invalid {
        schema,
        details: error.to_string(),
    };

    match schema {
        APP_SCHEMA_VERSION => AppBlob::deserialize(document)
            .map(Blob::App)
            .map_err(invalid),
        PLUGIN_SCHEMA_VERSION => PluginBlob::deserialize(document)
            .map(Blob::Plugin)
            .map_err(invalid),
        other => Err(BlobError::UnknownSchema(other)),
    }
}

#[cfg(test)]
mod tests {
    use aus_backend::{Payload, UpdateQuery};
    use serde_json::json;

    use super::{Blob, BlobError, create_blob};

    fn app_blob(version: &str, build_id: &str) -> Blob {
        create_blob(&json!({
            "schema_version": 1,
            "name": "Firefox-60.0-build1",
            "app_version": version,
            "build_id": build_id,
            "update_url": "https://download.example.com/firefox-60.0.mar"
        }))
        .expect("app blob should parse")
    }

    fn client(version: &str, build_id: &str) -> UpdateQuery {
        UpdateQuery::new("Firefox", "release")
            .with_version(version)
            .with_build_id(build_id)
    }

    #[test]
    fn newer_version_is_served() {
        let blob = app_blob("60.0", "20180501000000");
        assert!(blob.should_serve_update(&client("59.0.3", "20180601000000")));
    }

    #[test]
    fn older_version_is_not_served() {
        let blob = app_blob("59.0", "20180501000000");
        assert!(!blob.should_serve_update(&client("60.0", "20180101000000")));
    }

    #[test]
    fn same_version_requires_newer_build() {
        let blob = app_blob("60.0", "20180501000000");

        assert!(blob.should_serve_update(&client("60.0", "20180401000000")));
        assert!(!blob.should_serve_update(&client("60.0", "20180501000000")));
        assert!(!blob.should_serve_update(&client("60.0", "20180601000000")));
    }

    #[test]
    fn beta_client_is_offered_final_release() {
        let blob = app_blob("60.0", "20180501000000");
        assert!(blob.should_serve_update(&client("60.0b16", "20180601000000")));
    }

    #[test]
    fn unparseable_versions_are_not_served() {
        assert!(!app_blob("garbage", "1").should_serve_update(&client("59.0", "1")));
        assert!(!app_blob("60.0", "1").should_serve_update(&client("", "1")));
    }

    #[test]
    fn plugin_blob_is_always_served() {
        let blob = create_blob(&json!({
            "schema_version": 1000,
            "name": "GMP-20180501",
            "vendors": {
                "gmp-widevine": {
                    "version": "1.4.9.1088",
                    "file_url": "https://cdn.example.com/widevine.zip"
                },
                "gmp-openh264": { "version": "1.7.1" }
            }
        }))
        .expect("plugin blob should parse");

        assert_eq!(blob.schema_version(), 1000);
        assert_eq!(blob.name(), "GMP-20180501");
        assert!(blob.should_serve_update(&client("1.0", "1")));
        assert_eq!(blob.urls(), vec!["https://cdn.example.com/widevine.zip"]);
    }

    #[test]
    fn app_blob_exposes_update_url() {
        let blob = app_blob("60.0", "1");
        assert_eq!(
            blob.urls(),
            vec!["https://download.example.com/firefox-60.0.mar"]
        );
    }

    #[test]
    fn create_blob_rejects_unknown_or_malformed_documents() {
        assert_eq!(
            create_blob(&json!({ "name": "x" })),
            Err(BlobError::MissingSchema)
        );
        assert_eq!(
            create_blob(&json!({ "schema_version": 4000, "name": "x" })),
            Err(BlobError::UnknownSchema(4000))
        );
        assert!(matches!(
            create_blob(&json!({ "schema_version": 1, "name": "x" })),
            Err(BlobError::Invalid { schema: 1, .. })
        ));
    }
}
