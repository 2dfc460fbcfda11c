//! Read-only user profile lookup feeding the composite prompt.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

use crate::model::UserProfile;

#[async_trait]
pub trait ProfileStore: Send + Sync + Debug {
    /// Look up a profile by uid. `Ok(None)` when the user is unknown.
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>>;
}

/// Profiles loaded once from a JSON file keyed by uid:
/// `{ "uid-1": { "name": "...", "sensitive_factors": [...], "hobbies": [...] } }`
#[derive(Debug, Clone, Default)]
pub struct JsonProfileStore {
    profiles: HashMap<String, UserProfile>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile(HashMap<String, UserProfile>);

impl JsonProfileStore {
    /// Empty store; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;

        let ProfileFile(profiles) = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse profile file: {}", path.display()))?;

        Ok(Self { profiles })
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(uid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_profiles_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{
                "u1": {{
                    "name": "Dana",
                    "sensitive_factors": ["pollen"],
                    "hobbies": ["running"]
                }}
            }}"#
        )
        .expect("write profile JSON");

        let store = JsonProfileStore::from_path(file.path()).expect("load profiles");

        let profile = store.get("u1").await.expect("lookup").expect("present");
        assert_eq!(profile.name, "Dana");
        assert_eq!(profile.sensitive_factors, vec!["pollen"]);

        assert!(store.get("missing").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn optional_profile_fields_default_to_empty() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"u2": {{"name": "Sam"}}}}"#).expect("write profile JSON");

        let store = JsonProfileStore::from_path(file.path()).expect("load profiles");
        let profile = store.get("u2").await.expect("lookup").expect("present");
        assert!(profile.sensitive_factors.is_empty());
        assert!(profile.hobbies.is_empty());
    }

    #[tokio::test]
    async fn empty_store_always_misses() {
        let store = JsonProfileStore::empty();
        assert!(store.get("anyone").await.expect("lookup").is_none());
    }
}
