//! The installed-fonts manifest: repo key → filename → record.
//!
//! Repo keys are case-insensitive and normalized to lowercase before any
//! lookup or mutation. Keys iterate in sorted order, which is what "first
//! encountered" means everywhere a tie needs breaking. Saves go through a
//! temp-file-then-rename so a crash never leaves a half-written manifest.
//!
//! Older manifests nested a `filename` field inside each record and omitted
//! `owner`/`repo_name`; both shapes are accepted on read through a shim and
//! only the canonical shape is ever written.

use crate::{FetchResult, FontfetchError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One installed font's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledRecord {
    /// Hex SHA-256 of the file's bytes at install time
    pub hash: String,
    /// Format token; kept as a string so unknown tokens survive round-trips
    #[serde(rename = "type")]
    pub format: String,
    /// Release tag or ISO-8601 commit date
    pub version: String,
    /// Upstream owner; `google-fonts` for Google Fonts subdirectory installs
    pub owner: String,
    /// Upstream repo name, which may differ from the manifest key
    pub repo_name: String,
}

/// On-disk record shape, including the legacy variants.
#[derive(Debug, Deserialize)]
struct RawRecord {
    hash: String,
    #[serde(rename = "type")]
    format: String,
    version: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    repo_name: Option<String>,
    /// Legacy duplicate of the outer key; accepted and dropped
    #[serde(default, rename = "filename")]
    _filename: Option<String>,
}

impl RawRecord {
    fn into_record(self, repo_key: &str) -> InstalledRecord {
        // Legacy records carry no owner/repo_name; infer them from an
        // owner/name-shaped key, otherwise leave them empty and let the
        // repair pass deal with the entry.
        let (owner, repo_name) = match (self.owner, self.repo_name) {
            (Some(owner), Some(repo_name)) => (owner, repo_name),
            (owner, repo_name) => match parse_repo(repo_key) {
                Ok((key_owner, key_name)) => {
                    (owner.unwrap_or(key_owner), repo_name.unwrap_or(key_name))
                }
                Err(_) => (
                    owner.unwrap_or_default(),
                    repo_name.unwrap_or_else(|| repo_key.to_string()),
                ),
            },
        };
        InstalledRecord {
            hash: self.hash,
            format: self.format,
            version: self.version,
            owner,
            repo_name,
        }
    }
}

/// Filename → record mapping for one repo key.
pub type RepoFonts = BTreeMap<String, InstalledRecord>;

/// The persisted manifest of everything fontfetch has installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InstalledManifest {
    repos: BTreeMap<String, RepoFonts>,
}

/// Lowercase a repo key for case-insensitive matching.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Split an `owner/repo` argument into its two parts.
pub fn parse_repo(arg: &str) -> FetchResult<(String, String)> {
    let mut parts = arg.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(FontfetchError::InvalidRepo(arg.to_string())),
    }
}

/// Hex SHA-256 over a file's bytes, streaming.
pub fn sha256_file(path: &Path) -> FetchResult<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

impl InstalledManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest, accepting the legacy record shape. A missing file
    /// is an empty manifest; an unreadable one is reported and treated as
    /// empty, matching the tool's recoverable-read / fatal-write split.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let raw: BTreeMap<String, BTreeMap<String, RawRecord>> = match fs::read_to_string(path)
            .map_err(FontfetchError::from)
            .and_then(|content| Ok(serde_json::from_str(&content)?))
        {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("could not load installed data from {}: {e}", path.display());
                return Self::default();
            }
        };

        let mut manifest = Self::default();
        for (key, fonts) in raw {
            let key = normalize_key(&key);
            let repo = manifest.repos.entry(key.clone()).or_default();
            for (filename, record) in fonts {
                repo.insert(filename, record.into_record(&key));
            }
        }
        manifest
    }

    /// Save the manifest atomically. Failures here are fatal to the calling
    /// operation: losing track of already-moved files is worse than aborting.
    pub fn save(&self, path: &Path) -> FetchResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.repos.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RepoFonts)> {
        self.repos.iter()
    }

    pub fn get(&self, key: &str) -> Option<&RepoFonts> {
        self.repos.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.repos.contains_key(&normalize_key(key))
    }

    /// Insert a record, creating the repo entry as needed.
    pub fn insert(&mut self, key: &str, filename: &str, record: InstalledRecord) {
        self.repos
            .entry(normalize_key(key))
            .or_default()
            .insert(filename.to_string(), record);
    }

    /// Remove a whole repo entry, returning its records.
    pub fn remove(&mut self, key: &str) -> Option<RepoFonts> {
        self.repos.remove(&normalize_key(key))
    }

    /// Replace a repo's records wholesale; an empty set drops the repo.
    pub fn replace(&mut self, key: &str, fonts: RepoFonts) {
        let key = normalize_key(key);
        if fonts.is_empty() {
            self.repos.remove(&key);
        } else {
            self.repos.insert(key, fonts);
        }
    }

    /// Remove a single record; the repo entry is dropped once empty.
    pub fn remove_entry(&mut self, key: &str, filename: &str) -> bool {
        let key = normalize_key(key);
        let Some(fonts) = self.repos.get_mut(&key) else {
            return false;
        };
        if fonts.remove(filename).is_none() {
            return false;
        }
        if fonts.is_empty() {
            self.repos.remove(&key);
            log::info!("removed empty repo {key}");
        }
        true
    }

    /// Re-baseline a record's hash in place.
    pub fn update_hash(&mut self, key: &str, filename: &str, new_hash: &str) -> bool {
        let Some(record) = self
            .repos
            .get_mut(&normalize_key(key))
            .and_then(|fonts| fonts.get_mut(filename))
        else {
            return false;
        };
        record.hash = new_hash.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: &str) -> InstalledRecord {
        InstalledRecord {
            hash: "abc123".to_string(),
            format: "static-ttf".to_string(),
            version: version.to_string(),
            owner: "rsms".to_string(),
            repo_name: "inter".to_string(),
        }
    }

    #[test]
    fn parses_repo_arguments() {
        assert_eq!(
            parse_repo("rsms/inter").unwrap(),
            ("rsms".to_string(), "inter".to_string())
        );
        assert!(parse_repo("no-slash").is_err());
        assert!(parse_repo("a/b/c").is_err());
        assert!(parse_repo("/name").is_err());
        assert!(parse_repo("owner/").is_err());
    }

    #[test]
    fn keys_are_case_normalized() {
        let mut manifest = InstalledManifest::new();
        manifest.insert("RSMS/Inter", "Inter.ttf", record("v4.0"));
        assert!(manifest.contains("rsms/inter"));
        assert!(manifest.get("Rsms/Inter").is_some());
        assert!(manifest.remove_entry("RSMS/INTER", "Inter.ttf"));
        assert!(manifest.is_empty());
    }

    #[test]
    fn removing_last_entry_drops_the_repo() {
        let mut manifest = InstalledManifest::new();
        manifest.insert("rsms/inter", "a.ttf", record("v4.0"));
        manifest.insert("rsms/inter", "b.ttf", record("v4.0"));
        assert!(manifest.remove_entry("rsms/inter", "a.ttf"));
        assert!(manifest.contains("rsms/inter"));
        assert!(manifest.remove_entry("rsms/inter", "b.ttf"));
        assert!(!manifest.contains("rsms/inter"));
        assert!(!manifest.remove_entry("rsms/inter", "b.ttf"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        let mut manifest = InstalledManifest::new();
        manifest.insert("rsms/inter", "Inter.ttf", record("v4.0"));
        manifest.save(&path).unwrap();

        let loaded = InstalledManifest::load(&path);
        assert_eq!(loaded, manifest);
        // canonical shape: no nested filename field
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("\"filename\""));
    }

    #[test]
    fn accepts_legacy_record_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        std::fs::write(
            &path,
            r#"{
              "RSMS/Inter": {
                "Inter-Regular.ttf": {
                  "filename": "Inter-Regular.ttf",
                  "hash": "deadbeef",
                  "type": "static-ttf",
                  "version": "v4.0"
                }
              }
            }"#,
        )
        .unwrap();

        let manifest = InstalledManifest::load(&path);
        let fonts = manifest.get("rsms/inter").unwrap();
        let record = &fonts["Inter-Regular.ttf"];
        // owner/repo_name inferred from the key, filename dropped
        assert_eq!(record.owner, "rsms");
        assert_eq!(record.repo_name, "inter");
        assert_eq!(record.hash, "deadbeef");
    }

    #[test]
    fn legacy_alias_key_keeps_empty_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        std::fs::write(
            &path,
            r#"{"roboto": {"Roboto.ttf": {"hash": "x", "type": "static-ttf", "version": "1"}}}"#,
        )
        .unwrap();

        let manifest = InstalledManifest::load(&path);
        let record = &manifest.get("roboto").unwrap()["Roboto.ttf"];
        assert_eq!(record.owner, "");
        assert_eq!(record.repo_name, "roboto");
    }

    #[test]
    fn unreadable_manifest_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(InstalledManifest::load(&path).is_empty());
    }

    #[test]
    fn hashes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
