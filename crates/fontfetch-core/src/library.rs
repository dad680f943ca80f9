//! Library export/import: sharing an installed-font set across machines.
//!
//! Exports carry no hashes (the importing machine computes its own at
//! install time). Legacy exports also lack `owner`/`repo_name`; those are
//! inferred by splitting the repo key, and an entry whose key does not split
//! cleanly is rejected.

use crate::fetch::ReleaseSpec;
use crate::format::FormatLabel;
use crate::install::{InstallRequest, RepoSpec};
use crate::manifest::{self, InstalledManifest};
use crate::select::StyleFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One exported record: an installed record minus the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedRecord {
    #[serde(rename = "type")]
    pub format: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
}

pub type ExportedLibrary = BTreeMap<String, BTreeMap<String, ExportedRecord>>;

/// Strip the manifest down to its shareable form.
pub fn export_library(manifest: &InstalledManifest) -> ExportedLibrary {
    let mut exported = ExportedLibrary::new();
    for (key, fonts) in manifest.iter() {
        let repo = exported.entry(key.clone()).or_default();
        for (filename, record) in fonts {
            repo.insert(
                filename.clone(),
                ExportedRecord {
                    format: record.format.clone(),
                    version: record.version.clone(),
                    owner: (!record.owner.is_empty()).then(|| record.owner.clone()),
                    repo_name: (!record.repo_name.is_empty()).then(|| record.repo_name.clone()),
                },
            );
        }
    }
    exported
}

/// Turn an exported library into install requests, one per repo.
///
/// Each repo reinstalls at its exported version with its exported format as
/// the sole priority. Entries with unusable keys or format tokens are
/// reported and skipped; the rest proceed.
pub fn plan_import(exported: &ExportedLibrary, local: bool, force: bool) -> Vec<InstallRequest> {
    let mut requests = Vec::new();

    for (key, fonts) in exported {
        let Some(first) = fonts.values().next() else {
            continue;
        };

        let (owner, repo_name) = match (&first.owner, &first.repo_name) {
            (Some(owner), Some(repo_name)) => (owner.clone(), repo_name.clone()),
            _ => match manifest::parse_repo(key) {
                Ok(parsed) => parsed,
                Err(_) => {
                    log::warn!("invalid repo format in import: {key}");
                    continue;
                }
            },
        };

        let format = match first.format.parse::<FormatLabel>() {
            Ok(format) => format,
            Err(_) => {
                log::warn!("unknown format token in import for {key}: {}", first.format);
                continue;
            }
        };

        let mut request = InstallRequest {
            spec: RepoSpec::Github { owner, repo_name },
            repo_key: manifest::normalize_key(key),
            release: ReleaseSpec::from_arg(&first.version),
            priorities: vec![format],
            weights: Vec::new(),
            styles: StyleFilter::Both,
            local,
            force,
        };
        // versions recorded as commit dates cannot be requested as tags
        if !request.release.is_latest() && first.version.contains(':') {
            request.release = ReleaseSpec::Latest;
        }
        requests.push(request);
    }

    requests
}
