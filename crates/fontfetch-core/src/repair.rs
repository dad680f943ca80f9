//! The repair pass: detect manifest corruption and propose fixups.
//!
//! Detection runs in a fixed order, each check excluding items already
//! flagged by an earlier one so nothing is double-processed: invalid repo
//! keys, type/extension mismatches, cross-repo duplicate filenames, then
//! per-file integrity for the survivors. Every fixup carries a human-readable
//! description and is independently applicable; the driver never silently
//! skips a detected issue.

use crate::format::FormatLabel;
use crate::inspect;
use crate::manifest::{self, InstalledManifest};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One proposed corrective action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixup {
    /// Drop a repo whose key is not `owner/name`-shaped
    RemoveRepo { key: String },
    /// Drop a record whose type token contradicts its filename extension
    RemoveEntry { key: String, filename: String },
    /// Drop a filename recorded under more than one repo (first key wins)
    RemoveDuplicate { key: String, filename: String },
    /// Re-baseline the recorded hash of a locally-modified but valid font
    UpdateHash {
        key: String,
        filename: String,
        hash: String,
    },
    /// Re-run the install pipeline for a repo with on-disk damage
    Reinstall { key: String, reason: String },
}

impl Fixup {
    pub fn description(&self) -> String {
        match self {
            Fixup::RemoveRepo { key } => format!("Remove invalid repo: {key}"),
            Fixup::RemoveEntry { key, filename } => {
                format!("Remove invalid entry: {key}/{filename} (type/extension mismatch)")
            }
            Fixup::RemoveDuplicate { key, filename } => {
                format!("Remove duplicate {filename} from {key}")
            }
            Fixup::UpdateHash { key, filename, .. } => {
                format!("Update hash for modified file: {key}/{filename}")
            }
            Fixup::Reinstall { key, reason } => format!("Reinstall repo ({reason}): {key}"),
        }
    }

    /// Past-tense rendering for post-apply reporting.
    pub fn done_description(&self) -> String {
        self.description()
            .replacen("Remove", "Removed", 1)
            .replacen("Update", "Updated", 1)
            .replacen("Reinstall", "Reinstalled", 1)
    }

    pub fn is_reinstall(&self) -> bool {
        matches!(self, Fixup::Reinstall { .. })
    }
}

/// Detect every issue in the manifest against the font directory.
pub fn plan_fixups(manifest: &InstalledManifest, font_dir: &Path) -> Vec<Fixup> {
    let mut fixups = Vec::new();

    // 1. invalid repo keys: keys containing a slash must be owner/name-shaped;
    //    bare keys are Google Fonts aliases and valid as-is
    let mut invalid_repos: BTreeSet<String> = BTreeSet::new();
    for (key, _) in manifest.iter() {
        if key.contains('/') && manifest::parse_repo(key).is_err() {
            invalid_repos.insert(key.clone());
            fixups.push(Fixup::RemoveRepo { key: key.clone() });
        }
    }

    // 2. type/extension mismatches; unknown type tokens are tolerated
    let mut invalid_entries: BTreeSet<(String, String)> = BTreeSet::new();
    for (key, fonts) in manifest.iter() {
        if invalid_repos.contains(key) {
            continue;
        }
        for (filename, entry) in fonts {
            if let Some(expected_ext) = FormatLabel::expected_extension(&entry.format) {
                if !filename.to_lowercase().ends_with(expected_ext) {
                    invalid_entries.insert((key.clone(), filename.clone()));
                    fixups.push(Fixup::RemoveEntry {
                        key: key.clone(),
                        filename: filename.clone(),
                    });
                }
            }
        }
    }

    // 3. the same filename under several repos: keep the first key in
    //    iteration order, remove the rest
    let mut filename_to_repos: BTreeMap<&String, Vec<&String>> = BTreeMap::new();
    for (key, fonts) in manifest.iter() {
        if invalid_repos.contains(key) {
            continue;
        }
        for filename in fonts.keys() {
            if !invalid_entries.contains(&(key.clone(), filename.clone())) {
                filename_to_repos.entry(filename).or_default().push(key);
            }
        }
    }
    let mut duplicate_entries: BTreeSet<(String, String)> = BTreeSet::new();
    for (filename, repos) in &filename_to_repos {
        for key in repos.iter().skip(1) {
            duplicate_entries.insert(((*key).clone(), (*filename).clone()));
            fixups.push(Fixup::RemoveDuplicate {
                key: (*key).clone(),
                filename: (*filename).clone(),
            });
        }
    }

    // 4. per-file integrity for entries surviving all prior checks; one
    //    reinstall action per repo, the last detected reason winning
    let mut repos_to_reinstall: BTreeMap<String, String> = BTreeMap::new();
    for (key, fonts) in manifest.iter() {
        if invalid_repos.contains(key) {
            continue;
        }
        let surviving = |filename: &str| {
            let entry_id = (key.clone(), filename.to_string());
            !invalid_entries.contains(&entry_id) && !duplicate_entries.contains(&entry_id)
        };
        for (filename, entry) in fonts {
            if !surviving(filename) {
                continue;
            }
            let path = font_dir.join(filename);
            if !path.exists() {
                repos_to_reinstall.insert(key.clone(), "missing file(s)".to_string());
                continue;
            }
            match inspect::is_variable_font(&path) {
                Err(_) => {
                    repos_to_reinstall.insert(key.clone(), "invalid font file(s)".to_string());
                    continue;
                }
                Ok(is_variable) => {
                    let expected_variable = entry.format.starts_with("variable-");
                    if expected_variable != is_variable {
                        repos_to_reinstall
                            .insert(key.clone(), "variable/static mismatch".to_string());
                        continue;
                    }
                }
            }
            match manifest::sha256_file(&path) {
                Ok(current_hash) if current_hash != entry.hash => {
                    // the file is valid and the right shape; a content change
                    // alone is re-baselined, not reinstalled
                    fixups.push(Fixup::UpdateHash {
                        key: key.clone(),
                        filename: filename.clone(),
                        hash: current_hash,
                    });
                }
                Ok(_) => {}
                Err(_) => {
                    repos_to_reinstall.insert(key.clone(), "unreadable file(s)".to_string());
                }
            }
        }

        // surviving records of one repo must agree on a single version
        if !repos_to_reinstall.contains_key(key) {
            let versions: BTreeSet<&str> = fonts
                .iter()
                .filter(|(filename, _)| surviving(filename))
                .map(|(_, entry)| entry.version.as_str())
                .collect();
            if versions.len() > 1 {
                repos_to_reinstall.insert(key.clone(), "mixed versions".to_string());
            }
        }
    }

    for (key, reason) in repos_to_reinstall {
        fixups.push(Fixup::Reinstall { key, reason });
    }

    fixups
}

/// Apply one fixup, returning the number of issues fixed.
///
/// Reinstalls are delegated to the caller, which runs the full install
/// pipeline and reports success.
pub fn apply_fixup(
    manifest: &mut InstalledManifest,
    fixup: &Fixup,
    reinstall: &mut dyn FnMut(&str) -> bool,
) -> usize {
    match fixup {
        Fixup::RemoveRepo { key } => manifest.remove(key).map(|fonts| fonts.len()).unwrap_or(0),
        Fixup::RemoveEntry { key, filename } | Fixup::RemoveDuplicate { key, filename } => {
            usize::from(manifest.remove_entry(key, filename))
        }
        Fixup::UpdateHash {
            key,
            filename,
            hash,
        } => usize::from(manifest.update_hash(key, filename, hash)),
        Fixup::Reinstall { key, .. } => usize::from(reinstall(key)),
    }
}
