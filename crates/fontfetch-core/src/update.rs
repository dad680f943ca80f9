//! The update driver: version comparison and forced reinstall of outdated
//! repos.

use crate::config::Context;
use crate::fetch::{ReleaseSource, ReleaseSpec, GOOGLE_FONTS_OWNER};
use crate::install::{install_repo, InstallRequest};
use crate::manifest::{self, InstalledManifest};
use crate::FetchResult;
use semver::Version;
use std::fs;

/// Strip a leading `v` from a version tag.
pub fn clean_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

fn parse_semver(version: &str) -> Option<Version> {
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }
    // releases are often tagged with one or two components ("4" or "4.1");
    // pad to a full triple before giving up on semver ordering
    let numeric_parts: Vec<&str> = version.split('.').collect();
    if numeric_parts.len() < 3 && numeric_parts.iter().all(|p| p.parse::<u64>().is_ok()) {
        let mut padded = numeric_parts;
        while padded.len() < 3 {
            padded.push("0");
        }
        return Version::parse(&padded.join(".")).ok();
    }
    None
}

/// Whether `latest` is strictly newer than `installed`.
///
/// Semantic-version ordering when both sides parse; otherwise a byte-wise
/// comparison. The fallback is only correct for zero-padded ISO-8601 date
/// strings (the commit-date pseudo-versions) and is a known-fragile heuristic
/// for anything else.
pub fn is_newer(latest: &str, installed: &str) -> bool {
    let latest = clean_version(latest);
    let installed = clean_version(installed);
    match (parse_semver(latest), parse_semver(installed)) {
        (Some(latest), Some(installed)) => latest > installed,
        _ => latest > installed,
    }
}

#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: usize,
    pub checked: usize,
}

struct PendingUpdate {
    key: String,
    installed_version: String,
    latest_version: String,
    owner: String,
    repo_name: String,
    filenames: Vec<String>,
    body: String,
}

/// Resolve requested repo arguments against the manifest. `owner/name`
/// arguments match record fields; bare names match alias keys directly. No
/// arguments means every installed repo.
fn repos_to_check(manifest: &InstalledManifest, repos: &[String]) -> Vec<String> {
    if repos.is_empty() {
        return manifest.keys().cloned().collect();
    }

    let mut keys = Vec::new();
    for arg in repos {
        if arg.contains('/') {
            let Ok((owner, name)) = manifest::parse_repo(arg) else {
                log::warn!("invalid repo format: {arg}");
                continue;
            };
            let found = manifest.iter().find(|(_, fonts)| {
                fonts
                    .values()
                    .next()
                    .is_some_and(|entry| entry.owner == owner && entry.repo_name == name)
            });
            match found {
                Some((key, _)) => keys.push(key.clone()),
                None => log::warn!("no fonts installed from {arg}"),
            }
        } else {
            let key = manifest::normalize_key(arg);
            if manifest.contains(&key) {
                keys.push(key);
            } else {
                log::warn!("no fonts installed from {arg}");
            }
        }
    }
    keys
}

/// Update installed repos to their latest upstream versions.
pub fn update_repos(
    ctx: &Context,
    source: &dyn ReleaseSource,
    repos: &[String],
    changelog: bool,
) -> FetchResult<UpdateReport> {
    let mut manifest = InstalledManifest::load(&ctx.manifest_path);
    let mut report = UpdateReport::default();
    if manifest.is_empty() {
        log::warn!("no installed fonts data found");
        return Ok(report);
    }

    let keys = repos_to_check(&manifest, repos);
    let mut pending: Vec<PendingUpdate> = Vec::new();

    for key in &keys {
        let Some(fonts) = manifest.get(key) else {
            continue;
        };
        let Some(first) = fonts.values().next() else {
            continue;
        };
        report.checked += 1;
        // all records of one repo share a version under normal operation
        let installed_version = first.version.clone();
        let owner = first.owner.clone();
        let repo_name = first.repo_name.clone();

        let (latest_version, body) = if owner == GOOGLE_FONTS_OWNER {
            match source.last_commit_date("google", "fonts", &repo_name) {
                Some(date) => (date, String::new()),
                None => {
                    log::warn!("could not fetch latest for {key}");
                    continue;
                }
            }
        } else {
            match source.release(&owner, &repo_name, &ReleaseSpec::Latest) {
                Ok(info) => (info.version, info.body),
                Err(release_err) => {
                    // repos installed from a fonts/ directory have no releases
                    match source.last_commit_date(&owner, &repo_name, "fonts") {
                        Some(date) => (date, String::new()),
                        None => {
                            log::warn!(
                                "could not fetch latest for {owner}/{repo_name}: {release_err}"
                            );
                            continue;
                        }
                    }
                }
            }
        };

        if is_newer(&latest_version, &installed_version) {
            pending.push(PendingUpdate {
                key: key.clone(),
                installed_version,
                latest_version,
                owner,
                repo_name,
                filenames: fonts.keys().cloned().collect(),
                body,
            });
        } else {
            log::info!("{owner}/{repo_name} is up to date ({installed_version})");
        }
    }

    for update in pending {
        log::info!(
            "updating {} from {} to {}",
            update.key,
            update.installed_version,
            update.latest_version
        );
        // delete the old files best-effort, clear the entry, then reinstall
        for filename in &update.filenames {
            let path = ctx.font_dir().join(filename);
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    log::warn!("could not delete {filename}: {e}");
                }
            }
        }
        manifest.remove(&update.key);
        manifest.save(&ctx.manifest_path)?;

        let request = InstallRequest::reinstall(
            &update.owner,
            &update.repo_name,
            &update.key,
            ctx.config.priorities.clone(),
        );
        match install_repo(ctx, source, &request) {
            Ok(_) => {
                report.updated += 1;
                if changelog && !update.body.is_empty() {
                    println!(
                        "Changelog for {} {}:\n{}",
                        update.key, update.latest_version, update.body
                    );
                }
            }
            Err(e) => log::warn!("failed to update {}: {e}", update.key),
        }
        // reinstalling rewrote the manifest on disk; reload before the next
        // repo so we do not clobber its records
        manifest = InstalledManifest::load(&ctx.manifest_path);
    }

    Ok(report)
}
