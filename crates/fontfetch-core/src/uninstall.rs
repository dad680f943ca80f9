//! The uninstall driver: hash-gated deletion of recorded files.

use crate::config::Context;
use crate::manifest::{self, InstalledManifest, RepoFonts};
use crate::platform;
use crate::FetchResult;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub deleted: usize,
}

/// Uninstall the given repo keys.
///
/// A file is deleted only when its current hash matches the record (or
/// `force` is set): a missing or locally-modified file keeps its record, since
/// we cannot safely claim it uninstalled. A repo whose every record was
/// removed is dropped from the manifest; otherwise the surviving subset stays.
pub fn uninstall_repos(ctx: &Context, repos: &[String], force: bool) -> FetchResult<UninstallReport> {
    let mut manifest = InstalledManifest::load(&ctx.manifest_path);
    let mut report = UninstallReport::default();
    if manifest.is_empty() {
        log::warn!("no installed fonts data found");
        return Ok(report);
    }

    let dest_dir = ctx.font_dir();
    let mut removed_paths: Vec<PathBuf> = Vec::new();

    for repo_arg in repos {
        let key = manifest::normalize_key(repo_arg);
        let Some(fonts) = manifest.get(&key).cloned() else {
            log::warn!("no fonts installed from {repo_arg}");
            continue;
        };

        let mut remaining: RepoFonts = RepoFonts::new();
        for (filename, entry) in fonts {
            let font_path = dest_dir.join(&filename);

            if !font_path.exists() {
                log::warn!("font {filename} not found in {}", dest_dir.display());
                remaining.insert(filename, entry);
                continue;
            }

            let current_hash = match manifest::sha256_file(&font_path) {
                Ok(hash) => hash,
                Err(e) => {
                    log::warn!("could not hash {filename}: {e}");
                    remaining.insert(filename, entry);
                    continue;
                }
            };

            if current_hash == entry.hash || force {
                match fs::remove_file(&font_path) {
                    Ok(()) => {
                        log::info!("deleted {filename} from {key}");
                        removed_paths.push(font_path);
                        report.deleted += 1;
                    }
                    Err(e) => {
                        log::warn!("could not delete {filename}: {e}");
                        remaining.insert(filename, entry);
                    }
                }
            } else {
                log::warn!("font {filename} has been modified; use --force to delete");
                remaining.insert(filename, entry);
            }
        }

        manifest.replace(&key, remaining);
    }

    manifest.save(&ctx.manifest_path)?;
    platform::unregister_fonts(&removed_paths);
    Ok(report)
}
