//! The install driver: fetch, extract, select, reconcile, move, record.

use crate::archive::{self, ARCHIVE_EXTENSIONS};
use crate::cache;
use crate::categorize::categorize_fonts;
use crate::config::Context;
use crate::fetch::{self, ReleaseSource, ReleaseSpec, GOOGLE_FONTS_OWNER};
use crate::format::FormatLabel;
use crate::inspect;
use crate::manifest::{self, InstalledManifest, InstalledRecord};
use crate::platform;
use crate::select::{select_fonts, StyleFilter};
use crate::{FetchResult, FontfetchError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where an install comes from: a GitHub repo or the Google Fonts catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSpec {
    Github { owner: String, repo_name: String },
    GoogleFont { name: String },
}

impl RepoSpec {
    /// Interpret a CLI argument: `owner/repo` means GitHub, a bare name is
    /// looked up in Google Fonts.
    pub fn parse(arg: &str) -> FetchResult<RepoSpec> {
        if arg.contains('/') {
            let (owner, repo_name) = manifest::parse_repo(arg)?;
            Ok(RepoSpec::Github { owner, repo_name })
        } else {
            Ok(RepoSpec::GoogleFont {
                name: arg.to_string(),
            })
        }
    }

    /// The manifest key this source installs under.
    pub fn default_key(&self) -> String {
        match self {
            RepoSpec::Github { owner, repo_name } => {
                manifest::normalize_key(&format!("{owner}/{repo_name}"))
            }
            RepoSpec::GoogleFont { name } => manifest::normalize_key(name),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RepoSpec::Github { owner, repo_name } => format!("{owner}/{repo_name}"),
            RepoSpec::GoogleFont { name } => name.clone(),
        }
    }
}

/// Parameters of one install operation.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub spec: RepoSpec,
    pub repo_key: String,
    pub release: ReleaseSpec,
    pub priorities: Vec<FormatLabel>,
    pub weights: Vec<u16>,
    pub styles: StyleFilter,
    /// Install into the current directory without touching the manifest
    pub local: bool,
    pub force: bool,
}

impl InstallRequest {
    pub fn new(spec: RepoSpec, release: ReleaseSpec, priorities: Vec<FormatLabel>) -> Self {
        let repo_key = spec.default_key();
        InstallRequest {
            spec,
            repo_key,
            release,
            priorities,
            weights: Vec::new(),
            styles: StyleFilter::Both,
            local: false,
            force: false,
        }
    }

    /// The request repair and update use: latest, forced, default filters.
    pub fn reinstall(
        owner: &str,
        repo_name: &str,
        repo_key: &str,
        priorities: Vec<FormatLabel>,
    ) -> Self {
        InstallRequest {
            spec: RepoSpec::Github {
                owner: owner.to_string(),
                repo_name: repo_name.to_string(),
            },
            repo_key: repo_key.to_string(),
            release: ReleaseSpec::Latest,
            priorities,
            weights: Vec::new(),
            styles: StyleFilter::Both,
            local: false,
            force: true,
        }
    }
}

/// What an install ended up doing.
#[derive(Debug)]
pub enum InstallOutcome {
    Installed {
        count: usize,
        version: String,
        format: FormatLabel,
        dest: PathBuf,
    },
    AlreadyInstalled {
        version: String,
    },
    NothingSelected,
    SkippedWebFormats,
}

/// Install one repo end to end.
pub fn install_repo(
    ctx: &Context,
    source: &dyn ReleaseSource,
    req: &InstallRequest,
) -> FetchResult<InstallOutcome> {
    // WOFF containers are web formats; a system-wide install is almost
    // always a mistake
    if req.priorities.iter().any(|p| p.is_web()) && !req.local && !req.force {
        log::warn!(
            "installing WOFF/WOFF2 fonts globally is not recommended; use --force to proceed"
        );
        return Ok(InstallOutcome::SkippedWebFormats);
    }

    let scratch = TempDir::new()?;
    let payload = resolve_payload(ctx, source, req, scratch.path())?;

    let font_files = archive::find_font_files(&payload.dir);
    let buckets = categorize_fonts(&font_files);
    let selection = select_fonts(&buckets, &req.priorities, &req.weights, req.styles);
    let Some(format) = selection.format else {
        log::warn!(
            "no font files matched the requested formats for {}",
            req.spec.describe()
        );
        return Ok(InstallOutcome::NothingSelected);
    };

    let dest_dir = if req.local {
        std::env::current_dir()?
    } else {
        ctx.font_dir().to_path_buf()
    };
    fs::create_dir_all(&dest_dir)?;

    let mut manifest = if req.local {
        None
    } else {
        Some(InstalledManifest::load(&ctx.manifest_path))
    };

    if let Some(manifest) = manifest.as_mut() {
        if let Some(fonts) = manifest.get(&req.repo_key) {
            let versions: BTreeSet<&str> = fonts.values().map(|r| r.version.as_str()).collect();
            if versions.len() == 1 && versions.contains(payload.version.as_str()) && !req.force {
                log::info!(
                    "{} version {} is already installed; use --force to reinstall",
                    req.repo_key,
                    payload.version
                );
                return Ok(InstallOutcome::AlreadyInstalled {
                    version: payload.version,
                });
            }
            if req.force {
                log::info!(
                    "forcing reinstall of {} version {}",
                    req.repo_key,
                    payload.version
                );
            }
            // a repo's entry never mixes two versions' files: delete the old
            // files (best effort) and clear the entry before recording anew
            let filenames: Vec<String> = fonts.keys().cloned().collect();
            for filename in filenames {
                let path = dest_dir.join(&filename);
                if path.exists() {
                    if let Err(e) = fs::remove_file(&path) {
                        log::warn!("could not delete {filename}: {e}");
                    }
                }
            }
            manifest.remove(&req.repo_key);
            manifest.save(&ctx.manifest_path)?;
        }
    }

    // screen out files that do not parse; AppleDouble droppings stay quiet
    let mut moved: Vec<(String, PathBuf)> = Vec::new();
    for file in &selection.files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if let Err(e) = inspect::probe(file) {
            if !name.starts_with("._") {
                log::warn!("skipping invalid font file {name}: {e}");
            }
            continue;
        }
        let target = dest_dir.join(&name);
        move_file(file, &target)?;
        moved.push((name, target));
    }

    if let Some(manifest) = manifest.as_mut() {
        for (name, target) in &moved {
            // hash the moved bytes so the record reflects the final artifact
            match manifest::sha256_file(target) {
                Ok(hash) => manifest.insert(
                    &req.repo_key,
                    name,
                    InstalledRecord {
                        hash,
                        format: format.to_string(),
                        version: payload.version.clone(),
                        owner: payload.owner.clone(),
                        repo_name: payload.repo_name.clone(),
                    },
                ),
                Err(e) => log::warn!("could not hash {name}: {e}"),
            }
        }
        manifest.save(&ctx.manifest_path)?;
    }

    let paths: Vec<PathBuf> = moved.iter().map(|(_, path)| path.clone()).collect();
    platform::register_fonts(&paths);

    Ok(InstallOutcome::Installed {
        count: moved.len(),
        version: payload.version,
        format,
        dest: dest_dir,
    })
}

struct Payload {
    version: String,
    owner: String,
    repo_name: String,
    /// Directory holding the extracted/downloaded font files
    dir: PathBuf,
}

fn resolve_payload(
    ctx: &Context,
    source: &dyn ReleaseSource,
    req: &InstallRequest,
    scratch: &Path,
) -> FetchResult<Payload> {
    match &req.spec {
        RepoSpec::GoogleFont { name } => {
            let files_dir = scratch.join("files");
            fs::create_dir_all(&files_dir)?;
            let payload = fetch::fetch_google_font(source, name, &files_dir)?;
            Ok(Payload {
                version: payload.version,
                owner: payload.owner,
                repo_name: payload.repo_name,
                dir: files_dir,
            })
        }
        RepoSpec::Github { owner, repo_name } if owner == GOOGLE_FONTS_OWNER => {
            // reinstall/update of a Google Fonts install: repo_name is the
            // `<license-dir>/<font>` subdirectory path
            let files_dir = scratch.join("files");
            fs::create_dir_all(&files_dir)?;
            let count = source.download_tree("google", "fonts", repo_name, &files_dir)?;
            if count == 0 {
                return Err(FontfetchError::ReleaseNotFound(format!(
                    "google fonts subdirectory {repo_name} is empty"
                )));
            }
            let version = source
                .last_commit_date("google", "fonts", repo_name)
                .unwrap_or_else(|| "latest".to_string());
            Ok(Payload {
                version,
                owner: owner.clone(),
                repo_name: repo_name.clone(),
                dir: files_dir,
            })
        }
        RepoSpec::Github { owner, repo_name } => {
            resolve_github(ctx, source, req, owner, repo_name, scratch)
        }
    }
}

fn resolve_github(
    ctx: &Context,
    source: &dyn ReleaseSource,
    req: &InstallRequest,
    owner: &str,
    repo_name: &str,
    scratch: &Path,
) -> FetchResult<Payload> {
    let extract_dir = scratch.join("extracted");

    // a pinned release may already be cached under any archive extension
    if let (ReleaseSpec::Tag(tag), Some(disk_cache)) = (&req.release, &ctx.cache) {
        for ext in ARCHIVE_EXTENSIONS {
            let key = cache::archive_key(owner, repo_name, tag, ext);
            if let Some(cached) = disk_cache.get(&key) {
                log::info!("using cached archive: {key}");
                archive::extract_archive(&cached, ext, &extract_dir)?;
                return Ok(Payload {
                    version: tag.clone(),
                    owner: owner.to_string(),
                    repo_name: repo_name.to_string(),
                    dir: extract_dir,
                });
            }
        }
    }

    let info = match source.release(owner, repo_name, &req.release) {
        Ok(info) => info,
        Err(FontfetchError::ReleaseNotFound(_)) if req.release.is_latest() => {
            // repos without releases may still carry a fonts/ directory
            log::info!("{owner}/{repo_name} has no releases; trying its fonts/ directory");
            let files_dir = scratch.join("files");
            fs::create_dir_all(&files_dir)?;
            let count = source.download_tree(owner, repo_name, "fonts", &files_dir)?;
            if count == 0 {
                return Err(FontfetchError::ReleaseNotFound(format!(
                    "no releases or fonts/ directory for {owner}/{repo_name}"
                )));
            }
            let version = source
                .last_commit_date(owner, repo_name, "fonts")
                .unwrap_or_else(|| "latest".to_string());
            return Ok(Payload {
                version,
                owner: owner.to_string(),
                repo_name: repo_name.to_string(),
                dir: files_dir,
            });
        }
        Err(e) => return Err(e),
    };

    let asset = fetch::select_archive_asset(&info.assets)?;
    let (_, ext) = archive::split_archive_ext(&asset.name);
    let key = cache::archive_key(&info.owner, &info.repo_name, &info.version, ext);

    if let Some(cached) = ctx.cache.as_ref().and_then(|c| c.get(&key)) {
        log::info!("using cached archive: {key}");
        archive::extract_archive(&cached, ext, &extract_dir)?;
    } else {
        log::info!("downloading archive: {}", asset.name);
        let archive_path = scratch.join(format!("asset{ext}"));
        source.download_to(&asset.browser_download_url, &archive_path)?;
        if let Some(disk_cache) = &ctx.cache {
            if disk_cache.put(&key, &archive_path)? {
                log::info!("archive cached");
            }
        }
        archive::extract_archive(&archive_path, ext, &extract_dir)?;
    }

    Ok(Payload {
        version: info.version,
        owner: info.owner,
        repo_name: info.repo_name,
        dir: extract_dir,
    })
}

/// Move a file, falling back to copy+delete across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}
