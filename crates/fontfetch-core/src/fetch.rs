//! Release and repository-content fetching from the GitHub API.
//!
//! Drivers consume the `ReleaseSource` trait and only ever see resolved
//! release/asset data; HTTP status handling stays behind this seam. The
//! blocking client matches the tool's synchronous, one-repo-at-a-time model.

use crate::archive::split_archive_ext;
use crate::{FetchResult, FontfetchError};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const API_ROOT: &str = "https://api.github.com";

/// Owner recorded for fonts installed from the Google Fonts repository; their
/// `repo_name` is the `<license-dir>/<font>` subdirectory path.
pub const GOOGLE_FONTS_OWNER: &str = "google-fonts";

/// License directories of the google/fonts repository, in probe order.
pub const GOOGLE_FONTS_DIRS: [&str; 3] = ["ofl", "ufl", "apache"];

/// A release asset as reported by the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub size: u64,
    pub browser_download_url: String,
}

/// A resolved release: version tag, assets, release notes, and the
/// owner/repo the API finally answered for (after rename redirects).
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub version: String,
    pub assets: Vec<Asset>,
    pub body: String,
    pub owner: String,
    pub repo_name: String,
}

/// Which release to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSpec {
    Latest,
    Tag(String),
}

impl ReleaseSpec {
    pub fn from_arg(arg: &str) -> ReleaseSpec {
        if arg == "latest" {
            ReleaseSpec::Latest
        } else {
            ReleaseSpec::Tag(arg.to_string())
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, ReleaseSpec::Latest)
    }
}

/// The fetch collaborator the install/update drivers depend on.
pub trait ReleaseSource {
    /// Resolve a release and its assets.
    fn release(&self, owner: &str, repo: &str, spec: &ReleaseSpec) -> FetchResult<ReleaseInfo>;

    /// Download a URL to a file.
    fn download_to(&self, url: &str, dest: &Path) -> FetchResult<()>;

    /// Recursively download every font file under `path` in the repo into
    /// `dest`, preserving paths relative to `path`. Returns the file count.
    fn download_tree(&self, owner: &str, repo: &str, path: &str, dest: &Path)
        -> FetchResult<usize>;

    /// Last commit date touching `path`, as an ISO-8601 string. `None` when
    /// it cannot be determined; callers fall back to `"latest"`.
    fn last_commit_date(&self, owner: &str, repo: &str, path: &str) -> Option<String>;
}

#[derive(Deserialize)]
struct RawRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(default)]
    body: Option<String>,
    url: String,
}

#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<CommitActor>,
}

#[derive(Deserialize)]
struct CommitActor {
    date: String,
}

/// Blocking GitHub API client with optional bearer-token auth.
pub struct GithubClient {
    http: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> FetchResult<GithubClient> {
        let http = Client::builder()
            .user_agent(concat!("fontfetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(GithubClient { http, token })
    }

    fn get(&self, url: &str, json: bool) -> FetchResult<reqwest::blocking::Response> {
        let mut request = self.http.get(url);
        if json {
            request = request.header(ACCEPT, "application/vnd.github+json");
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FontfetchError::ReleaseNotFound(url.to_string()));
        }
        Ok(response.error_for_status()?)
    }

    fn release_by_url(&self, url: &str, owner: &str, repo: &str) -> FetchResult<ReleaseInfo> {
        let raw: RawRelease = self.get(url, true)?.json()?;
        // the release URL names the canonical owner/repo even when the
        // requested pair has since been renamed
        let mut final_owner = owner.to_string();
        let mut final_repo = repo.to_string();
        if let Some(tail) = raw.url.split("/repos/").nth(1) {
            let mut parts = tail.split('/');
            if let (Some(o), Some(r)) = (parts.next(), parts.next()) {
                final_owner = o.to_string();
                final_repo = r.to_string();
            }
        }
        Ok(ReleaseInfo {
            version: raw.tag_name,
            assets: raw.assets,
            body: raw.body.unwrap_or_default(),
            owner: final_owner,
            repo_name: final_repo,
        })
    }

    fn collect_tree(&self, owner: &str, repo: &str, path: &str) -> FetchResult<Vec<ContentItem>> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/contents/{path}");
        let items: Vec<ContentItem> = self.get(&url, true)?.json()?;
        let mut fonts = Vec::new();
        for item in items {
            if item.kind == "file" && is_font_name(&item.name) {
                fonts.push(item);
            } else if item.kind == "dir" {
                fonts.extend(self.collect_tree(owner, repo, &item.path)?);
            }
        }
        Ok(fonts)
    }
}

fn is_font_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    [".ttf", ".otf", ".woff", ".woff2"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

impl ReleaseSource for GithubClient {
    fn release(&self, owner: &str, repo: &str, spec: &ReleaseSpec) -> FetchResult<ReleaseInfo> {
        match spec {
            ReleaseSpec::Latest => {
                let url = format!("{API_ROOT}/repos/{owner}/{repo}/releases/latest");
                self.release_by_url(&url, owner, repo)
            }
            ReleaseSpec::Tag(tag) => {
                // releases are conventionally tagged `vX.Y.Z`; try the
                // v-prefixed tag first, then the bare one
                let candidates = if tag.starts_with('v') {
                    vec![tag.clone()]
                } else {
                    vec![format!("v{tag}"), tag.clone()]
                };
                let mut last_err = None;
                for candidate in &candidates {
                    let url =
                        format!("{API_ROOT}/repos/{owner}/{repo}/releases/tags/{candidate}");
                    match self.release_by_url(&url, owner, repo) {
                        Ok(info) => return Ok(info),
                        Err(e @ FontfetchError::ReleaseNotFound(_)) => last_err = Some(e),
                        Err(e) => return Err(e),
                    }
                }
                Err(last_err
                    .unwrap_or_else(|| FontfetchError::ReleaseNotFound(format!("{owner}/{repo}"))))
            }
        }
    }

    fn download_to(&self, url: &str, dest: &Path) -> FetchResult<()> {
        let mut response = self.get(url, false)?;
        let mut out = fs::File::create(dest)?;
        response.copy_to(&mut out)?;
        Ok(())
    }

    fn download_tree(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        dest: &Path,
    ) -> FetchResult<usize> {
        let items = self.collect_tree(owner, repo, path)?;
        let mut count = 0;
        for item in &items {
            let Some(url) = &item.download_url else {
                log::warn!("no download URL for {}; skipping", item.path);
                continue;
            };
            let relative = item.path.strip_prefix(path).unwrap_or(&item.name);
            let target = dest.join(relative.trim_start_matches('/'));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            self.download_to(url, &target)?;
            count += 1;
        }
        Ok(count)
    }

    fn last_commit_date(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/commits?path={path}&per_page=1");
        let commits: Vec<CommitItem> = match self.get(&url, true).and_then(|r| Ok(r.json()?)) {
            Ok(commits) => commits,
            Err(e) => {
                log::debug!("could not fetch commit date for {owner}/{repo} {path}: {e}");
                return None;
            }
        };
        commits
            .into_iter()
            .next()
            .and_then(|c| c.commit.committer)
            .map(|actor| actor.date)
    }
}

fn ext_priority(ext: &str) -> u8 {
    // tar.xz is recognized but not extractable with the bundled decoders, so
    // it sorts last among the real archive formats
    match ext {
        ".tar.gz" | ".tgz" => 1,
        ".zip" => 2,
        ".tar.xz" => 3,
        _ => 4,
    }
}

/// Choose the archive asset to download.
///
/// Assets are grouped by base name (the same payload often ships as both
/// `.zip` and `.tar.gz`); within a group the better compression wins, then
/// the smaller file. Across groups the smallest asset wins.
pub fn select_archive_asset(assets: &[Asset]) -> FetchResult<&Asset> {
    let mut groups: BTreeMap<&str, Vec<(&Asset, &str)>> = BTreeMap::new();
    for asset in assets {
        let (base, ext) = split_archive_ext(&asset.name);
        if !ext.is_empty() {
            groups.entry(base).or_default().push((asset, ext));
        }
    }
    if groups.is_empty() {
        return Err(FontfetchError::NoArchiveAsset);
    }

    let mut best: Vec<&Asset> = groups
        .into_values()
        .map(|mut items| {
            items.sort_by_key(|(asset, ext)| (ext_priority(ext), asset.size));
            items[0].0
        })
        .collect();
    best.sort_by_key(|asset| (asset.size, ext_priority(split_archive_ext(&asset.name).1)));
    Ok(best[0])
}

/// The synthetic owner/repo_name pair recorded for a Google Fonts install,
/// plus its commit-date version.
pub struct GoogleFontPayload {
    pub owner: String,
    pub repo_name: String,
    pub version: String,
}

/// Download a Google Font's subdirectory into `dest`, probing the license
/// directories in order.
pub fn fetch_google_font(
    source: &dyn ReleaseSource,
    font_name: &str,
    dest: &Path,
) -> FetchResult<GoogleFontPayload> {
    let name = font_name.to_lowercase();
    for dir in GOOGLE_FONTS_DIRS {
        let path = format!("{dir}/{name}");
        match source.download_tree("google", "fonts", &path, dest) {
            Ok(0) => continue,
            Ok(count) => {
                log::info!("downloaded {count} font files for {font_name} from {dir}");
                let version = source
                    .last_commit_date("google", "fonts", &path)
                    .unwrap_or_else(|| "latest".to_string());
                return Ok(GoogleFontPayload {
                    owner: GOOGLE_FONTS_OWNER.to_string(),
                    repo_name: path,
                    version,
                });
            }
            Err(FontfetchError::ReleaseNotFound(_)) => continue,
            Err(e) => {
                log::warn!("error probing {path}: {e}");
                continue;
            }
        }
    }
    Err(FontfetchError::ReleaseNotFound(format!(
        "font '{font_name}' not found in Google Fonts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, size: u64) -> Asset {
        Asset {
            name: name.to_string(),
            size,
            browser_download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn release_spec_from_arg() {
        assert_eq!(ReleaseSpec::from_arg("latest"), ReleaseSpec::Latest);
        assert_eq!(
            ReleaseSpec::from_arg("v4.0"),
            ReleaseSpec::Tag("v4.0".to_string())
        );
    }

    #[test]
    fn rejects_releases_without_archives() {
        let assets = vec![asset("checksums.txt", 10), asset("font.ttf", 100)];
        assert!(matches!(
            select_archive_asset(&assets),
            Err(FontfetchError::NoArchiveAsset)
        ));
    }

    #[test]
    fn prefers_better_compression_within_a_group() {
        let assets = vec![
            asset("Inter-4.0.zip", 2000),
            asset("Inter-4.0.tar.gz", 1800),
        ];
        let chosen = select_archive_asset(&assets).unwrap();
        assert_eq!(chosen.name, "Inter-4.0.tar.gz");
    }

    #[test]
    fn chooses_smallest_across_groups() {
        let assets = vec![
            asset("Inter-4.0.zip", 2000),
            asset("InterHinted-4.0.zip", 9000),
        ];
        let chosen = select_archive_asset(&assets).unwrap();
        assert_eq!(chosen.name, "Inter-4.0.zip");
    }

    #[test]
    fn tar_xz_sorts_behind_extractable_formats() {
        let assets = vec![
            asset("fonts.tar.xz", 1000),
            asset("fonts.tar.gz", 1500),
        ];
        let chosen = select_archive_asset(&assets).unwrap();
        assert_eq!(chosen.name, "fonts.tar.gz");
    }

    #[test]
    fn font_names_match_case_insensitively() {
        assert!(is_font_name("Roboto-Regular.TTF"));
        assert!(is_font_name("Roboto[wdth,wght].ttf"));
        assert!(!is_font_name("OFL.txt"));
    }
}
