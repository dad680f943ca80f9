//! Archive extraction and font-file discovery.

use crate::{FetchResult, FontfetchError};
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Release asset extensions recognized as font archives, most specific first.
pub const ARCHIVE_EXTENSIONS: [&str; 4] = [".zip", ".tar.xz", ".tar.gz", ".tgz"];

/// Split an asset name into its base and archive extension. Returns an empty
/// extension for non-archive names.
pub fn split_archive_ext(name: &str) -> (&str, &'static str) {
    for ext in ARCHIVE_EXTENSIONS {
        if let Some(base) = name.strip_suffix(ext) {
            return (base, ext);
        }
    }
    (name, "")
}

/// Extract an archive into `dest`, skipping members that would escape it.
///
/// `.tar.xz` assets are recognized during selection but cannot be extracted
/// with the bundled decoders; they are deprioritized when choosing assets and
/// rejected here if one slips through.
pub fn extract_archive(archive: &Path, ext: &str, dest: &Path) -> FetchResult<()> {
    fs::create_dir_all(dest)?;
    match ext {
        ".zip" => extract_zip(archive, dest),
        ".tar.gz" | ".tgz" => extract_tar_gz(archive, dest),
        other => Err(FontfetchError::UnsupportedArchive(other.to_string())),
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> FetchResult<()> {
    let file = fs::File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| FontfetchError::Archive(e.to_string()))?;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| FontfetchError::Archive(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("skipping unsafe archive member: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> FetchResult<()> {
    let file = fs::File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    for entry in tar
        .entries()
        .map_err(|e| FontfetchError::Archive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| FontfetchError::Archive(e.to_string()))?;
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| FontfetchError::Archive(e.to_string()))?;
        if !unpacked {
            if let Ok(path) = entry.path() {
                log::warn!("skipping unsafe archive member: {}", path.display());
            }
        }
    }
    Ok(())
}

/// Recursively collect font files under `dir`, in a stable order.
pub fn find_font_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    matches!(
                        ext.to_string_lossy().to_lowercase().as_str(),
                        "ttf" | "otf" | "woff" | "woff2"
                    )
                })
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn splits_archive_extensions() {
        assert_eq!(split_archive_ext("Inter-4.0.zip"), ("Inter-4.0", ".zip"));
        assert_eq!(split_archive_ext("fonts.tar.gz"), ("fonts", ".tar.gz"));
        assert_eq!(split_archive_ext("fonts.tgz"), ("fonts", ".tgz"));
        assert_eq!(split_archive_ext("fonts.tar.xz"), ("fonts", ".tar.xz"));
        assert_eq!(split_archive_ext("checksums.txt"), ("checksums.txt", ""));
    }

    #[test]
    fn extracts_zip_archives() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("fonts.zip");
        let file = fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("fonts/A.ttf", options).unwrap();
        writer.write_all(b"aaaa").unwrap();
        writer.start_file("README.md", options).unwrap();
        writer.write_all(b"docs").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        extract_archive(&archive_path, ".zip", &dest).unwrap();
        assert!(dest.join("fonts/A.ttf").exists());
        assert!(dest.join("README.md").exists());

        let fonts = find_font_files(&dest);
        assert_eq!(fonts, vec![dest.join("fonts/A.ttf")]);
    }

    #[test]
    fn extracts_tar_gz_archives() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("fonts.tar.gz");
        let file = fs::File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"bbbb";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "fonts/B.otf", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        extract_archive(&archive_path, ".tar.gz", &dest).unwrap();
        assert!(dest.join("fonts/B.otf").exists());
    }

    #[test]
    fn rejects_unsupported_archive_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("fonts.tar.xz");
        fs::write(&archive_path, b"xz").unwrap();
        let err = extract_archive(&archive_path, ".tar.xz", &dir.path().join("out"));
        assert!(matches!(err, Err(FontfetchError::UnsupportedArchive(_))));
    }
}
