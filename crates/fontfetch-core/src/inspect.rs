//! Font introspection: variability, weight class, and italic flags.
//!
//! sfnt containers (TTF/OTF/TTC) are read with `read-fonts`. WOFF and WOFF2
//! carry their table directories uncompressed in the container header, so
//! presence checks are done on the raw bytes; the WOFF OS/2 table is inflated
//! when stored deflated. WOFF2 table data is brotli-compressed as a single
//! stream, so weight/style questions on WOFF2 fall back to defaults.
//!
//! Failure handling is asymmetric on purpose: variability determines which
//! bucket a file lands in, so `is_variable_font` propagates parse failures and
//! the categorizer decides the fallback. Weight and style only filter within
//! an already-chosen bucket, so `font_weight`/`font_italic` return defaults
//! (400, upright) instead of failing.

use crate::{FetchResult, FontfetchError};
use read_fonts::types::Tag;
use read_fonts::{FileRef, FontRef, TableProvider};
use std::path::Path;

enum Container {
    Sfnt,
    Woff,
    Woff2,
}

fn parse_err(path: &Path, reason: impl Into<String>) -> FontfetchError {
    FontfetchError::FontParse {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_font_bytes(path: &Path) -> FetchResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FontfetchError::FontNotFound(path.to_path_buf())
        } else {
            e.into()
        }
    })
}

fn sniff_container(path: &Path, data: &[u8]) -> FetchResult<Container> {
    match data.get(0..4) {
        Some(b"wOFF") => Ok(Container::Woff),
        Some(b"wOF2") => Ok(Container::Woff2),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"OTTO") | Some(b"ttcf") | Some(b"true") => {
            Ok(Container::Sfnt)
        }
        _ => Err(parse_err(path, "unrecognized font container")),
    }
}

fn first_font<'a>(path: &Path, data: &'a [u8]) -> FetchResult<FontRef<'a>> {
    match FileRef::new(data).map_err(|e| parse_err(path, e.to_string()))? {
        FileRef::Font(font) => Ok(font),
        FileRef::Collection(collection) => collection
            .get(0)
            .map_err(|e| parse_err(path, format!("cannot read collection: {e}"))),
    }
}

/// Whether the font declares a variable-font axis table (`fvar`).
///
/// Structural parse failures propagate; the caller decides the fallback.
pub fn is_variable_font(path: &Path) -> FetchResult<bool> {
    let data = read_font_bytes(path)?;
    match sniff_container(path, &data)? {
        Container::Sfnt => {
            let font = first_font(path, &data)?;
            Ok(font.table_data(Tag::new(b"fvar")).is_some())
        }
        Container::Woff => {
            let directory = woff1::directory(&data).map_err(|e| parse_err(path, e))?;
            Ok(directory.iter().any(|entry| entry.tag == *b"fvar"))
        }
        Container::Woff2 => woff2::has_fvar(&data).map_err(|e| parse_err(path, e)),
    }
}

/// The font's OS/2 weight class (100-900 scale), 400 when undeterminable.
pub fn font_weight(path: &Path) -> u16 {
    os2_fields(path).map(|(weight, _)| weight).unwrap_or(400)
}

/// Whether the font's OS/2 fsSelection marks it italic, false when
/// undeterminable.
pub fn font_italic(path: &Path) -> bool {
    os2_fields(path).map(|(_, italic)| italic).unwrap_or(false)
}

/// Structural validity check: the container header and table directory parse.
pub fn probe(path: &Path) -> FetchResult<()> {
    let data = read_font_bytes(path)?;
    match sniff_container(path, &data)? {
        Container::Sfnt => first_font(path, &data).map(|_| ()),
        Container::Woff => woff1::directory(&data)
            .map(|_| ())
            .map_err(|e| parse_err(path, e)),
        Container::Woff2 => woff2::has_fvar(&data)
            .map(|_| ())
            .map_err(|e| parse_err(path, e)),
    }
}

fn os2_fields(path: &Path) -> Option<(u16, bool)> {
    let data = std::fs::read(path).ok()?;
    match sniff_container(path, &data).ok()? {
        Container::Sfnt => {
            let font = first_font(path, &data).ok()?;
            let os2 = font.os2().ok()?;
            // Bit 0 of fsSelection = italic
            Some((os2.us_weight_class(), os2.fs_selection().bits() & 1 != 0))
        }
        Container::Woff => woff1::os2_fields(&data),
        Container::Woff2 => None,
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// WOFF 1.0 container: 44-byte header followed by 20-byte directory entries
/// with per-table zlib compression.
mod woff1 {
    use super::{be_u16, be_u32};
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    const HEADER_LEN: usize = 44;
    const DIR_ENTRY_LEN: usize = 20;

    pub(super) struct DirEntry {
        pub tag: [u8; 4],
        pub offset: u32,
        pub comp_length: u32,
        pub orig_length: u32,
    }

    pub(super) fn directory(data: &[u8]) -> Result<Vec<DirEntry>, String> {
        let num_tables = be_u16(data, 12).ok_or("truncated WOFF header")? as usize;
        let mut entries = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let at = HEADER_LEN + i * DIR_ENTRY_LEN;
            let tag_bytes = data
                .get(at..at + 4)
                .ok_or("truncated WOFF table directory")?;
            let offset = be_u32(data, at + 4).ok_or("truncated WOFF table directory")?;
            let comp_length = be_u32(data, at + 8).ok_or("truncated WOFF table directory")?;
            let orig_length = be_u32(data, at + 12).ok_or("truncated WOFF table directory")?;
            let end = offset
                .checked_add(comp_length)
                .ok_or("WOFF table overflows container")?;
            if end as usize > data.len() {
                return Err("WOFF table overflows container".to_string());
            }
            entries.push(DirEntry {
                tag: [tag_bytes[0], tag_bytes[1], tag_bytes[2], tag_bytes[3]],
                offset,
                comp_length,
                orig_length,
            });
        }
        Ok(entries)
    }

    pub(super) fn os2_fields(data: &[u8]) -> Option<(u16, bool)> {
        let entry_bytes: Vec<u8>;
        let table: &[u8] = {
            let directory = directory(data).ok()?;
            let entry = directory.into_iter().find(|e| e.tag == *b"OS/2")?;
            let raw = data.get(entry.offset as usize..(entry.offset + entry.comp_length) as usize)?;
            if entry.comp_length < entry.orig_length {
                let mut inflated = Vec::with_capacity(entry.orig_length as usize);
                ZlibDecoder::new(raw).read_to_end(&mut inflated).ok()?;
                entry_bytes = inflated;
                &entry_bytes
            } else {
                raw
            }
        };
        let weight = be_u16(table, 4)?;
        let italic = be_u16(table, 62)? & 1 != 0;
        Some((weight, italic))
    }
}

/// WOFF 2.0 container: 48-byte header followed by a transformed table
/// directory with 5-bit known-tag indices and UIntBase128 lengths.
mod woff2 {
    use super::be_u16;

    const HEADER_LEN: usize = 48;
    const ARBITRARY_TAG: u8 = 0x3f;
    const KNOWN_GLYF: u8 = 10;
    const KNOWN_LOCA: u8 = 11;
    const KNOWN_FVAR: u8 = 47;

    fn read_base128(data: &[u8], pos: &mut usize) -> Result<u32, String> {
        let mut accum: u32 = 0;
        for i in 0..5 {
            let byte = *data.get(*pos).ok_or("truncated UIntBase128")?;
            *pos += 1;
            if i == 0 && byte == 0x80 {
                return Err("UIntBase128 leading zero".to_string());
            }
            if accum & 0xFE00_0000 != 0 {
                return Err("UIntBase128 overflow".to_string());
            }
            accum = (accum << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                return Ok(accum);
            }
        }
        Err("UIntBase128 exceeds 5 bytes".to_string())
    }

    pub(super) fn has_fvar(data: &[u8]) -> Result<bool, String> {
        let num_tables = be_u16(data, 12).ok_or("truncated WOFF2 header")? as usize;
        if data.len() < HEADER_LEN {
            return Err("truncated WOFF2 header".to_string());
        }
        let mut pos = HEADER_LEN;
        let mut found = false;
        for _ in 0..num_tables {
            let flags = *data.get(pos).ok_or("truncated WOFF2 table directory")?;
            pos += 1;
            let index = flags & 0x3f;
            let transform = (flags >> 6) & 0x03;
            let explicit_tag = if index == ARBITRARY_TAG {
                let bytes = data
                    .get(pos..pos + 4)
                    .ok_or("truncated WOFF2 table directory")?;
                pos += 4;
                Some([bytes[0], bytes[1], bytes[2], bytes[3]])
            } else {
                None
            };
            if index == KNOWN_FVAR || explicit_tag == Some(*b"fvar") {
                found = true;
            }
            let _orig_length = read_base128(data, &mut pos)?;
            // glyf and loca default to the transformed encoding (version 3 is
            // the null transform); all other tables default to untransformed.
            let glyf_or_loca = matches!(index, KNOWN_GLYF | KNOWN_LOCA)
                || matches!(explicit_tag, Some(tag) if &tag == b"glyf" || &tag == b"loca");
            let transformed = if glyf_or_loca {
                transform != 3
            } else {
                transform != 0
            };
            if transformed {
                let _transform_length = read_base128(data, &mut pos)?;
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn woff2_bytes(entries: &[(u8, &[u8])]) -> Vec<u8> {
        // (flags, extra directory bytes) pairs appended after a minimal header
        let mut data = vec![0u8; 48];
        data[0..4].copy_from_slice(b"wOF2");
        data[4..8].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        data[12..14].copy_from_slice(&(entries.len() as u16).to_be_bytes());
        for (flags, rest) in entries {
            data.push(*flags);
            data.extend_from_slice(rest);
        }
        data
    }

    #[test]
    fn sniffs_containers() {
        let path = Path::new("font.ttf");
        assert!(matches!(
            sniff_container(path, b"wOFFxxxx").unwrap(),
            Container::Woff
        ));
        assert!(matches!(
            sniff_container(path, b"wOF2xxxx").unwrap(),
            Container::Woff2
        ));
        assert!(matches!(
            sniff_container(path, &[0x00, 0x01, 0x00, 0x00, 0, 0]).unwrap(),
            Container::Sfnt
        ));
        assert!(matches!(
            sniff_container(path, b"OTTOxxxx").unwrap(),
            Container::Sfnt
        ));
        assert!(sniff_container(path, b"GIF89a").is_err());
        assert!(sniff_container(path, b"").is_err());
    }

    #[test]
    fn woff2_directory_detects_fvar() {
        // one entry: known index 47 (fvar), null transform, origLength 20
        let data = woff2_bytes(&[(47, &[20])]);
        assert!(woff2::has_fvar(&data).unwrap());

        // one entry: known index 6 (OS/2), null transform, origLength 96
        let data = woff2_bytes(&[(6, &[96])]);
        assert!(!woff2::has_fvar(&data).unwrap());
    }

    #[test]
    fn woff2_directory_handles_arbitrary_and_transformed_tags() {
        // arbitrary-tag fvar entry, then glyf with the default transform
        // (version 0 => transformLength follows)
        let data = woff2_bytes(&[
            (0x3f, &[b'f', b'v', b'a', b'r', 20]),
            (10, &[100, 90]),
        ]);
        assert!(woff2::has_fvar(&data).unwrap());

        // glyf with null transform (version 3) has no transformLength
        let data = woff2_bytes(&[(0b1100_0000 | 10, &[100])]);
        assert!(!woff2::has_fvar(&data).unwrap());
    }

    #[test]
    fn woff2_truncated_directory_is_an_error() {
        let mut data = vec![0u8; 48];
        data[0..4].copy_from_slice(b"wOF2");
        data[12..14].copy_from_slice(&2u16.to_be_bytes());
        // directory for the second table is missing entirely
        data.push(6);
        data.push(96);
        assert!(woff2::has_fvar(&data).is_err());
    }

    #[test]
    fn weight_and_italic_default_on_unreadable_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"this is not a font").unwrap();
        assert_eq!(font_weight(&path), 400);
        assert!(!font_italic(&path));
        assert!(is_variable_font(&path).is_err());
        assert!(probe(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error_not_a_default_bucket() {
        let path = Path::new("/nonexistent/font.ttf");
        assert!(is_variable_font(path).is_err());
        assert_eq!(font_weight(path), 400);
        assert!(!font_italic(path));
    }
}
