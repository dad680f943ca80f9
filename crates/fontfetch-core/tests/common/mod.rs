//! Synthetic font fixtures: minimal but structurally valid containers.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

/// OS/2 version 0 table with the given weight class and italic flag.
pub fn os2_table(weight: u16, italic: bool) -> Vec<u8> {
    let mut table = vec![0u8; 78];
    table[4..6].copy_from_slice(&weight.to_be_bytes());
    let fs_selection: u16 = if italic { 1 } else { 0 };
    table[62..64].copy_from_slice(&fs_selection.to_be_bytes());
    table
}

/// A minimal sfnt (TTF/OTF) with an OS/2 table and, optionally, an fvar stub.
pub fn build_sfnt(weight: u16, italic: bool, variable: bool) -> Vec<u8> {
    let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![(*b"OS/2", os2_table(weight, italic))];
    if variable {
        tables.push((*b"fvar", vec![0u8; 16]));
    }

    let num_tables = tables.len() as u16;
    let entry_selector = (num_tables as f32).log2().floor() as u16;
    let search_range = 2u16.pow(entry_selector as u32) * 16;
    let range_shift = num_tables * 16 - search_range;

    let mut data = Vec::new();
    data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    data.extend_from_slice(&num_tables.to_be_bytes());
    data.extend_from_slice(&search_range.to_be_bytes());
    data.extend_from_slice(&entry_selector.to_be_bytes());
    data.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = 12 + 16 * tables.len() as u32;
    for (tag, table) in &tables {
        data.extend_from_slice(tag);
        data.extend_from_slice(&0u32.to_be_bytes()); // checksum, unchecked
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&(table.len() as u32).to_be_bytes());
        offset += table.len() as u32;
    }
    for (_, table) in &tables {
        data.extend_from_slice(table);
    }
    data
}

/// A WOFF 1.0 container wrapping an OS/2 table (optionally deflated) and an
/// optional fvar stub.
pub fn build_woff(weight: u16, italic: bool, variable: bool, compress_os2: bool) -> Vec<u8> {
    let os2 = os2_table(weight, italic);
    let os2_stored = if compress_os2 {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&os2).unwrap();
        encoder.finish().unwrap()
    } else {
        os2.clone()
    };

    let mut tables: Vec<([u8; 4], Vec<u8>, u32)> =
        vec![(*b"OS/2", os2_stored, os2.len() as u32)];
    if variable {
        tables.push((*b"fvar", vec![0u8; 16], 16));
    }

    let dir_len = 44 + 20 * tables.len() as u32;
    let total_len = dir_len + tables.iter().map(|(_, d, _)| d.len() as u32).sum::<u32>();

    let mut data = Vec::new();
    data.extend_from_slice(b"wOFF");
    data.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // flavor
    data.extend_from_slice(&total_len.to_be_bytes());
    data.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes()); // reserved
    data.extend_from_slice(&0u32.to_be_bytes()); // totalSfntSize
    data.extend_from_slice(&[0u8; 4]); // major/minor version
    data.extend_from_slice(&[0u8; 12]); // meta offset/length/origLength
    data.extend_from_slice(&[0u8; 8]); // priv offset/length

    let mut offset = dir_len;
    for (tag, stored, orig_len) in &tables {
        data.extend_from_slice(tag);
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        data.extend_from_slice(&orig_len.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // origChecksum
        offset += stored.len() as u32;
    }
    for (_, stored, _) in &tables {
        data.extend_from_slice(stored);
    }
    data
}

/// A WOFF2 header plus transformed table directory; table data is not
/// needed for directory-level introspection.
pub fn build_woff2(variable: bool) -> Vec<u8> {
    let mut data = vec![0u8; 48];
    data[0..4].copy_from_slice(b"wOF2");
    data[4..8].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    let num_tables: u16 = if variable { 2 } else { 1 };
    data[12..14].copy_from_slice(&num_tables.to_be_bytes());
    // OS/2 = known index 6, null transform, origLength 78
    data.push(6);
    data.push(78);
    if variable {
        // fvar = known index 47, null transform, origLength 16
        data.push(47);
        data.push(16);
    }
    data
}

pub fn write_font(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
