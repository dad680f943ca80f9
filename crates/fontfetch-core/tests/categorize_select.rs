//! Categorization and selection against real files on disk.

mod common;

use common::{build_sfnt, build_woff, build_woff2, write_font};
use fontfetch_core::categorize::categorize_fonts;
use fontfetch_core::format::FormatLabel;
use fontfetch_core::inspect;
use fontfetch_core::select::{select_fonts, StyleFilter};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn every_input_file_lands_in_exactly_one_bucket() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_font(dir.path(), "Static.ttf", &build_sfnt(400, false, false)),
        write_font(dir.path(), "Variable.ttf", &build_sfnt(400, false, true)),
        write_font(dir.path(), "Face.otf", &build_sfnt(400, false, false)),
        write_font(dir.path(), "Web.woff", &build_woff(400, false, false, false)),
        write_font(dir.path(), "VarWeb.woff2", &build_woff2(true)),
        write_font(dir.path(), "Corrupt.ttf", b"definitely not a font"),
        write_font(dir.path(), "Upper.TTF", &build_sfnt(700, false, false)),
    ];

    let buckets = categorize_fonts(&files);
    assert_eq!(buckets.total(), files.len());

    assert_eq!(buckets.variable_ttf, vec![files[1].clone()]);
    // the corrupt file is not dropped: inspection failure means static
    assert_eq!(
        buckets.static_ttf,
        vec![files[0].clone(), files[5].clone(), files[6].clone()]
    );
    assert_eq!(buckets.otf, vec![files[2].clone()]);
    assert_eq!(buckets.static_woff, vec![files[3].clone()]);
    assert_eq!(buckets.variable_woff2, vec![files[4].clone()]);
    assert!(buckets.variable_woff.is_empty());
    assert!(buckets.static_woff2.is_empty());
}

#[test]
fn selector_skips_empty_buckets_and_takes_the_first_match() {
    let dir = TempDir::new().unwrap();
    let static_ttf = write_font(dir.path(), "A.ttf", &build_sfnt(400, false, false));
    let buckets = categorize_fonts(std::slice::from_ref(&static_ttf));

    let selection = select_fonts(
        &buckets,
        &[FormatLabel::VariableTtf, FormatLabel::StaticTtf],
        &[],
        StyleFilter::Both,
    );
    assert_eq!(selection.format, Some(FormatLabel::StaticTtf));
    assert_eq!(selection.files, vec![static_ttf]);
}

#[test]
fn variable_selection_ignores_weight_and_style_filters() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_font(dir.path(), "Var1.ttf", &build_sfnt(100, false, true)),
        write_font(dir.path(), "Var2.ttf", &build_sfnt(900, true, true)),
    ];
    let buckets = categorize_fonts(&files);

    let selection = select_fonts(
        &buckets,
        &[FormatLabel::VariableTtf],
        &[700],
        StyleFilter::Italic,
    );
    assert_eq!(selection.files, files);
    assert_eq!(selection.format, Some(FormatLabel::VariableTtf));
}

#[test]
fn variable_format_wins_over_static_in_priority_order() {
    // the spec's worked example: regular + italic statics plus one variable
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_font(
            dir.path(),
            "Inter-Regular.ttf",
            &build_sfnt(400, false, false),
        ),
        write_font(
            dir.path(),
            "Inter-Italic.ttf",
            &build_sfnt(400, true, false),
        ),
        write_font(dir.path(), "Inter[wght].ttf", &build_sfnt(400, false, true)),
    ];
    let buckets = categorize_fonts(&files);

    let selection = select_fonts(
        &buckets,
        &[FormatLabel::VariableTtf, FormatLabel::StaticTtf],
        &[],
        StyleFilter::Both,
    );
    assert_eq!(selection.files, vec![files[2].clone()]);
    assert_eq!(selection.format, Some(FormatLabel::VariableTtf));
}

#[test]
fn weight_and_style_filters_narrow_static_selections() {
    let dir = TempDir::new().unwrap();
    let regular = write_font(
        dir.path(),
        "Inter-Regular.ttf",
        &build_sfnt(400, false, false),
    );
    let italic = write_font(
        dir.path(),
        "Inter-Italic.ttf",
        &build_sfnt(400, true, false),
    );
    let variable = write_font(dir.path(), "Inter[wght].ttf", &build_sfnt(400, false, true));
    let bold = write_font(dir.path(), "Inter-Bold.ttf", &build_sfnt(700, false, false));
    let files = vec![regular.clone(), italic.clone(), variable, bold.clone()];
    let buckets = categorize_fonts(&files);

    // italic 400 only
    let selection = select_fonts(
        &buckets,
        &[FormatLabel::StaticTtf],
        &[400],
        StyleFilter::Italic,
    );
    assert_eq!(selection.files, vec![italic]);
    assert_eq!(selection.format, Some(FormatLabel::StaticTtf));

    // weight filter alone
    let selection = select_fonts(&buckets, &[FormatLabel::StaticTtf], &[700], StyleFilter::Both);
    assert_eq!(selection.files, vec![bold]);

    // a filter that empties the bucket moves on to the next priority
    let selection = select_fonts(
        &buckets,
        &[FormatLabel::StaticTtf, FormatLabel::Otf],
        &[250],
        StyleFilter::Both,
    );
    assert!(selection.is_empty());
    assert_eq!(selection.format, None);
}

#[test]
fn woff_containers_are_introspected_without_full_parsing() {
    let dir = TempDir::new().unwrap();

    let woff_var = write_font(dir.path(), "Var.woff", &build_woff(400, false, true, false));
    assert!(inspect::is_variable_font(&woff_var).unwrap());

    let woff_static = write_font(dir.path(), "Flat.woff", &build_woff(300, true, false, false));
    assert!(!inspect::is_variable_font(&woff_static).unwrap());
    assert_eq!(inspect::font_weight(&woff_static), 300);
    assert!(inspect::font_italic(&woff_static));

    // deflated OS/2 tables are inflated before reading
    let woff_packed = write_font(dir.path(), "Packed.woff", &build_woff(600, false, false, true));
    assert_eq!(inspect::font_weight(&woff_packed), 600);
    assert!(!inspect::font_italic(&woff_packed));

    let woff2_var = write_font(dir.path(), "Var.woff2", &build_woff2(true));
    assert!(inspect::is_variable_font(&woff2_var).unwrap());
    // WOFF2 table data is brotli-compressed; weight falls back to the default
    assert_eq!(inspect::font_weight(&woff2_var), 400);

    let woff2_static = write_font(dir.path(), "Flat.woff2", &build_woff2(false));
    assert!(!inspect::is_variable_font(&woff2_static).unwrap());
}

#[test]
fn sfnt_introspection_reads_os2_fields() {
    let dir = TempDir::new().unwrap();
    let font = write_font(dir.path(), "Heavy-Italic.ttf", &build_sfnt(900, true, false));
    assert_eq!(inspect::font_weight(&font), 900);
    assert!(inspect::font_italic(&font));
    assert!(!inspect::is_variable_font(&font).unwrap());
    assert!(inspect::probe(&font).is_ok());

    let variable = write_font(dir.path(), "Var.ttf", &build_sfnt(400, false, true));
    assert!(inspect::is_variable_font(&variable).unwrap());
}

#[test]
fn empty_inputs_produce_empty_selections() {
    let buckets = categorize_fonts(&[]);
    assert_eq!(buckets.total(), 0);
    let selection = select_fonts(
        &buckets,
        &FormatLabel::DEFAULT_PRIORITIES,
        &[],
        StyleFilter::Both,
    );
    assert!(selection.is_empty());

    // non-empty buckets but no priorities
    let files: Vec<PathBuf> = Vec::new();
    assert!(select_fonts(&categorize_fonts(&files), &[], &[], StyleFilter::Both).is_empty());
}
