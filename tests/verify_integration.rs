//! End-to-end verification tests against real PNG fixtures on disk
//!
//! These build an extracted-pack directory layout in a temp dir, decode
//! through the real image backend, and check reports and preview output.

use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;

use spritepack::models::Pack;
use spritepack::sheet::RasterBackend;
use spritepack::verify::verify_pack;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Write a two-tile sheet (left 16x16 red, right 16x16 blue) as PNG.
fn write_sheet(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut sheet = RgbaImage::from_pixel(32, 16, RED);
    for y in 0..16 {
        for x in 16..32 {
            sheet.put_pixel(x, y, BLUE);
        }
    }
    sheet.save(path).unwrap();
}

fn pack_json(primary_sheet: &str, sprites: &str) -> String {
    format!(
        r#"{{
            "id": "demo-pack",
            "name": "Demo Pack",
            "source": "kenney.nl",
            "license": "CC0",
            "downloadUrl": "https://example.com/demo.zip",
            "tileSize": 16,
            "primarySheet": "{}",
            "sprites": {}
        }}"#,
        primary_sheet, sprites
    )
}

#[test]
fn verifies_pack_against_decoded_png() {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(&dir.path().join("Tilemap/tilemap.png"));

    let pack = Pack::from_str(&pack_json(
        "Tilemap/tilemap.png",
        r#"{"floor": {"x": 0, "y": 0}, "water": {"x": 16, "y": 0}}"#,
    ))
    .unwrap();

    let report = verify_pack(&pack, dir.path(), Some(&RasterBackend), None);
    assert!(report.valid, "{:?}", report.errors);
    assert_eq!(report.sprite_count, 2);
    assert!(report.warnings.is_empty());
}

#[test]
fn reports_out_of_bounds_against_real_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(&dir.path().join("sheet.png"));

    // 32x16 sheet: second frame ends at x=36
    let pack = Pack::from_str(&pack_json(
        "sheet.png",
        r#"{"walk": {"frames": [{"x": 0, "y": 0}, {"x": 20, "y": 0}]}}"#,
    ))
    .unwrap();

    let report = verify_pack(&pack, dir.path(), Some(&RasterBackend), None);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("walk frame 1"));
}

#[test]
fn resolves_sheet_with_mismatched_casing() {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(&dir.path().join("tilemap/TileMap_Packed.PNG"));

    let pack = Pack::from_str(&pack_json(
        "Tilemap/tilemap_packed.png",
        r#"{"floor": {"x": 0, "y": 0}}"#,
    ))
    .unwrap();

    let report = verify_pack(&pack, dir.path(), Some(&RasterBackend), None);
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn writes_preview_png_with_sprite_crops() {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(&dir.path().join("sheet.png"));
    let preview_path = dir.path().join("demo-pack-preview.png");

    let pack = Pack::from_str(&pack_json(
        "sheet.png",
        r#"{"floor": {"x": 0, "y": 0}, "water": {"x": 16, "y": 0}}"#,
    ))
    .unwrap();

    let report = verify_pack(
        &pack,
        dir.path(),
        Some(&RasterBackend),
        Some(&preview_path),
    );
    assert!(report.valid);
    assert_eq!(report.preview_path.as_deref(), Some(preview_path.as_path()));

    let preview = image::open(&preview_path).unwrap().to_rgba8();
    // Fixed 8-column grid of 64px cells, one row for two sprites
    assert_eq!(preview.dimensions(), (512, 64));
    // First cell holds the red tile, second the blue one (2px inset)
    assert_eq!(*preview.get_pixel(2, 2), RED);
    assert_eq!(*preview.get_pixel(66, 2), BLUE);
}

#[test]
fn corrupt_sheet_degrades_to_warning() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sheet.png"), b"not actually a png").unwrap();

    let pack = Pack::from_str(&pack_json("sheet.png", r#"{"floor": {"x": 0, "y": 0}}"#)).unwrap();

    let report = verify_pack(&pack, dir.path(), Some(&RasterBackend), None);
    // Structural validity still reported; the decode trouble is a warning
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Image verification failed"));
}

#[test]
fn bad_preview_sprite_warns_but_keeps_report_exhaustive() {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(&dir.path().join("sheet.png"));
    let preview_path = dir.path().join("demo-pack-preview.png");

    let pack = Pack::from_str(&pack_json(
        "sheet.png",
        r#"{"good": {"x": 0, "y": 0}, "bad": {"x": 100, "y": 100}}"#,
    ))
    .unwrap();

    let report = verify_pack(
        &pack,
        dir.path(),
        Some(&RasterBackend),
        Some(&preview_path),
    );
    // One bounds error for the bad sprite, one preview warning for its cell
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("bad:"));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Failed to extract bad"));
    // Preview still written with the good sprite in place
    assert!(preview_path.exists());
    let preview = image::open(&preview_path).unwrap().to_rgba8();
    assert_eq!(*preview.get_pixel(2, 2), RED);
}
