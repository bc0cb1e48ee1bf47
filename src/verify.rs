//! Pack verification - checks declared sprite coordinates against the real sheet
//!
//! The verifier never throws on data errors: every problem is collected
//! into the report so a user sees all bad coordinates in one pass.
//! Structural and sheet-resolution failures short-circuit the remaining
//! checks; bounds and per-sprite preview failures accumulate.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::{Pack, SpriteDef};
use crate::output::save_png;
use crate::preview::render_preview;
use crate::sheet::{find_sheet_file, ImageBackend};

/// Result of verifying one pack definition.
///
/// Field names are a stable contract for downstream tooling.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// True iff no errors were collected
    pub valid: bool,
    /// Number of named sprite definitions (not frames)
    pub sprite_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
}

impl VerifyReport {
    fn new() -> Self {
        Self {
            valid: true,
            sprite_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            preview_path: None,
        }
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Verify a pack definition against its extracted files.
///
/// `pack_dir` is the directory the pack archive was extracted into.
/// `backend` is the image-processing capability; passing `None` degrades
/// verification to structural checks only (one warning, not an error).
/// When `preview_path` is given and a sheet was decoded, the diagnostic
/// preview is written there as PNG.
pub fn verify_pack(
    pack: &Pack,
    pack_dir: &Path,
    backend: Option<&dyn ImageBackend>,
    preview_path: Option<&Path>,
) -> VerifyReport {
    let mut report = VerifyReport::new();

    // Structural validation is terminal: no sheet access on failure
    let structural = pack.structural_errors();
    if !structural.is_empty() {
        report.errors = structural;
        return report.finish();
    }

    report.sprite_count = pack.sprites.len();

    let Some(primary_sheet) = pack.primary_sheet.as_deref() else {
        report
            .warnings
            .push("No primarySheet defined, skipping image verification".to_string());
        return report.finish();
    };

    let Some(sheet_path) = find_sheet_file(pack_dir, primary_sheet) else {
        report
            .errors
            .push(format!("Primary sheet not found: {}", primary_sheet));
        return report.finish();
    };

    let Some(backend) = backend else {
        report.warnings.push(
            "Image backend unavailable, skipping coordinate checks and preview".to_string(),
        );
        return report.finish();
    };

    let sheet = match backend.decode(&sheet_path) {
        Ok(img) => img,
        Err(e) => {
            // Decode trouble downgrades to a warning; structural validity
            // is still reported
            report
                .warnings
                .push(format!("Image verification failed: {}", e));
            return report.finish();
        }
    };

    check_bounds(pack, sheet.width(), sheet.height(), &mut report.errors);

    let preview = render_preview(pack, &sheet, backend);
    report.warnings.extend(preview.warnings);

    if let Some(path) = preview_path {
        match save_png(&preview.image, path) {
            Ok(()) => report.preview_path = Some(path.to_path_buf()),
            Err(e) => report
                .warnings
                .push(format!("Failed to write preview: {}", e)),
        }
    }

    report.finish()
}

/// Test every frame of every sprite against the decoded sheet dimensions.
/// Exhaustive: one error entry per out-of-bounds frame, never fail-fast.
fn check_bounds(pack: &Pack, sheet_w: u32, sheet_h: u32, errors: &mut Vec<String>) {
    let tile_size = pack.tile_size();

    for (name, sprite) in &pack.sprites {
        match sprite {
            SpriteDef::Animated(anim) => {
                for (i, frame) in anim.frames.iter().enumerate() {
                    let rect = frame.effective_rect(tile_size);
                    if !rect.is_within_bounds(sheet_w, sheet_h) {
                        errors.push(format!(
                            "{} frame {}: out of bounds ({},{} {}x{})",
                            name, i, rect.x, rect.y, rect.w, rect.h
                        ));
                    }
                }
            }
            SpriteDef::Static(_) => {
                // Static sprites always have exactly one frame
                if let Some(frame) = sprite.first_frame() {
                    let rect = frame.effective_rect(tile_size);
                    if !rect.is_within_bounds(sheet_w, sheet_h) {
                        errors.push(format!(
                            "{}: out of bounds ({},{} {}x{})",
                            name, rect.x, rect.y, rect.w, rect.h
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rect;
    use crate::sheet::{RasterBackend, SheetError};
    use image::RgbaImage;
    use std::fs;

    /// Backend reporting synthetic sheet dimensions, no real decoding.
    struct FakeBackend {
        w: u32,
        h: u32,
    }

    impl ImageBackend for FakeBackend {
        fn decode(&self, _path: &Path) -> Result<RgbaImage, SheetError> {
            Ok(RgbaImage::new(self.w, self.h))
        }

        fn crop(&self, sheet: &RgbaImage, rect: &Rect) -> Result<RgbaImage, SheetError> {
            RasterBackend.crop(sheet, rect)
        }

        fn scale_to_fit(
            &self,
            img: &RgbaImage,
            max_w: u32,
            max_h: u32,
        ) -> Result<RgbaImage, SheetError> {
            RasterBackend.scale_to_fit(img, max_w, max_h)
        }
    }

    /// Pack dir containing an (empty) file at the primary sheet path, so
    /// resolution succeeds and the fake backend supplies the pixels.
    fn pack_dir_with_sheet(relative: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
        dir
    }

    fn pack(sprites_json: &str) -> Pack {
        Pack::from_str(&format!(
            r#"{{
                "id": "test-pack",
                "name": "Test Pack",
                "source": "test",
                "license": "CC0",
                "downloadUrl": "https://example.com/p.zip",
                "tileSize": 16,
                "primarySheet": "sheet.png",
                "sprites": {}
            }}"#,
            sprites_json
        ))
        .unwrap()
    }

    #[test]
    fn test_valid_pack_on_exact_fit_sheet() {
        let pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        let dir = pack_dir_with_sheet("sheet.png");
        let backend = FakeBackend { w: 16, h: 16 };

        let report = verify_pack(&pack, dir.path(), Some(&backend), None);
        assert!(report.valid);
        assert_eq!(report.sprite_count, 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_sheet_one_pixel_short_is_one_bounds_error() {
        let pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        let dir = pack_dir_with_sheet("sheet.png");
        let backend = FakeBackend { w: 15, h: 15 };

        let report = verify_pack(&pack, dir.path(), Some(&backend), None);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("a:"), "{}", report.errors[0]);
    }

    #[test]
    fn test_animated_frame_error_names_frame_index() {
        // Frame 1 at x=20 with w=16 ends at 36 > 32; frame 0 is fine
        let pack = pack(r#"{"anim": {"frames": [{"x": 0, "y": 0}, {"x": 20, "y": 0}]}}"#);
        let dir = pack_dir_with_sheet("sheet.png");
        let backend = FakeBackend { w: 32, h: 16 };

        let report = verify_pack(&pack, dir.path(), Some(&backend), None);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(
            report.errors[0].starts_with("anim frame 1:"),
            "{}",
            report.errors[0]
        );
    }

    #[test]
    fn test_bounds_collection_is_exhaustive() {
        let pack = pack(
            r#"{
                "a": {"x": 0, "y": 0},
                "b": {"x": 100, "y": 0},
                "c": {"x": 0, "y": 100},
                "d": {"x": -1, "y": 0}
            }"#,
        );
        let dir = pack_dir_with_sheet("sheet.png");
        let backend = FakeBackend { w: 64, h: 64 };

        let report = verify_pack(&pack, dir.path(), Some(&backend), None);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.sprite_count, 4);
    }

    #[test]
    fn test_structural_failure_is_terminal() {
        let pack = Pack::from_str("{}").unwrap();
        // Nonexistent pack dir: must not matter, sheet is never touched
        let report = verify_pack(
            &pack,
            Path::new("/nonexistent"),
            Some(&FakeBackend { w: 16, h: 16 }),
            None,
        );

        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4);
        assert_eq!(report.sprite_count, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_primary_sheet_is_warning_only() {
        let mut pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        pack.primary_sheet = None;
        let report = verify_pack(
            &pack,
            Path::new("/nonexistent"),
            Some(&FakeBackend { w: 16, h: 16 }),
            None,
        );

        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("skipping image verification"));
    }

    #[test]
    fn test_unresolvable_sheet_is_error() {
        let pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        let dir = tempfile::tempdir().unwrap();

        let report = verify_pack(&pack, dir.path(), Some(&FakeBackend { w: 16, h: 16 }), None);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["Primary sheet not found: sheet.png".to_string()]
        );
    }

    #[test]
    fn test_missing_backend_degrades_with_warning() {
        let pack = pack(r#"{"a": {"x": 1000, "y": 1000}}"#);
        let dir = pack_dir_with_sheet("sheet.png");

        let report = verify_pack(&pack, dir.path(), None, None);
        // Bounds never checked, so the wild coordinates stay unreported
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("backend unavailable"));
    }

    #[test]
    fn test_case_insensitive_sheet_resolution() {
        let mut pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        pack.primary_sheet = Some("Tilemap/tilemap.png".to_string());
        let dir = pack_dir_with_sheet("tilemap/TILEMAP.png");

        let report = verify_pack(&pack, dir.path(), Some(&FakeBackend { w: 16, h: 16 }), None);
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn test_preview_written_when_requested() {
        let pack = pack(r#"{"a": {"x": 0, "y": 0}}"#);
        let dir = pack_dir_with_sheet("sheet.png");
        let out = dir.path().join("test-pack-preview.png");

        let report = verify_pack(
            &pack,
            dir.path(),
            Some(&FakeBackend { w: 16, h: 16 }),
            Some(&out),
        );
        assert_eq!(report.preview_path.as_deref(), Some(out.as_path()));
        assert!(out.exists());
    }

    #[test]
    fn test_report_serialization_contract() {
        let report = VerifyReport {
            valid: false,
            sprite_count: 2,
            errors: vec!["a: out of bounds (0,0 16x16)".to_string()],
            warnings: vec![],
            preview_path: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""valid":false"#));
        assert!(json.contains(r#""spriteCount":2"#));
        assert!(json.contains(r#""errors""#));
        assert!(json.contains(r#""warnings""#));
        // Absent preview path is omitted, not null
        assert!(!json.contains("previewPath"));
    }
}
