//! Sheet file resolution and the image-processing capability seam
//!
//! Archives from different sources disagree about path casing
//! (`Tilemap/tilemap.png` vs `tilemap/Tilemap.png`), so sheet references
//! are resolved with a case-insensitive per-segment search.
//!
//! Image decode/crop/scale live behind the [`ImageBackend`] trait so the
//! verifier can be exercised with an in-memory fake reporting synthetic
//! dimensions instead of touching the filesystem.

use image::imageops::FilterType;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::grid::Rect;

/// Error type for sheet image operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SheetError {
    /// The sheet image could not be decoded
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Crop rectangle extends outside the sheet
    #[error("crop rectangle ({x},{y} {w}x{h}) outside sheet bounds {sheet_w}x{sheet_h}")]
    CropOutOfBounds {
        x: i64,
        y: i64,
        w: u32,
        h: u32,
        sheet_w: u32,
        sheet_h: u32,
    },
    /// Crop or scale target has a zero dimension
    #[error("image operation with zero-sized target")]
    ZeroSized,
}

/// Resolve a sheet reference inside an extracted pack directory.
///
/// Tries the exact relative path first, then walks the path one segment at
/// a time matching directory entries case-insensitively.
pub fn find_sheet_file(base_dir: &Path, relative: &str) -> Option<PathBuf> {
    let exact = base_dir.join(relative);
    if exact.exists() {
        return Some(exact);
    }

    let mut current = base_dir.to_path_buf();
    for part in relative.split(['/', '\\']).filter(|p| !p.is_empty()) {
        let needle = part.to_lowercase();
        let entry = fs::read_dir(&current)
            .ok()?
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().to_lowercase() == needle)?;
        current = entry.path();
    }

    current.exists().then_some(current)
}

/// The image operations the verifier needs: decode a sheet, crop a sprite
/// rectangle out of it, and scale a crop to fit a preview cell.
pub trait ImageBackend {
    /// Decode the image at `path` into RGBA pixels.
    fn decode(&self, path: &Path) -> Result<RgbaImage, SheetError>;

    /// Extract the sub-image covered by `rect`. Fails when the rectangle
    /// extends outside the sheet.
    fn crop(&self, sheet: &RgbaImage, rect: &Rect) -> Result<RgbaImage, SheetError>;

    /// Scale the image to fit within `max_w` x `max_h` preserving aspect
    /// ratio (contain fit). Never upscales past the limit, may letterbox.
    fn scale_to_fit(&self, img: &RgbaImage, max_w: u32, max_h: u32)
        -> Result<RgbaImage, SheetError>;
}

/// [`ImageBackend`] backed by the `image` crate. Nearest-neighbor scaling
/// keeps pixel art crisp.
#[derive(Debug, Default)]
pub struct RasterBackend;

impl ImageBackend for RasterBackend {
    fn decode(&self, path: &Path) -> Result<RgbaImage, SheetError> {
        let img = image::open(path).map_err(|source| SheetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(img.to_rgba8())
    }

    fn crop(&self, sheet: &RgbaImage, rect: &Rect) -> Result<RgbaImage, SheetError> {
        if rect.w == 0 || rect.h == 0 {
            return Err(SheetError::ZeroSized);
        }
        if !rect.is_within_bounds(sheet.width(), sheet.height()) {
            return Err(SheetError::CropOutOfBounds {
                x: rect.x,
                y: rect.y,
                w: rect.w,
                h: rect.h,
                sheet_w: sheet.width(),
                sheet_h: sheet.height(),
            });
        }
        // Bounds check above guarantees non-negative origin
        let cropped =
            image::imageops::crop_imm(sheet, rect.x as u32, rect.y as u32, rect.w, rect.h);
        Ok(cropped.to_image())
    }

    fn scale_to_fit(
        &self,
        img: &RgbaImage,
        max_w: u32,
        max_h: u32,
    ) -> Result<RgbaImage, SheetError> {
        if max_w == 0 || max_h == 0 || img.width() == 0 || img.height() == 0 {
            return Err(SheetError::ZeroSized);
        }
        let scale = (f64::from(max_w) / f64::from(img.width()))
            .min(f64::from(max_h) / f64::from(img.height()));
        let target_w = ((f64::from(img.width()) * scale) as u32).max(1);
        let target_h = ((f64::from(img.height()) * scale) as u32).max(1);
        Ok(image::imageops::resize(
            img,
            target_w,
            target_h,
            FilterType::Nearest,
        ))
    }
}
