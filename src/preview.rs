//! Diagnostic preview rendering - lays sprite crops out on a fixed grid
//!
//! The verifier renders one cell per sprite (up to 64, in declaration
//! order) so a user can eyeball every declared coordinate at once. Each
//! crop is scaled to fit its cell preserving aspect ratio and letterboxed
//! on transparent padding over an opaque background canvas.

use image::{Rgba, RgbaImage};

use crate::models::Pack;
use crate::sheet::ImageBackend;

/// Edge length of one preview cell in pixels
pub const CELL_SIZE: u32 = 64;
/// Number of cells per row
pub const GRID_COLS: u32 = 8;
/// Transparent inset between a cell edge and its sprite
pub const CELL_INSET: u32 = 2;
/// Maximum number of sprites shown in one preview
pub const MAX_SPRITES: usize = 64;

/// Opaque dark background so transparent sprites stay visible
const BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// A rendered preview plus per-sprite warnings for cells that failed.
#[derive(Debug)]
pub struct Preview {
    pub image: RgbaImage,
    pub warnings: Vec<String>,
}

/// Render the diagnostic preview for a pack against its decoded sheet.
///
/// A crop or scale failure for one sprite produces a warning and leaves
/// that cell empty; it never aborts the rest of the preview.
pub fn render_preview(pack: &Pack, sheet: &RgbaImage, backend: &dyn ImageBackend) -> Preview {
    let tile_size = pack.tile_size();
    let names: Vec<&String> = pack.sprites.keys().take(MAX_SPRITES).collect();
    let rows = (names.len() as u32).div_ceil(GRID_COLS).max(1);

    let mut canvas =
        RgbaImage::from_pixel(GRID_COLS * CELL_SIZE, rows * CELL_SIZE, BACKGROUND);
    let mut warnings = Vec::new();
    let inner = CELL_SIZE - 2 * CELL_INSET;

    for (i, name) in names.iter().enumerate() {
        let sprite = &pack.sprites[name.as_str()];
        let Some(frame) = sprite.first_frame() else {
            warnings.push(format!("Failed to extract {}: sprite has no frames", name));
            continue;
        };
        let rect = frame.effective_rect(tile_size);

        let scaled = backend
            .crop(sheet, &rect)
            .and_then(|crop| backend.scale_to_fit(&crop, inner, inner));
        let scaled = match scaled {
            Ok(img) => img,
            Err(e) => {
                warnings.push(format!("Failed to extract {}: {}", name, e));
                continue;
            }
        };

        let col = (i as u32) % GRID_COLS;
        let row = (i as u32) / GRID_COLS;
        // Center the letterboxed crop within the inset sub-cell
        let dest_x = col * CELL_SIZE + CELL_INSET + (inner - scaled.width()) / 2;
        let dest_y = row * CELL_SIZE + CELL_INSET + (inner - scaled.height()) / 2;
        blit(&mut canvas, &scaled, dest_x, dest_y);
    }

    Preview {
        image: canvas,
        warnings,
    }
}

/// Copy `src` onto `dest` at the given position.
fn blit(dest: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for sy in 0..src.height() {
        for sx in 0..src.width() {
            if x + sx < dest.width() && y + sy < dest.height() {
                dest.put_pixel(x + sx, y + sy, *src.get_pixel(sx, sy));
            }
        }
    }
}
