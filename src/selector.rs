//! Interactive selection session - click/drag/zoom state machine over one sheet
//!
//! The session tracks pointer gestures as explicit states so "did we just
//! finish a drag or a click" is unambiguous: a plain drag pans the view, a
//! modifier-held drag live-adjusts the grid offset, and a release that
//! moved less than a small threshold is reclassified as a click that
//! toggles the cell under the pointer.
//!
//! Pointer coordinates are viewport-relative; image-space positions are
//! derived from them via the current scroll and zoom.

use indexmap::IndexMap;
use serde::Serialize;
use std::io::{self, Write};

use crate::grid::{pixel_to_rect, GridParams, Rect};
use crate::models::{GridOffset, Pack};

/// Movement below this many pixels between press and release is a click,
/// not a drag. Suppresses accidental toggles during intended pans.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Zoom bounds, integer steps
pub const MIN_ZOOM: u32 = 1;
pub const MAX_ZOOM: u32 = 8;

/// The visible region of the scaled sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Client width in screen pixels
    pub width: f64,
    /// Client height in screen pixels
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// One selected cell. The `(x, y)` origin is the dedup key; the name is
/// user-editable without affecting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub rect: Rect,
}

/// Pointer gesture state. Transitions:
/// `Idle` -> `Panning` | `GridDragging` on press, back to `Idle` on release.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Panning {
        start_x: f64,
        start_y: f64,
        scroll_x: f64,
        scroll_y: f64,
        moved: bool,
    },
    GridDragging {
        start_x: f64,
        start_y: f64,
        offset_x: u32,
        offset_y: u32,
        moved: bool,
    },
}

/// Outcome of a release classified as a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Cell was not selected; it is now
    Selected(String),
    /// Cell was already selected; it no longer is
    Deselected(String),
}

/// One interactive session over a loaded sheet.
#[derive(Debug, Clone)]
pub struct SelectorSession {
    pack_id: String,
    pack_name: String,
    source: String,
    cache_path: Option<String>,
    sheet_path: String,
    sheet_width: u32,
    sheet_height: u32,
    /// Live-editable grid alignment state
    pub grid: GridParams,
    zoom: u32,
    pub viewport: Viewport,
    drag: DragState,
    selections: Vec<Selection>,
}

impl SelectorSession {
    /// Start a session for one of a pack's sheets. Grid parameters seed
    /// from the pack's declared defaults.
    pub fn new(
        pack: &Pack,
        sheet_path: &str,
        sheet_width: u32,
        sheet_height: u32,
        viewport: Viewport,
    ) -> Self {
        let offset = pack.grid_offset.unwrap_or_default();
        Self {
            pack_id: pack.id.clone(),
            pack_name: pack.name.clone(),
            source: pack.source.clone(),
            cache_path: None,
            sheet_path: sheet_path.to_string(),
            sheet_width,
            sheet_height,
            grid: GridParams {
                tile_size: pack.tile_size(),
                spacing: pack.spacing.unwrap_or(0),
                offset_x: offset.x,
                offset_y: offset.y,
            },
            zoom: MIN_ZOOM,
            viewport,
            drag: DragState::Idle,
            selections: Vec::new(),
        }
    }

    /// Record where the extracted pack lives, for the handoff result.
    pub fn set_cache_path(&mut self, path: impl Into<String>) {
        self.cache_path = Some(path.into());
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn sheet_dimensions(&self) -> (u32, u32) {
        (self.sheet_width, self.sheet_height)
    }

    /// Map a viewport-relative pointer position to image-space pixels.
    fn to_image(&self, vx: f64, vy: f64) -> (f64, f64) {
        let z = f64::from(self.zoom);
        (
            (self.viewport.scroll_x + vx) / z,
            (self.viewport.scroll_y + vy) / z,
        )
    }

    /// The tile rectangle under the pointer, for the hover outline.
    /// Only meaningful while no drag is in progress; has no effect on
    /// selection state.
    pub fn hover(&self, vx: f64, vy: f64) -> Option<Rect> {
        if self.drag != DragState::Idle {
            return None;
        }
        let (px, py) = self.to_image(vx, vy);
        Some(pixel_to_rect(px, py, &self.grid))
    }

    /// Pointer press. With `grid_modifier` held the gesture adjusts the
    /// grid offset; otherwise it pans the view.
    pub fn pointer_down(&mut self, vx: f64, vy: f64, grid_modifier: bool) {
        if self.drag != DragState::Idle {
            return;
        }
        self.drag = if grid_modifier {
            DragState::GridDragging {
                start_x: vx,
                start_y: vy,
                offset_x: self.grid.offset_x,
                offset_y: self.grid.offset_y,
                moved: false,
            }
        } else {
            DragState::Panning {
                start_x: vx,
                start_y: vy,
                scroll_x: self.viewport.scroll_x,
                scroll_y: self.viewport.scroll_y,
                moved: false,
            }
        };
    }

    /// Pointer movement while pressed. Pans scroll or live-adjusts the
    /// grid offset (clamped to >= 0 on both axes).
    pub fn pointer_move(&mut self, vx: f64, vy: f64) {
        match &mut self.drag {
            DragState::Idle => {}
            DragState::Panning {
                start_x,
                start_y,
                scroll_x,
                scroll_y,
                moved,
            } => {
                let dx = vx - *start_x;
                let dy = vy - *start_y;
                if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
                    *moved = true;
                }
                self.viewport.scroll_x = *scroll_x - dx;
                self.viewport.scroll_y = *scroll_y - dy;
            }
            DragState::GridDragging {
                start_x,
                start_y,
                offset_x,
                offset_y,
                moved,
            } => {
                let dx = vx - *start_x;
                let dy = vy - *start_y;
                if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
                    *moved = true;
                }
                // Offsets move in image coordinates, not zoomed ones
                let z = f64::from(self.zoom);
                self.grid.offset_x = clamped_offset(*offset_x, dx / z);
                self.grid.offset_y = clamped_offset(*offset_y, dy / z);
            }
        }
    }

    /// Pointer release. A gesture that never crossed the drag threshold is
    /// a click and toggles the cell under the release position.
    pub fn pointer_up(&mut self, vx: f64, vy: f64) -> Option<ClickOutcome> {
        let moved = match self.drag {
            DragState::Idle => return None,
            DragState::Panning { moved, .. } | DragState::GridDragging { moved, .. } => moved,
        };
        self.drag = DragState::Idle;

        if moved {
            return None;
        }
        let (px, py) = self.to_image(vx, vy);
        Some(self.toggle_cell(px, py))
    }

    /// Toggle membership of the cell containing the image-space point,
    /// keyed by exact cell origin.
    fn toggle_cell(&mut self, px: f64, py: f64) -> ClickOutcome {
        let rect = pixel_to_rect(px, py, &self.grid);
        if let Some(idx) = self
            .selections
            .iter()
            .position(|s| s.rect.x == rect.x && s.rect.y == rect.y)
        {
            let removed = self.selections.remove(idx);
            ClickOutcome::Deselected(removed.name)
        } else {
            let name = format!("sprite-{}-{}", rect.x, rect.y);
            self.selections.push(Selection {
                name: name.clone(),
                rect,
            });
            ClickOutcome::Selected(name)
        }
    }

    /// Rename a selection. The cell key `(x, y)` is unaffected.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.selections.iter_mut().find(|s| s.name == old) {
            Some(sel) => {
                sel.name = new.into();
                true
            }
            None => false,
        }
    }

    /// Remove a selection by name (the sidebar's remove button).
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.selections.len();
        self.selections.retain(|s| s.name != name);
        self.selections.len() != before
    }

    /// Drop all selections.
    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + 1);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom.saturating_sub(1));
    }

    /// Change zoom, keeping the image-space point at the viewport center
    /// fixed on screen. Values outside `[MIN_ZOOM, MAX_ZOOM]` are ignored.
    /// Stored sprite rectangles are never affected by zoom.
    pub fn set_zoom(&mut self, zoom: u32) {
        if zoom < MIN_ZOOM || zoom > MAX_ZOOM || zoom == self.zoom {
            return;
        }
        let old = f64::from(self.zoom);
        let center_x = (self.viewport.scroll_x + self.viewport.width / 2.0) / old;
        let center_y = (self.viewport.scroll_y + self.viewport.height / 2.0) / old;

        self.zoom = zoom;

        let new = f64::from(zoom);
        self.viewport.scroll_x = center_x * new - self.viewport.width / 2.0;
        self.viewport.scroll_y = center_y * new - self.viewport.height / 2.0;
    }

    /// The image-space point currently at the viewport's visual center.
    pub fn view_center(&self) -> (f64, f64) {
        let z = f64::from(self.zoom);
        (
            (self.viewport.scroll_x + self.viewport.width / 2.0) / z,
            (self.viewport.scroll_y + self.viewport.height / 2.0) / z,
        )
    }

    /// Serialize the session into its handoff result and deliver it
    /// through the transport. The session ends here.
    pub fn copy_and_close(self, sink: &mut dyn ResultSink) -> io::Result<SelectionResult> {
        let mut sprites = IndexMap::with_capacity(self.selections.len());
        for sel in &self.selections {
            sprites.insert(sel.name.clone(), sel.rect);
        }

        let result = SelectionResult {
            pack_id: self.pack_id,
            pack_name: self.pack_name,
            source: self.source,
            sheet_path: self.sheet_path,
            sheet_width: self.sheet_width,
            sheet_height: self.sheet_height,
            tile_size: self.grid.tile_size,
            spacing: self.grid.spacing,
            grid_offset: GridOffset {
                x: self.grid.offset_x,
                y: self.grid.offset_y,
            },
            sprites,
            cache_path: self.cache_path,
        };
        sink.submit(&result)?;
        Ok(result)
    }
}

fn clamped_offset(base: u32, delta: f64) -> u32 {
    let moved = i64::from(base) + delta.round() as i64;
    moved.max(0) as u32
}

/// The serialized outcome of a session: pack identity, sheet identity,
/// grid parameters, and the named selection rectangles.
///
/// Field names are a stable contract for downstream tooling.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub pack_id: String,
    pub pack_name: String,
    pub source: String,
    pub sheet_path: String,
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub tile_size: u32,
    pub spacing: u32,
    pub grid_offset: GridOffset,
    pub sprites: IndexMap<String, Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
}

/// Transport for the final selection result (clipboard, stdout, file,
/// IPC - whatever invoked the session decides).
pub trait ResultSink {
    fn submit(&mut self, result: &SelectionResult) -> io::Result<()>;
}

/// Writes the result as pretty-printed JSON to any writer.
pub struct JsonWriter<W: Write>(pub W);

impl<W: Write> ResultSink for JsonWriter<W> {
    fn submit(&mut self, result: &SelectionResult) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.0, result)?;
        self.0.write_all(b"\n")?;
        self.0.flush()
    }
}
