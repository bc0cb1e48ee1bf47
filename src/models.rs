//! Data models for sprite packs (frames, sprite definitions, pack documents)
//!
//! A pack is a JSON document declaring where each named sprite lives on a
//! sheet image. Sprite definitions come in two shapes: a single rectangle
//! (static) or an ordered frame sequence (animated). Both expose the same
//! "enumerate frames" surface, so callers never match on the variant except
//! when constructing one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;

use crate::grid::Rect;

/// Error type for sprite definition access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SpriteError {
    /// Frame index outside `[0, frame_count)`
    #[error("frame index {index} out of range (sprite has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
}

/// One rectangle on a sheet. `w`/`h` default to the pack's tile size when
/// unspecified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteFrame {
    pub x: i64,
    pub y: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub h: Option<u32>,
}

impl SpriteFrame {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            w: None,
            h: None,
        }
    }

    /// The frame's rectangle with missing dimensions filled in from the
    /// given tile size. The frame itself is never mutated.
    pub fn effective_rect(&self, tile_size: u32) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w.unwrap_or(tile_size),
            h: self.h.unwrap_or(tile_size),
        }
    }
}

/// A static sprite: a single rectangle, optionally naming its source file
/// when the pack has multiple sheets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticSprite {
    pub x: i64,
    pub y: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
}

/// An animated sprite: an ordered frame sequence plus optional playback
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimatedSprite {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
    pub frames: Vec<SpriteFrame>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub r#loop: Option<bool>,
}

/// A sprite definition - static rectangle or animated frame sequence.
///
/// Untagged: the presence of a `frames` array distinguishes the variants
/// on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpriteDef {
    Animated(AnimatedSprite),
    Static(StaticSprite),
}

impl SpriteDef {
    /// Number of frames: exactly 1 for a static sprite, the sequence
    /// length for an animated one.
    pub fn frame_count(&self) -> usize {
        match self {
            SpriteDef::Static(_) => 1,
            SpriteDef::Animated(a) => a.frames.len(),
        }
    }

    /// The frame at `index`.
    pub fn frame_at(&self, index: usize) -> Result<SpriteFrame, SpriteError> {
        self.frames().nth(index).ok_or(SpriteError::FrameOutOfRange {
            index,
            count: self.frame_count(),
        })
    }

    /// Enumerate frames in order. A static sprite yields exactly one.
    pub fn frames(&self) -> impl Iterator<Item = SpriteFrame> + '_ {
        let (single, many) = match self {
            SpriteDef::Static(s) => (
                Some(SpriteFrame {
                    x: s.x,
                    y: s.y,
                    w: s.w,
                    h: s.h,
                }),
                &[][..],
            ),
            SpriteDef::Animated(a) => (None, a.frames.as_slice()),
        };
        single.into_iter().chain(many.iter().copied())
    }

    /// The first frame, used for single-cell previews. `None` only for an
    /// animated sprite with an empty frame list (structurally invalid).
    pub fn first_frame(&self) -> Option<SpriteFrame> {
        self.frames().next()
    }

    /// Source file override, when the pack has multiple sheets.
    pub fn file(&self) -> Option<&str> {
        match self {
            SpriteDef::Static(s) => s.file.as_deref(),
            SpriteDef::Animated(a) => a.file.as_deref(),
        }
    }
}

/// Grid origin offset declared on a pack.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridOffset {
    pub x: u32,
    pub y: u32,
}

/// A sprite pack definition: identifying metadata plus the sprite mapping.
///
/// `sprites` is an [`IndexMap`] because declaration order is meaningful:
/// the diagnostic preview lays out the first 64 sprites in this order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub license: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tile_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spacing: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub grid_offset: Option<GridOffset>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary_sheet: Option<String>,
    #[serde(default)]
    pub sprites: IndexMap<String, SpriteDef>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tags: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<HashMap<String, Value>>,
}

/// Tile size assumed when a pack declares none.
pub const DEFAULT_TILE_SIZE: u32 = 16;

impl Pack {
    /// Parse a pack definition from a JSON string.
    pub fn from_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Parse a pack definition from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// The tile size used for frames that omit `w`/`h`.
    pub fn tile_size(&self) -> u32 {
        self.tile_size.unwrap_or(DEFAULT_TILE_SIZE)
    }

    /// Structural validation: required identifying fields plus at least one
    /// sprite definition. Returns one message per missing field.
    pub fn structural_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push("Missing 'id' field".to_string());
        }
        if self.name.is_empty() {
            errors.push("Missing 'name' field".to_string());
        }
        if self.download_url.is_empty() {
            errors.push("Missing 'downloadUrl' field".to_string());
        }
        if self.sprites.is_empty() {
            errors.push("No sprites defined".to_string());
        }
        errors
    }
}
