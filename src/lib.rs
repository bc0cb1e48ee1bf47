//! spritepack - grid addressing and verification engine for sprite sheet
//! asset packs
//!
//! This library provides functionality to:
//! - Map between pixel coordinates and a tile grid with offset and spacing
//! - Model single-frame and multi-frame sprite definitions in packs
//! - Verify declared sprite coordinates against real sheet dimensions and
//!   render a diagnostic preview
//! - Drive an interactive click/drag/zoom selection session over a sheet

pub mod cli;
pub mod grid;
pub mod models;
pub mod output;
pub mod preview;
pub mod selector;
pub mod sheet;
pub mod verify;
