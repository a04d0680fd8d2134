//! # Darkroom
//!
//! Batch preparation of photographs for a portfolio site. Originals are
//! sorted into category directories; darkroom resizes each one, stamps a
//! translucent watermark on it, and publishes a web-ready JPEG next to its
//! siblings:
//!
//! ```text
//! public/photography/originals/nature/IMG_2610.JPG  ─►  public/photography/IMG_2610.jpg
//! public/photography/originals/cars/R6__5123.tiff   ─►  public/photography/R6__5123.jpg
//! ```
//!
//! # Architecture
//!
//! ```text
//! batch      walk categories, collect per-file results, summarize
//!   └─ process   probe → classify → plan → render → publish (one file)
//!        ├─ imaging   pure math + ImageBackend (decode, resize, watermark, encode)
//!        └─ publish   temp file + rename, .backup copies
//! ```
//!
//! Per-file failures never stop a batch: every file ends up either published
//! or reported, and a published destination is only ever replaced by a
//! complete file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Category discovery, per-file loop, summary counts, progress events |
//! | [`process`] | The per-image pipeline and in-place rotation |
//! | [`imaging`] | Orientation, aspect ratio, resize planning, watermark layout, [`imaging::RustBackend`] |
//! | [`publish`] | Atomic file replacement and backups |
//! | [`manifest`] | Draft gallery records for published photos |
//! | [`config`] | `darkroom.toml` loading, merging with defaults, validation |
//! | [`naming`] | Published file names and display titles |
//! | [`output`] | CLI output formatting |
//! | [`types`] | `Orientation` and `Dimensions` |
//!
//! # Design Decisions
//!
//! ## One Encode Per Image
//!
//! Resizing and watermarking happen on the decoded pixels in memory; the JPEG
//! is encoded exactly once, after compositing. There is no intermediate file
//! and no second generation of compression loss.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate, text rendering uses
//! `imageproc` with an `ab_glyph` font. No system image libraries are needed;
//! only a TrueType font for the watermark, found on the system or named in
//! the config.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod process;
pub mod publish;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
