#![forbid(unsafe_code)]

//! Unicode Bidirectional Algorithm engine for left-to-right renderers.
//!
//! This crate transforms a paragraph of text in logical (memory) order into
//! the visual order a strictly left-to-right renderer should draw, running
//! the full resolution pipeline: classification, isolate matching, explicit
//! levels, weak/neutral/implicit rules, and line reordering.
//!
//! - [`reorder`] / [`reorder_lines`] - logical order in, visual order out
//! - [`BidiParagraph`] - precomputed analysis with O(1) visual↔logical
//!   mapping and cursor movement
//! - [`BidiRun`] - a contiguous run of characters sharing one level
//! - [`Direction`] / [`ParagraphDirection`] - base-direction control
//! - [`ReorderCache`] - LRU cache for repeated strings
//! - [`BidiClass`] / [`bidi_class`] - per-character classification
//!
//! The output is always a permutation of the input scalar values: explicit
//! formatting characters stay in the output, and glyph mirroring, shaping,
//! and line-break computation belong to the caller.
//!
//! # Example
//! ```
//! use bidivis::{BidiParagraph, ParagraphDirection, reorder};
//!
//! // Pure LTR text passes through unchanged.
//! assert_eq!(reorder("Hello, world!", ParagraphDirection::Auto), "Hello, world!");
//!
//! // Hebrew reverses for display.
//! assert_eq!(
//!     reorder("abc \u{05D0}\u{05D1}\u{05D2}", ParagraphDirection::Auto),
//!     "abc \u{05D2}\u{05D1}\u{05D0}",
//! );
//!
//! // BidiParagraph exposes the underlying analysis.
//! let para = BidiParagraph::new("abc", None);
//! assert_eq!(para.levels(), &[0, 0, 0]);
//! assert_eq!(para.visual_pos(0), 0);
//! ```

pub mod cache;
pub mod class;
mod explicit;
pub mod paragraph;
pub mod reorder;
mod resolve;
mod runs;
mod tables;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, ReorderCache};
pub use class::{BidiClass, bidi_class, classify};
pub use explicit::MAX_DEPTH;
pub use paragraph::{
    BidiParagraph, BidiRun, Direction, Level, ParagraphDirection, has_rtl, paragraph_level,
    resolve_levels,
};
pub use reorder::{ReorderError, reorder, reorder_lines};
