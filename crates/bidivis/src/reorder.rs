#![forbid(unsafe_code)]

//! Line-level resolution and reordering (L1, L2).
//!
//! The caller supplies line breaks computed after shaping; each line gets a
//! fresh level buffer with the L1 whitespace reset applied, then L2 reverses
//! sub-slices from the highest level down to the line's lowest odd level.
//! Concatenating the per-line permutations yields the visual order.
//!
//! # Example
//! ```
//! use bidivis::{ParagraphDirection, reorder, reorder_lines};
//!
//! assert_eq!(reorder("abc", ParagraphDirection::Auto), "abc");
//! assert_eq!(
//!     reorder("abc \u{05D0}\u{05D1}\u{05D2}", ParagraphDirection::Auto),
//!     "abc \u{05D2}\u{05D1}\u{05D0}",
//! );
//!
//! // Two lines, broken after the fourth character.
//! let out = reorder_lines("abcd\u{05D0}\u{05D1}", ParagraphDirection::Auto, &[4]).unwrap();
//! assert_eq!(out, "abcd\u{05D1}\u{05D0}");
//! ```

use crate::class::BidiClass;
use crate::paragraph::{BidiParagraph, Level, ParagraphDirection, has_rtl, invert_permutation};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Programmer errors in caller-supplied line breaks.
///
/// The algorithm itself is total; only malformed break positions are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderError {
    /// A break position does not strictly increase over its predecessor.
    BreaksNotMonotonic {
        /// Index of the offending entry in the break array.
        index: usize,
        /// The offending break position.
        value: usize,
    },
    /// A break position lies outside `1..=len`.
    BreakOutOfRange {
        /// The offending break position.
        value: usize,
        /// Paragraph length in characters.
        len: usize,
    },
}

impl std::fmt::Display for ReorderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BreaksNotMonotonic { index, value } => {
                write!(
                    f,
                    "line break {} at index {} is not strictly increasing",
                    value, index
                )
            }
            Self::BreakOutOfRange { value, len } => {
                write!(
                    f,
                    "line break {} exceeds paragraph length {}",
                    value, len
                )
            }
        }
    }
}

impl std::error::Error for ReorderError {}

fn validate_breaks(breaks: &[usize], len: usize) -> Result<(), ReorderError> {
    let mut prev = 0;
    for (index, &value) in breaks.iter().enumerate() {
        if value > len {
            return Err(ReorderError::BreakOutOfRange { value, len });
        }
        if value <= prev {
            return Err(ReorderError::BreaksNotMonotonic { index, value });
        }
        prev = value;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// L1: line-level whitespace reset
// ---------------------------------------------------------------------------

#[inline]
fn resets_at_line_end(class: BidiClass) -> bool {
    class == BidiClass::WS || class.is_isolate_initiator() || class == BidiClass::PDI
}

/// Rule L1 over one line: copy `levels[start..end]` into a fresh buffer and
/// force segment/paragraph separators, plus trailing whitespace and isolate
/// formatting runs, back to the paragraph level.
///
/// The reset tests ORIGINAL classes from the classifier, not resolved ones.
/// BN-like characters inside a trailing run are stepped over without
/// terminating it and keep their own levels.
pub(crate) fn line_levels(
    levels: &[Level],
    original: &[BidiClass],
    paragraph_level: Level,
    start: usize,
    end: usize,
) -> Vec<Level> {
    let mut out = levels[start..end].to_vec();
    for i in 0..out.len() {
        let class = original[start + i];
        if matches!(class, BidiClass::S | BidiClass::B) {
            out[i] = paragraph_level;
            let mut j = i;
            while j > 0 {
                j -= 1;
                let c = original[start + j];
                if c.is_removed_by_x9() {
                    continue;
                }
                if resets_at_line_end(c) {
                    out[j] = paragraph_level;
                } else {
                    break;
                }
            }
        }
    }
    let mut j = out.len();
    while j > 0 {
        j -= 1;
        let c = original[start + j];
        if c.is_removed_by_x9() {
            continue;
        }
        if resets_at_line_end(c) {
            out[j] = paragraph_level;
        } else {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// L2: reordering
// ---------------------------------------------------------------------------

/// Rule L2: compute the visual ordering of one line from its levels.
///
/// From the highest level found on the line down to its lowest odd level,
/// reverse every maximal contiguous slice of characters at that level or
/// higher. Lines without an odd level come out in logical order.
pub(crate) fn visual_order_line(levels: &[Level]) -> Vec<usize> {
    let n = levels.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();

    let max_level = levels.iter().copied().max().unwrap_or(0);
    let min_odd_level = levels
        .iter()
        .copied()
        .filter(|l| l % 2 == 1)
        .min()
        .unwrap_or(max_level + 1); // no odd levels: skip the loop

    for level in (min_odd_level..=max_level).rev() {
        let mut i = 0;
        while i < n {
            if levels[order[i]] >= level {
                let start = i;
                while i < n && levels[order[i]] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
    }

    order
}

// ---------------------------------------------------------------------------
// Lines over a paragraph
// ---------------------------------------------------------------------------

impl BidiParagraph {
    /// Visual-order permutation over caller-supplied lines.
    ///
    /// `line_breaks` holds exclusive line-end positions in strictly
    /// increasing order; a missing final break at the paragraph end is
    /// supplied implicitly. The returned permutation maps visual position →
    /// logical position across the whole paragraph, line by line.
    pub fn visual_order_lines(&self, line_breaks: &[usize]) -> Result<Vec<usize>, ReorderError> {
        let len = self.len();
        validate_breaks(line_breaks, len)?;
        tracing::trace!(len, lines = line_breaks.len().max(1), "reordering lines");

        let mut order = Vec::with_capacity(len);
        let mut start = 0;
        let mut push_line = |start: usize, end: usize, order: &mut Vec<usize>| {
            let line = line_levels(
                self.levels(),
                self.original_classes(),
                self.paragraph_level(),
                start,
                end,
            );
            order.extend(visual_order_line(&line).into_iter().map(|i| start + i));
        };
        for &end in line_breaks {
            push_line(start, end, &mut order);
            start = end;
        }
        if start < len {
            push_line(start, len, &mut order);
        }
        Ok(order)
    }

    /// Inverse of [`visual_order_lines`](Self::visual_order_lines).
    pub fn logical_order_lines(&self, line_breaks: &[usize]) -> Result<Vec<usize>, ReorderError> {
        Ok(invert_permutation(&self.visual_order_lines(line_breaks)?))
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Reorder a paragraph of logical-order text into visual order as a single
/// line.
///
/// Characters are rearranged so that rendering the result strictly
/// left-to-right displays mixed-direction content correctly. The output is
/// a permutation of the input; explicit formatting characters are kept in
/// place rather than stripped.
#[must_use]
pub fn reorder(text: &str, direction: ParagraphDirection) -> String {
    if text.is_empty() {
        return String::new();
    }
    // Without any RTL-forcing class and with a non-RTL base, no odd level
    // can arise, so the visual order is the logical order.
    if direction != ParagraphDirection::Rtl && !has_rtl(text) {
        return text.to_string();
    }
    BidiParagraph::new(text, direction.forced_direction()).visual_string()
}

/// Reorder a paragraph laid out over several lines.
///
/// `line_breaks` holds exclusive line-end character positions, strictly
/// increasing; the final break at the paragraph end may be omitted. Line
/// breaks are the caller's: compute them after shaping and justification.
pub fn reorder_lines(
    text: &str,
    direction: ParagraphDirection,
    line_breaks: &[usize],
) -> Result<String, ReorderError> {
    let para = BidiParagraph::new(text, direction.forced_direction());
    let order = para.visual_order_lines(line_breaks)?;
    Ok(order.iter().filter_map(|&i| para.chars().get(i)).collect())
}

// ===========================================================================
// Tests
// ===========================================================================
