#![forbid(unsafe_code)]

//! Paragraph analysis.
//!
//! [`BidiParagraph`] runs the full resolution pipeline over one paragraph in
//! logical order and precomputes visual↔logical index maps for the common
//! single-line case. All indices are in character space (Unicode scalar
//! values), not byte offsets.
//!
//! # Example
//! ```
//! use bidivis::{BidiParagraph, Direction};
//!
//! let para = BidiParagraph::new("abc \u{05D0}\u{05D1}\u{05D2}", None);
//! assert_eq!(para.base_direction(), Direction::Ltr);
//! assert_eq!(para.visual_string(), "abc \u{05D2}\u{05D1}\u{05D0}");
//! ```

use crate::class::{BidiClass, bidi_class};
use crate::explicit::{IsolatePairs, first_strong_level, neutralize_formatting, resolve_explicit};
use crate::reorder::{line_levels, visual_order_line};
use crate::resolve::resolve_sequence;
use crate::runs::isolating_run_sequences;

/// Embedding level: an integer in `0..=125`. Even levels read left-to-right,
/// odd levels right-to-left.
pub type Level = u8;

// ---------------------------------------------------------------------------
// Direction / ParagraphDirection
// ---------------------------------------------------------------------------

/// Text flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left-to-right.
    Ltr,
    /// Right-to-left.
    Rtl,
}

/// Paragraph base direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphDirection {
    /// Auto-detect from the first strong directional character (rules P2/P3).
    #[default]
    Auto,
    /// Force paragraph level 0.
    Ltr,
    /// Force paragraph level 1.
    Rtl,
}

impl ParagraphDirection {
    #[inline]
    pub(crate) fn forced_direction(self) -> Option<Direction> {
        match self {
            Self::Auto => None,
            Self::Ltr => Some(Direction::Ltr),
            Self::Rtl => Some(Direction::Rtl),
        }
    }
}

// ---------------------------------------------------------------------------
// BidiRun
// ---------------------------------------------------------------------------

/// A contiguous run of characters sharing the same resolved level.
///
/// Indices are in logical character space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidiRun {
    /// Start index (inclusive) in logical character space.
    pub start: usize,
    /// End index (exclusive) in logical character space.
    pub end: usize,
    /// Resolved embedding level of this run.
    pub level: Level,
    /// Effective direction of this run.
    pub direction: Direction,
}

impl BidiRun {
    /// Number of characters in this run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the run is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ---------------------------------------------------------------------------
// BidiParagraph
// ---------------------------------------------------------------------------

/// Resolved bidi analysis for one paragraph with precomputed index maps.
///
/// The [`visual_to_logical`](Self::visual_to_logical) and
/// [`logical_to_visual`](Self::logical_to_visual) maps cover the whole
/// paragraph laid out as a single line; use
/// [`crate::reorder_lines`] when the caller supplies line breaks.
#[derive(Debug, Clone)]
pub struct BidiParagraph {
    text: String,
    chars: Vec<char>,
    original_classes: Vec<BidiClass>,
    levels: Vec<Level>,
    paragraph_level: Level,
    runs: Vec<BidiRun>,
    visual_to_logical: Vec<usize>,
    logical_to_visual: Vec<usize>,
}

impl BidiParagraph {
    /// Analyze `text` and build precomputed index maps.
    ///
    /// `base` optionally forces the paragraph direction; `None` uses
    /// first-strong auto-detection.
    #[must_use]
    pub fn new(text: &str, base: Option<Direction>) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let original_classes: Vec<BidiClass> = chars.iter().map(|&c| bidi_class(c)).collect();

        let pairs = IsolatePairs::scan(&original_classes);
        let paragraph_level = match base {
            Some(Direction::Ltr) => 0,
            Some(Direction::Rtl) => 1,
            None => first_strong_level(&original_classes, 0, n, &pairs),
        };

        let mut types = original_classes.clone();
        let mut levels = resolve_explicit(&mut types, &pairs, paragraph_level);
        neutralize_formatting(&mut types);

        let sequences = isolating_run_sequences(&levels, &original_classes, &pairs, paragraph_level);
        for seq in &sequences {
            resolve_sequence(seq, &mut types, &mut levels, &chars, &original_classes);
        }
        tracing::trace!(
            len = n,
            paragraph_level,
            sequences = sequences.len(),
            "paragraph analyzed"
        );

        // Single-line maps: L1 then L2 over the whole paragraph.
        let single_line = line_levels(&levels, &original_classes, paragraph_level, 0, n);
        let visual_to_logical = visual_order_line(&single_line);
        let logical_to_visual = invert_permutation(&visual_to_logical);
        let runs = compute_runs(&levels);

        Self {
            text: text.to_string(),
            chars,
            original_classes,
            levels,
            paragraph_level,
            runs,
            visual_to_logical,
            logical_to_visual,
        }
    }

    /// The original text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Characters in logical order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Per-character resolved levels (after the implicit rules, before any
    /// line-end whitespace reset).
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Classifier output for each character, untouched by resolution.
    #[must_use]
    pub fn original_classes(&self) -> &[BidiClass] {
        &self.original_classes
    }

    /// The paragraph embedding level, 0 or 1.
    #[must_use]
    pub fn paragraph_level(&self) -> Level {
        self.paragraph_level
    }

    /// The paragraph base direction.
    #[must_use]
    pub fn base_direction(&self) -> Direction {
        if self.paragraph_level % 2 == 0 {
            Direction::Ltr
        } else {
            Direction::Rtl
        }
    }

    /// Contiguous equal-level runs in logical order.
    #[must_use]
    pub fn runs(&self) -> &[BidiRun] {
        &self.runs
    }

    /// Permutation mapping visual position → logical position for the whole
    /// paragraph as a single line.
    #[must_use]
    pub fn visual_to_logical(&self) -> &[usize] {
        &self.visual_to_logical
    }

    /// Inverse permutation mapping logical position → visual position.
    #[must_use]
    pub fn logical_to_visual(&self) -> &[usize] {
        &self.logical_to_visual
    }

    /// Get the visual position corresponding to a logical character index.
    #[must_use]
    pub fn visual_pos(&self, logical: usize) -> usize {
        self.logical_to_visual
            .get(logical)
            .copied()
            .unwrap_or(logical)
    }

    /// Get the logical position corresponding to a visual column index.
    #[must_use]
    pub fn logical_pos(&self, visual: usize) -> usize {
        self.visual_to_logical
            .get(visual)
            .copied()
            .unwrap_or(visual)
    }

    /// Check if the character at `logical` index resolved to an RTL level.
    #[must_use]
    pub fn is_rtl(&self, logical: usize) -> bool {
        self.levels.get(logical).is_some_and(|level| level % 2 == 1)
    }

    /// Move cursor one step to the right in visual order.
    ///
    /// Returns the new logical index, or the current one when already at the
    /// rightmost position.
    #[must_use]
    pub fn move_right(&self, logical: usize) -> usize {
        let visual = self.visual_pos(logical);
        if visual + 1 < self.visual_to_logical.len() {
            self.logical_pos(visual + 1)
        } else {
            logical
        }
    }

    /// Move cursor one step to the left in visual order.
    ///
    /// Returns the new logical index, or the current one when already at the
    /// leftmost position.
    #[must_use]
    pub fn move_left(&self, logical: usize) -> usize {
        let visual = self.visual_pos(logical);
        if visual > 0 {
            self.logical_pos(visual - 1)
        } else {
            logical
        }
    }

    /// Number of characters in the paragraph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the paragraph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Get the character at a visual position.
    #[must_use]
    pub fn char_at_visual(&self, visual: usize) -> Option<char> {
        self.visual_to_logical
            .get(visual)
            .and_then(|&logical| self.chars.get(logical))
            .copied()
    }

    /// Build the visually reordered string for the whole paragraph.
    #[must_use]
    pub fn visual_string(&self) -> String {
        self.visual_to_logical
            .iter()
            .filter_map(|&logical| self.chars.get(logical))
            .collect()
    }
}

/// Group consecutive characters with the same level into runs.
fn compute_runs(levels: &[Level]) -> Vec<BidiRun> {
    let mut runs = Vec::new();
    if levels.is_empty() {
        return runs;
    }
    let mut start = 0;
    let mut current = levels[0];
    for (i, &level) in levels.iter().enumerate().skip(1) {
        if level != current {
            runs.push(run_record(start, i, current));
            start = i;
            current = level;
        }
    }
    runs.push(run_record(start, levels.len(), current));
    runs
}

fn run_record(start: usize, end: usize, level: Level) -> BidiRun {
    BidiRun {
        start,
        end,
        level,
        direction: if level % 2 == 1 {
            Direction::Rtl
        } else {
            Direction::Ltr
        },
    }
}

/// Invert a permutation: if `perm[visual] == logical`, produce a map where
/// `inverse[logical] == visual`.
pub(crate) fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (visual, &logical) in perm.iter().enumerate() {
        inverse[logical] = visual;
    }
    inverse
}

// ---------------------------------------------------------------------------
// Standalone probes
// ---------------------------------------------------------------------------

/// Returns `true` if the text contains any character whose class can force
/// right-to-left behavior.
///
/// This is a cheap pre-scan to skip full analysis on pure-LTR text.
#[must_use]
pub fn has_rtl(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            bidi_class(c),
            BidiClass::R | BidiClass::AL | BidiClass::AN | BidiClass::RLE | BidiClass::RLO | BidiClass::RLI
        )
    })
}

/// Returns the detected base direction of the text (rules P2/P3).
#[must_use]
pub fn paragraph_level(text: &str) -> ParagraphDirection {
    let classes: Vec<BidiClass> = text.chars().map(bidi_class).collect();
    let pairs = IsolatePairs::scan(&classes);
    if first_strong_level(&classes, 0, classes.len(), &pairs) == 1 {
        ParagraphDirection::Rtl
    } else {
        ParagraphDirection::Ltr
    }
}

/// Resolve the per-character embedding levels of `text` without reordering.
///
/// Levels are per Unicode scalar value. Even levels are LTR, odd are RTL.
#[must_use]
pub fn resolve_levels(text: &str, direction: ParagraphDirection) -> Vec<Level> {
    BidiParagraph::new(text, direction.forced_direction())
        .levels()
        .to_vec()
}

// ===========================================================================
// Tests
// ===========================================================================
