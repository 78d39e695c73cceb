#![forbid(unsafe_code)]

//! Explicit level resolution.
//!
//! Covers the front half of the pipeline: isolate pair matching (BD9),
//! paragraph level detection (P2/P3), the directional status stack machine
//! (X1–X8), and the X9 rewrite of embedding and override controls to BN.

use crate::class::BidiClass;
use smallvec::SmallVec;

/// Maximum embedding level. Levels are always in `0..=MAX_DEPTH`.
pub const MAX_DEPTH: u8 = 125;

/// Stack capacity: one frame per level plus the initial frame and one
/// in-flight push.
const STACK_CAPACITY: usize = MAX_DEPTH as usize + 2;

// ---------------------------------------------------------------------------
// Isolate pair matching (BD9)
// ---------------------------------------------------------------------------

/// Precomputed isolate initiator ↔ PDI correspondence for one paragraph.
#[derive(Debug, Clone)]
pub(crate) struct IsolatePairs {
    /// For an isolate initiator at `i`, the index of its matching PDI, or
    /// the paragraph length when the paragraph ends first. Slots at
    /// non-initiator positions are never read.
    pdi_of: Vec<usize>,
    /// For a PDI at `j`, the initiator it matches, if any.
    initiator_of: Vec<Option<usize>>,
    len: usize,
}

impl IsolatePairs {
    /// Single left-to-right scan pairing initiators with PDIs.
    pub(crate) fn scan(types: &[BidiClass]) -> Self {
        let len = types.len();
        let mut pdi_of = vec![len; len];
        let mut initiator_of = vec![None; len];
        let mut open: SmallVec<[usize; 16]> = SmallVec::new();
        for (i, &t) in types.iter().enumerate() {
            if t.is_isolate_initiator() {
                open.push(i);
            } else if t == BidiClass::PDI
                && let Some(initiator) = open.pop()
            {
                pdi_of[initiator] = i;
                initiator_of[i] = Some(initiator);
            }
        }
        Self {
            pdi_of,
            initiator_of,
            len,
        }
    }

    /// Index of the matching PDI for the initiator at `i`, or the paragraph
    /// length when there is none.
    #[inline]
    pub(crate) fn matching_pdi(&self, i: usize) -> usize {
        self.pdi_of[i]
    }

    /// Whether the initiator at `i` has a matching PDI.
    #[inline]
    pub(crate) fn has_matching_pdi(&self, i: usize) -> bool {
        self.pdi_of[i] < self.len
    }

    /// The initiator matched by the PDI at `j`, if any.
    #[inline]
    pub(crate) fn matching_initiator(&self, j: usize) -> Option<usize> {
        self.initiator_of[j]
    }
}

// ---------------------------------------------------------------------------
// Paragraph level (P2, P3)
// ---------------------------------------------------------------------------

/// First-strong scan over `types[start..end]`, skipping isolates.
///
/// Returns 1 when the first strong class outside any isolate is R or AL,
/// 0 when it is L or when nothing strong is found. Rule X5c reuses this on
/// the interior of an FSI to pick its direction.
pub(crate) fn first_strong_level(
    types: &[BidiClass],
    start: usize,
    end: usize,
    pairs: &IsolatePairs,
) -> u8 {
    let mut i = start;
    while i < end {
        match types[i] {
            BidiClass::L => return 0,
            BidiClass::R | BidiClass::AL => return 1,
            t if t.is_isolate_initiator() => {
                // The matching PDI itself is not strong; land on it and let
                // the next iteration step past.
                i = pairs.matching_pdi(i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Directional status stack (X1-X8)
// ---------------------------------------------------------------------------

/// One entry of the directional status stack.
#[derive(Debug, Clone, Copy)]
struct DirectionalStatus {
    level: u8,
    /// Active override: L, R, or ON for neutral.
    override_status: BidiClass,
    isolate: bool,
}

#[derive(Debug)]
struct StatusStack {
    frames: SmallVec<[DirectionalStatus; STACK_CAPACITY]>,
}

impl StatusStack {
    fn new(paragraph_level: u8) -> Self {
        let mut frames = SmallVec::new();
        frames.push(DirectionalStatus {
            level: paragraph_level,
            override_status: BidiClass::ON,
            isolate: false,
        });
        Self { frames }
    }

    #[inline]
    fn top(&self) -> DirectionalStatus {
        self.frames[self.frames.len() - 1]
    }

    #[inline]
    fn push(&mut self, level: u8, override_status: BidiClass, isolate: bool) {
        self.frames.push(DirectionalStatus {
            level,
            override_status,
            isolate,
        });
    }

    #[inline]
    fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Rule X8: drop everything back to the initial frame.
    fn reset(&mut self, paragraph_level: u8) {
        self.frames.truncate(1);
        self.frames[0] = DirectionalStatus {
            level: paragraph_level,
            override_status: BidiClass::ON,
            isolate: false,
        };
    }
}

/// Run rules X1-X8, assigning a level to every character and rewriting
/// classes under an active override. Returns the level array.
///
/// Isolate initiators, PDIs, and PDF/embedding codes all take the level of
/// the frame active when they are scanned, so every slot of the result is
/// initialized.
pub(crate) fn resolve_explicit(
    types: &mut [BidiClass],
    pairs: &IsolatePairs,
    paragraph_level: u8,
) -> Vec<u8> {
    let len = types.len();
    let mut levels = vec![paragraph_level; len];
    let mut stack = StatusStack::new(paragraph_level);
    let mut overflow_isolate = 0usize;
    let mut overflow_embedding = 0usize;
    let mut valid_isolate = 0usize;

    for i in 0..len {
        let class = types[i];
        match class {
            BidiClass::RLE
            | BidiClass::LRE
            | BidiClass::RLO
            | BidiClass::LRO
            | BidiClass::RLI
            | BidiClass::LRI
            | BidiClass::FSI => {
                let top = stack.top();
                let is_isolate = class.is_isolate_initiator();
                levels[i] = top.level;
                if is_isolate && top.override_status != BidiClass::ON {
                    types[i] = top.override_status;
                }
                let rtl = match class {
                    BidiClass::RLE | BidiClass::RLO | BidiClass::RLI => true,
                    // X5c: the first strong class inside the FSI decides.
                    BidiClass::FSI => {
                        first_strong_level(types, i + 1, pairs.matching_pdi(i), pairs) == 1
                    }
                    _ => false,
                };
                let new_level = if rtl {
                    (top.level + 1) | 1
                } else {
                    (top.level + 2) & !1
                };
                if new_level <= MAX_DEPTH && overflow_isolate == 0 && overflow_embedding == 0 {
                    if is_isolate {
                        valid_isolate += 1;
                    }
                    let override_status = match class {
                        BidiClass::RLO => BidiClass::R,
                        BidiClass::LRO => BidiClass::L,
                        _ => BidiClass::ON,
                    };
                    stack.push(new_level, override_status, is_isolate);
                } else if is_isolate {
                    overflow_isolate += 1;
                } else if overflow_isolate == 0 {
                    overflow_embedding += 1;
                }
            }
            // X6a
            BidiClass::PDI => {
                if overflow_isolate > 0 {
                    overflow_isolate -= 1;
                } else if valid_isolate > 0 {
                    overflow_embedding = 0;
                    while !stack.top().isolate {
                        stack.pop();
                    }
                    stack.pop();
                    valid_isolate -= 1;
                }
                let top = stack.top();
                levels[i] = top.level;
                if top.override_status != BidiClass::ON {
                    types[i] = top.override_status;
                }
            }
            // X7
            BidiClass::PDF => {
                // The PDF keeps the level of the embedding it terminates.
                levels[i] = stack.top().level;
                if overflow_isolate > 0 {
                    // Swallowed by a pending isolate overflow.
                } else if overflow_embedding > 0 {
                    overflow_embedding -= 1;
                } else if !stack.top().isolate {
                    stack.pop();
                }
            }
            // X8
            BidiClass::B => {
                overflow_isolate = 0;
                overflow_embedding = 0;
                valid_isolate = 0;
                stack.reset(paragraph_level);
                levels[i] = paragraph_level;
            }
            // X6
            _ => {
                let top = stack.top();
                levels[i] = top.level;
                if top.override_status != BidiClass::ON {
                    types[i] = top.override_status;
                }
            }
        }
    }

    levels
}

/// Rule X9: rewrite the embedding and override controls (and PDF) to BN.
/// BN characters keep their assigned levels and never influence strong-type
/// scans.
pub(crate) fn neutralize_formatting(types: &mut [BidiClass]) {
    for t in types.iter_mut() {
        if t.is_explicit_embedding() || *t == BidiClass::PDF {
            *t = BidiClass::BN;
        }
    }
}
