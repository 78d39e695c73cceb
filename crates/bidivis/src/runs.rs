#![forbid(unsafe_code)]

//! Level runs and isolating run sequences (BD13, X10).
//!
//! After explicit resolution the paragraph is split into maximal runs of
//! equal level, then runs are stitched across isolate initiator → matching
//! PDI boundaries into [`IsolatingRunSequence`]s, the unit the W/N/I rules
//! operate on.

use crate::class::BidiClass;
use crate::explicit::IsolatePairs;

/// A maximal contiguous slice `[start, end)` of equal embedding level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelRun {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) level: u8,
}

/// One isolating run sequence: the logical positions it covers, its shared
/// embedding level, and its boundary pseudo-types.
#[derive(Debug, Clone)]
pub(crate) struct IsolatingRunSequence {
    /// Covered logical positions, in order. A concatenation of one or more
    /// level runs linked initiator → matching PDI.
    pub(crate) indices: Vec<usize>,
    /// Embedding level shared by all constituent runs.
    pub(crate) level: u8,
    /// Start-of-sequence pseudo-type, L or R.
    pub(crate) sos: BidiClass,
    /// End-of-sequence pseudo-type, L or R.
    pub(crate) eos: BidiClass,
}

/// Partition `levels` into maximal equal-level runs. Each completed run is
/// moved into the result; a fresh record starts the next run.
pub(crate) fn level_runs(levels: &[u8]) -> Vec<LevelRun> {
    let mut runs = Vec::new();
    if levels.is_empty() {
        return runs;
    }
    let mut start = 0;
    let mut level = levels[0];
    for (i, &l) in levels.iter().enumerate().skip(1) {
        if l != level {
            runs.push(LevelRun {
                start,
                end: i,
                level,
            });
            start = i;
            level = l;
        }
    }
    runs.push(LevelRun {
        start,
        end: levels.len(),
        level,
    });
    runs
}

#[inline]
fn boundary_class(level: u8) -> BidiClass {
    if level % 2 == 0 {
        BidiClass::L
    } else {
        BidiClass::R
    }
}

/// Build the isolating run sequences for a paragraph.
///
/// `original` holds the classifier output (pre-X9, pre-override); isolate
/// chaining and the unmatched-initiator eos rule are defined on it.
pub(crate) fn isolating_run_sequences(
    levels: &[u8],
    original: &[BidiClass],
    pairs: &IsolatePairs,
    paragraph_level: u8,
) -> Vec<IsolatingRunSequence> {
    let len = levels.len();
    let runs = level_runs(levels);

    // Position -> containing run, for locating the run of a matching PDI.
    let mut run_of = vec![0usize; len];
    for (idx, run) in runs.iter().enumerate() {
        for slot in &mut run_of[run.start..run.end] {
            *slot = idx;
        }
    }

    let mut sequences = Vec::new();
    for (idx, run) in runs.iter().enumerate() {
        // A run led by a matched PDI is consumed by the sequence of its
        // initiator's run; it never seeds a sequence of its own.
        let leads_with_matched_pdi = original[run.start] == BidiClass::PDI
            && pairs.matching_initiator(run.start).is_some();
        if leads_with_matched_pdi {
            continue;
        }

        let mut indices: Vec<usize> = (run.start..run.end).collect();
        let mut cursor = idx;
        loop {
            let last = runs[cursor].end - 1;
            if original[last].is_isolate_initiator() && pairs.has_matching_pdi(last) {
                cursor = run_of[pairs.matching_pdi(last)];
                indices.extend(runs[cursor].start..runs[cursor].end);
            } else {
                break;
            }
        }

        let level = run.level;
        let first = indices[0];
        let prev_level = if first == 0 {
            paragraph_level
        } else {
            levels[first - 1]
        };
        let sos = boundary_class(level.max(prev_level));

        let last = *indices.last().expect("runs are never empty");
        let eos = if original[last].is_isolate_initiator() && !pairs.has_matching_pdi(last) {
            // An unmatched initiator faces the end of the paragraph.
            boundary_class(level.max(paragraph_level))
        } else {
            let next_level = if last + 1 < len {
                levels[last + 1]
            } else {
                paragraph_level
            };
            boundary_class(level.max(next_level))
        };

        sequences.push(IsolatingRunSequence {
            indices,
            level,
            sos,
            eos,
        });
    }
    sequences
}
