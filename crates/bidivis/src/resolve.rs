#![forbid(unsafe_code)]

//! Weak, neutral, and implicit resolution (W1-W7, N0-N2, I1-I2).
//!
//! Each isolating run sequence is resolved in isolation against its sos/eos
//! boundary pseudo-types. Mutations go into a working copy of the classes
//! which is written back to the paragraph arrays once the sequence is done,
//! so interleaved sequences never alias each other.

use crate::class::BidiClass;
use crate::runs::IsolatingRunSequence;
use crate::tables;
use smallvec::SmallVec;

/// BD16 bracket stack depth. Pair identification stops when exceeded.
const MAX_PAIRING_DEPTH: usize = 63;

/// Resolve one sequence end to end and write the results back into the
/// paragraph-wide `types` and `levels` arrays.
pub(crate) fn resolve_sequence(
    seq: &IsolatingRunSequence,
    types: &mut [BidiClass],
    levels: &mut [u8],
    chars: &[char],
    original: &[BidiClass],
) {
    let mut work: Vec<BidiClass> = seq.indices.iter().map(|&i| types[i]).collect();

    resolve_weak(&mut work, seq.sos, seq.eos);
    resolve_brackets(&mut work, &seq.indices, chars, original, seq.level, seq.sos);
    resolve_neutral(&mut work, seq.sos, seq.eos, seq.level);
    resolve_implicit(&work, seq.level, &seq.indices, levels);

    for (k, &i) in seq.indices.iter().enumerate() {
        types[i] = work[k];
    }
}

// ---------------------------------------------------------------------------
// W rules
// ---------------------------------------------------------------------------

/// Apply W1-W7 in order over one sequence's working classes.
fn resolve_weak(work: &mut [BidiClass], sos: BidiClass, eos: BidiClass) {
    use BidiClass::*;

    // W1: NSM takes the class of the preceding character; after an isolate
    // initiator or PDI it becomes ON instead.
    let mut prev = sos;
    for t in work.iter_mut() {
        if *t == NSM {
            *t = if prev.is_isolate_initiator() || prev == PDI {
                ON
            } else {
                prev
            };
        }
        prev = *t;
    }

    // W2: EN with a nearest preceding strong type of AL becomes AN.
    let mut last_strong = sos;
    for t in work.iter_mut() {
        match *t {
            L | R | AL => last_strong = *t,
            EN if last_strong == AL => *t = AN,
            _ => {}
        }
    }

    // W3: AL becomes R.
    for t in work.iter_mut() {
        if *t == AL {
            *t = R;
        }
    }

    // W4: a single ES between two ENs becomes EN; a single CS between two
    // numbers of the same kind becomes that kind.
    for i in 1..work.len().saturating_sub(1) {
        match work[i] {
            ES if work[i - 1] == EN && work[i + 1] == EN => work[i] = EN,
            CS if work[i - 1] == EN && work[i + 1] == EN => work[i] = EN,
            CS if work[i - 1] == AN && work[i + 1] == AN => work[i] = AN,
            _ => {}
        }
    }

    // W5: a maximal run of ETs adjacent to an EN becomes EN.
    let n = work.len();
    let mut i = 0;
    while i < n {
        if work[i] == ET {
            let mut j = i;
            while j < n && work[j] == ET {
                j += 1;
            }
            let before = if i == 0 { sos } else { work[i - 1] };
            let after = if j == n { eos } else { work[j] };
            if before == EN || after == EN {
                for t in &mut work[i..j] {
                    *t = EN;
                }
            }
            i = j;
        } else {
            i += 1;
        }
    }

    // W6: residual separators and terminators become ON.
    for t in work.iter_mut() {
        if matches!(*t, ES | ET | CS) {
            *t = ON;
        }
    }

    // W7: EN with a nearest preceding strong type of L becomes L. The
    // rewrite happens once the scan has settled on the nearest strong
    // class, never mid-scan.
    let mut last_strong = sos;
    for t in work.iter_mut() {
        match *t {
            L | R => last_strong = *t,
            EN if last_strong == L => *t = L,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// N0: paired brackets
// ---------------------------------------------------------------------------

/// Strong direction a class contributes to bracket resolution; numbers count
/// as R (UAX #9 N0).
#[inline]
fn strong_dir(t: BidiClass) -> BidiClass {
    use BidiClass::*;
    match t {
        L => L,
        R | EN | AN => R,
        _ => ON,
    }
}

/// Identify bracket pairs (BD16) among the sequence's remaining ON
/// characters and resolve each pair's direction.
fn resolve_brackets(
    work: &mut [BidiClass],
    indices: &[usize],
    chars: &[char],
    original: &[BidiClass],
    level: u8,
    sos: BidiClass,
) {
    use BidiClass::*;

    let mut stack: SmallVec<[(usize, u32); 16]> = SmallVec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (i, &t) in work.iter().enumerate() {
        if t != ON {
            continue;
        }
        let cp = chars[indices[i]] as u32;
        if let Some(close) = tables::closing_bracket(cp) {
            if stack.len() == MAX_PAIRING_DEPTH {
                break;
            }
            stack.push((i, close));
        } else if tables::is_closing_bracket(cp) {
            let canonical = tables::canonical_bracket(cp);
            if let Some(found) = stack.iter().rposition(|&(_, c)| c == canonical) {
                pairs.push((stack[found].0, i));
                stack.truncate(found);
            }
        }
    }
    pairs.sort_unstable_by_key(|&(open, _)| open);

    let embed_dir = if level % 2 == 0 { L } else { R };
    let opposite = if embed_dir == L { R } else { L };

    for &(open, close) in &pairs {
        // A strong type matching the embedding direction inside the pair
        // wins outright.
        let mut pair_dir = ON;
        for &t in &work[open + 1..close] {
            let dir = strong_dir(t);
            if dir == ON {
                continue;
            }
            pair_dir = dir;
            if dir == embed_dir {
                break;
            }
        }
        if pair_dir == ON {
            // No strong type between the brackets: leave them neutral.
            continue;
        }
        if pair_dir != embed_dir {
            // Opposite-direction content: the established context before
            // the opening bracket decides.
            let mut context = sos;
            for &t in work[..open].iter().rev() {
                let dir = strong_dir(t);
                if dir != ON {
                    context = dir;
                    break;
                }
            }
            if context != opposite {
                pair_dir = embed_dir;
            }
        }
        work[open] = pair_dir;
        work[close] = pair_dir;
        // Characters that were NSM before W1 and follow a resolved bracket
        // copy its type.
        for k in open + 1..work.len() {
            if original[indices[k]] == NSM {
                work[k] = pair_dir;
            } else {
                break;
            }
        }
        for k in close + 1..work.len() {
            if original[indices[k]] == NSM {
                work[k] = pair_dir;
            } else {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// N1, N2
// ---------------------------------------------------------------------------

/// Coerce numbers to R for neutral-run boundary comparison.
#[inline]
fn neutral_boundary(t: BidiClass) -> BidiClass {
    use BidiClass::*;
    match t {
        EN | AN => R,
        other => other,
    }
}

/// N1: a neutral run between matching strong contexts takes their
/// direction. N2: anything still neutral takes the embedding direction.
fn resolve_neutral(work: &mut [BidiClass], sos: BidiClass, eos: BidiClass, level: u8) {
    use BidiClass::*;

    let embed_dir = if level % 2 == 0 { L } else { R };
    let n = work.len();
    let mut i = 0;
    while i < n {
        if work[i].is_neutral_or_isolate() {
            let mut j = i;
            while j < n && work[j].is_neutral_or_isolate() {
                j += 1;
            }
            let lead = if i == 0 {
                sos
            } else {
                neutral_boundary(work[i - 1])
            };
            let trail = if j == n { eos } else { neutral_boundary(work[j]) };
            let fill = if lead == trail && matches!(lead, L | R) {
                lead
            } else {
                embed_dir
            };
            for t in &mut work[i..j] {
                *t = fill;
            }
            i = j;
        } else {
            i += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// I1, I2
// ---------------------------------------------------------------------------

/// Assign resolved levels from the final classes. BN is transparent and
/// keeps the level it was given during explicit resolution.
fn resolve_implicit(work: &[BidiClass], level: u8, indices: &[usize], levels: &mut [u8]) {
    use BidiClass::*;

    for (k, &t) in work.iter().enumerate() {
        if t == BN {
            continue;
        }
        let resolved = if level % 2 == 0 {
            match t {
                R => level + 1,
                L => level,
                _ => level + 2,
            }
        } else if t == R {
            level
        } else {
            level + 1
        };
        levels[indices[k]] = resolved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BidiClass::*;

    #[test]
    fn w1_nsm_takes_preceding_class() {
        let mut work = vec![R, NSM, NSM];
        resolve_weak(&mut work, L, L);
        // The W rules leave the strong R and propagate it into both marks.
        assert_eq!(work, vec![R, R, R]);
    }

    #[test]
    fn w1_nsm_at_start_takes_sos() {
        let mut work = vec![NSM, L];
        resolve_weak(&mut work, R, L);
        assert_eq!(work[0], R);
    }

    #[test]
    fn w1_nsm_after_isolate_becomes_on_then_neutralizes() {
        let mut work = vec![PDI, NSM];
        resolve_weak(&mut work, L, L);
        // ON survives the W rules; N rules pick it up later.
        assert_eq!(work[1], ON);
    }

    #[test]
    fn w2_en_after_al_becomes_an() {
        let mut work = vec![AL, EN];
        resolve_weak(&mut work, L, L);
        assert_eq!(work[1], AN);
    }

    #[test]
    fn w2_en_after_l_stays_en_until_w7() {
        let mut work = vec![R, EN];
        resolve_weak(&mut work, L, L);
        assert_eq!(work[1], EN);
    }

    #[test]
    fn w3_al_becomes_r() {
        let mut work = vec![AL, AL];
        resolve_weak(&mut work, L, L);
        assert_eq!(work, vec![R, R]);
    }

    #[test]
    fn w4_single_es_between_en() {
        let mut work = vec![EN, ES, EN];
        resolve_weak(&mut work, R, R);
        assert_eq!(work, vec![EN, EN, EN]);
    }

    #[test]
    fn w4_single_cs_between_an() {
        let mut work = vec![AN, CS, AN];
        resolve_weak(&mut work, R, R);
        assert_eq!(work, vec![AN, AN, AN]);
    }

    #[test]
    fn w4_double_separator_is_not_joined() {
        let mut work = vec![EN, ES, ES, EN];
        resolve_weak(&mut work, R, R);
        // Residual separators fall through W6 to ON.
        assert_eq!(work[1], ON);
        assert_eq!(work[2], ON);
    }

    #[test]
    fn w5_et_run_adjacent_to_en() {
        let mut work = vec![ET, ET, EN];
        resolve_weak(&mut work, R, R);
        assert_eq!(work, vec![EN, EN, EN]);

        let mut work = vec![EN, ET, ET];
        resolve_weak(&mut work, L, L);
        // sos L means W7 then lifts everything to L.
        assert_eq!(work, vec![L, L, L]);
    }

    #[test]
    fn w5_et_without_en_neighbor_becomes_on() {
        let mut work = vec![R, ET, R];
        resolve_weak(&mut work, R, R);
        assert_eq!(work[1], ON);
    }

    #[test]
    fn w7_en_after_l_becomes_l() {
        let mut work = vec![L, EN];
        resolve_weak(&mut work, R, R);
        assert_eq!(work[1], L);
    }

    #[test]
    fn w7_en_after_r_keeps_en() {
        let mut work = vec![R, EN];
        resolve_weak(&mut work, L, L);
        assert_eq!(work[1], EN);
    }

    #[test]
    fn w7_uses_nearest_strong_not_first_seen() {
        // L ... R ... EN: the nearest strong class is R, so the EN stays.
        let mut work = vec![L, R, EN];
        resolve_weak(&mut work, L, L);
        assert_eq!(work[2], EN);
    }

    #[test]
    fn n1_neutral_run_between_matching_strong() {
        let mut work = vec![R, ON, WS, R];
        resolve_neutral(&mut work, L, L, 0);
        assert_eq!(work, vec![R, R, R, R]);
    }

    #[test]
    fn n1_numbers_count_as_r() {
        let mut work = vec![EN, ON, R];
        resolve_neutral(&mut work, L, L, 0);
        assert_eq!(work[1], R);
    }

    #[test]
    fn n2_mismatched_context_takes_embedding_direction() {
        let mut work = vec![L, ON, R];
        resolve_neutral(&mut work, L, R, 0);
        assert_eq!(work[1], L);

        let mut work = vec![L, ON, R];
        resolve_neutral(&mut work, R, R, 1);
        assert_eq!(work[1], R);
    }

    #[test]
    fn n_rules_use_sos_eos_at_edges() {
        let mut work = vec![WS, R, WS];
        resolve_neutral(&mut work, R, R, 1);
        assert_eq!(work, vec![R, R, R]);
    }

    #[test]
    fn implicit_even_level_deltas() {
        let work = vec![L, R, EN, AN];
        let indices = vec![0, 1, 2, 3];
        let mut levels = vec![0u8; 4];
        resolve_implicit(&work, 0, &indices, &mut levels);
        assert_eq!(levels, vec![0, 1, 2, 2]);
    }

    #[test]
    fn implicit_odd_level_deltas() {
        let work = vec![L, R, EN, AN];
        let indices = vec![0, 1, 2, 3];
        let mut levels = vec![1u8; 4];
        resolve_implicit(&work, 1, &indices, &mut levels);
        assert_eq!(levels, vec![2, 1, 2, 2]);
    }

    #[test]
    fn implicit_bn_is_transparent() {
        let work = vec![L, BN, L];
        let indices = vec![0, 1, 2];
        let mut levels = vec![7u8, 7, 7];
        resolve_implicit(&work, 0, &indices, &mut levels);
        assert_eq!(levels, vec![0, 7, 0], "BN keeps its explicit level");
    }

    fn bracket_fixture(
        text: &str,
        work: Vec<BidiClass>,
        level: u8,
        sos: BidiClass,
    ) -> Vec<BidiClass> {
        let chars: Vec<char> = text.chars().collect();
        let original = crate::class::classify(text);
        let indices: Vec<usize> = (0..chars.len()).collect();
        let mut work = work;
        resolve_brackets(&mut work, &indices, &chars, &original, level, sos);
        work
    }

    #[test]
    fn n0_brackets_with_embedding_direction_inside() {
        // RTL context, R content inside the pair: brackets become R.
        let work = bracket_fixture("(\u{05D0})", vec![ON, R, ON], 1, R);
        assert_eq!(work, vec![R, R, R]);
    }

    #[test]
    fn n0_brackets_opposite_content_follow_context() {
        // RTL embedding, L content, preceding context L: brackets go L.
        let work = bracket_fixture("x(y)", vec![L, ON, L, ON], 1, R);
        assert_eq!(work[1], L);
        assert_eq!(work[3], L);
        // Same content but R context before the pair: embedding wins.
        let work = bracket_fixture("\u{05D0}(y)", vec![R, ON, L, ON], 1, R);
        assert_eq!(work[1], R);
        assert_eq!(work[3], R);
    }

    #[test]
    fn n0_brackets_without_strong_content_stay_neutral() {
        let work = bracket_fixture("( )", vec![ON, WS, ON], 1, R);
        assert_eq!(work, vec![ON, WS, ON]);
    }

    #[test]
    fn n0_unmatched_brackets_stay_neutral() {
        let work = bracket_fixture("(\u{05D0}", vec![ON, R], 1, R);
        assert_eq!(work[0], ON);
    }

    #[test]
    fn n0_nested_brackets_resolve_independently() {
        let work = bracket_fixture(
            "(\u{05D0}(\u{05D1})\u{05D2})",
            vec![ON, R, ON, R, ON, R, ON],
            1,
            R,
        );
        assert_eq!(work[0], R);
        assert_eq!(work[2], R);
        assert_eq!(work[4], R);
        assert_eq!(work[6], R);
    }

    #[test]
    fn n0_canonical_angle_brackets_pair() {
        // U+2329 pairs with U+3009 through canonical equivalence.
        let work = bracket_fixture("\u{2329}\u{05D0}\u{3009}", vec![ON, R, ON], 1, R);
        assert_eq!(work[0], R);
        assert_eq!(work[2], R);
    }
}
