//! Edit-script computation between two texts.
//!
//! The entry point is [`Engine::diff_main`]. It strips common affixes,
//! dispatches simple shapes directly, and otherwise runs a Myers bisect
//! bounded by the engine's wall-clock deadline, with a line-granular
//! speedup for large inputs and a half-match heuristic shortcut when a
//! timeout is configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cleanup;
use crate::unit::{self, Units, NEWLINE};
use crate::Engine;

/// The kind of an edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Present in the source text only.
    Delete,
    /// Present in both texts.
    Equal,
    /// Present in the target text only.
    Insert,
}

/// One edit: an operation and the code units it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub op: Op,
    pub data: Units,
}

impl Diff {
    /// Builds an edit from a string payload.
    pub fn new(op: Op, text: &str) -> Self {
        Self { op, data: unit::units(text) }
    }

    /// Shorthand for an Equal edit.
    pub fn equal(text: &str) -> Self {
        Self::new(Op::Equal, text)
    }

    /// Shorthand for a Delete edit.
    pub fn delete(text: &str) -> Self {
        Self::new(Op::Delete, text)
    }

    /// Shorthand for an Insert edit.
    pub fn insert(text: &str) -> Self {
        Self::new(Op::Insert, text)
    }

    pub(crate) fn from_units(op: Op, data: Units) -> Self {
        Self { op, data }
    }

    /// The payload as a string (lossy if edits split a surrogate pair).
    pub fn text(&self) -> String {
        unit::string(&self.data)
    }

    /// Payload length in code units.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Length of the common prefix of two strings, in code units.
pub fn common_prefix(a: &str, b: &str) -> usize {
    common_prefix_units(&unit::units(a), &unit::units(b))
}

/// Length of the common suffix of two strings, in code units.
pub fn common_suffix(a: &str, b: &str) -> usize {
    common_suffix_units(&unit::units(a), &unit::units(b))
}

/// Length of the longest suffix of `a` that is a prefix of `b`.
///
/// Code units are opaque: no canonical equivalence, so
/// `common_overlap("fi", "\u{FB01}i") == 0`.
pub fn common_overlap(a: &str, b: &str) -> usize {
    common_overlap_units(&unit::units(a), &unit::units(b))
}

pub(crate) fn common_prefix_units(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() || a[0] != b[0] {
        return 0;
    }
    let mut min = 0;
    let mut max = a.len().min(b.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if a[start..mid] == b[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

pub(crate) fn common_suffix_units(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() || a.last() != b.last() {
        return 0;
    }
    let mut min = 0;
    let mut max = a.len().min(b.len());
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if a[a.len() - mid..a.len() - end] == b[b.len() - mid..b.len() - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

pub(crate) fn common_overlap_units(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Truncate to equal lengths: only the tail of `a` against the head
    // of `b` can overlap.
    let min_len = a.len().min(b.len());
    let a = &a[a.len() - min_len..];
    let b = &b[..min_len];
    if a == b {
        return min_len;
    }
    let mut best = 0;
    let mut length = 1;
    loop {
        // The scan length can overshoot min_len after a long skip, so
        // the slices clamp like the substring semantics this mirrors.
        let pattern = &a[min_len.saturating_sub(length)..];
        let Some(found) = unit::find(b, pattern, 0) else {
            return best;
        };
        length += found;
        if found == 0 || a[min_len.saturating_sub(length)..] == b[..length.min(min_len)] {
            best = length;
            length += 1;
        }
    }
}

/// A half-match split: prefixes and suffixes of both inputs around a
/// shared middle at least half as long as the longer input.
struct HalfMatch {
    prefix1: Units,
    suffix1: Units,
    prefix2: Units,
    suffix2: Units,
    common: Units,
}

impl Engine {
    /// Computes the diff of two texts with the line-granular speedup on.
    pub fn diff_main(&self, text1: &str, text2: &str) -> Vec<Diff> {
        self.diff_main_checklines(text1, text2, true)
    }

    /// Computes the diff of two texts.
    ///
    /// `checklines` enables the line-granular first pass for inputs over
    /// one hundred code units; slightly coarser, much faster.
    pub fn diff_main_checklines(&self, text1: &str, text2: &str, checklines: bool) -> Vec<Diff> {
        self.diff_units(&unit::units(text1), &unit::units(text2), checklines, self.deadline())
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        (self.diff_timeout > 0.0)
            .then(|| Instant::now() + Duration::from_secs_f32(self.diff_timeout))
    }

    pub(crate) fn diff_units(
        &self,
        text1: &[u16],
        text2: &[u16],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1 == text2 {
            if text1.is_empty() {
                return Vec::new();
            }
            return vec![Diff::from_units(Op::Equal, text1.to_vec())];
        }

        let prefix = common_prefix_units(text1, text2);
        let suffix = common_suffix_units(&text1[prefix..], &text2[prefix..]);
        let mid1 = &text1[prefix..text1.len() - suffix];
        let mid2 = &text2[prefix..text2.len() - suffix];

        let mut diffs = self.compute(mid1, mid2, checklines, deadline);
        if prefix > 0 {
            diffs.insert(0, Diff::from_units(Op::Equal, text1[..prefix].to_vec()));
        }
        if suffix > 0 {
            diffs.push(Diff::from_units(Op::Equal, text1[text1.len() - suffix..].to_vec()));
        }
        cleanup::cleanup_merge(&mut diffs);
        diffs
    }

    /// Diff of two texts known to share no common prefix or suffix.
    fn compute(
        &self,
        text1: &[u16],
        text2: &[u16],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1.is_empty() {
            return vec![Diff::from_units(Op::Insert, text2.to_vec())];
        }
        if text2.is_empty() {
            return vec![Diff::from_units(Op::Delete, text1.to_vec())];
        }

        let (long, short) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if let Some(i) = unit::find(long, short, 0) {
            // Shorter text is inside the longer text.
            let op = if text1.len() > text2.len() { Op::Delete } else { Op::Insert };
            return vec![
                Diff::from_units(op, long[..i].to_vec()),
                Diff::from_units(Op::Equal, short.to_vec()),
                Diff::from_units(op, long[i + short.len()..].to_vec()),
            ];
        }
        if short.len() == 1 {
            // Single unit on one side; after the containment check above
            // it cannot match anything.
            return vec![
                Diff::from_units(Op::Delete, text1.to_vec()),
                Diff::from_units(Op::Insert, text2.to_vec()),
            ];
        }

        if let Some(hm) = self.half_match_units(text1, text2) {
            let mut diffs = self.diff_units(&hm.prefix1, &hm.prefix2, checklines, deadline);
            diffs.push(Diff::from_units(Op::Equal, hm.common));
            diffs.extend(self.diff_units(&hm.suffix1, &hm.suffix2, checklines, deadline));
            return diffs;
        }

        if checklines && text1.len() > 100 && text2.len() > 100 {
            return self.line_mode(text1, text2, deadline);
        }

        self.bisect_units(text1, text2, deadline)
    }

    /// Searches for a common substring at least half as long as the
    /// longer text, as five pieces `[prefix1, suffix1, prefix2, suffix2,
    /// common]`.
    ///
    /// Disabled (returns `None`) when `diff_timeout` is zero: accepting
    /// a half match would trade diff optimality for speed, and with no
    /// timeout there is nothing to trade against.
    pub fn half_match(&self, text1: &str, text2: &str) -> Option<[String; 5]> {
        self.half_match_units(&unit::units(text1), &unit::units(text2))
            .map(|hm| {
                [
                    unit::string(&hm.prefix1),
                    unit::string(&hm.suffix1),
                    unit::string(&hm.prefix2),
                    unit::string(&hm.suffix2),
                    unit::string(&hm.common),
                ]
            })
    }

    fn half_match_units(&self, text1: &[u16], text2: &[u16]) -> Option<HalfMatch> {
        if self.diff_timeout <= 0.0 {
            return None;
        }
        let (long, short) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if long.len() < 4 || short.len() * 2 < long.len() {
            return None;
        }

        // Check whether the second quarter or the second half of the
        // longer text seeds a sufficient match.
        let hm1 = half_match_at(long, short, (long.len() + 3) / 4);
        let hm2 = half_match_at(long, short, (long.len() + 1) / 2);
        let hm = match (hm1, hm2) {
            (None, None) => return None,
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (Some(a), Some(b)) => {
                if a.common.len() > b.common.len() {
                    a
                } else {
                    b
                }
            }
        };

        if text1.len() > text2.len() {
            Some(hm)
        } else {
            Some(HalfMatch {
                prefix1: hm.prefix2,
                suffix1: hm.suffix2,
                prefix2: hm.prefix1,
                suffix2: hm.suffix1,
                common: hm.common,
            })
        }
    }

    /// Finds the middle snake with Myers' bidirectional search, splits
    /// there, and recurses on both halves.
    pub fn diff_bisect(&self, text1: &str, text2: &str, deadline: Option<Instant>) -> Vec<Diff> {
        self.bisect_units(&unit::units(text1), &unit::units(text2), deadline)
    }

    fn bisect_units(&self, text1: &[u16], text2: &[u16], deadline: Option<Instant>) -> Vec<Diff> {
        let n = text1.len() as isize;
        let m = text2.len() as isize;
        let max_d = (n + m + 1) / 2;
        let v_offset = max_d;
        // One extra slot keeps the `k_offset + 1` reads in-bounds.
        let v_length = (2 * max_d + 2) as usize;
        let mut v1 = vec![-1isize; v_length];
        let mut v2 = vec![-1isize; v_length];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;

        let delta = n - m;
        // With an odd delta the forward path detects the overlap; with
        // an even delta the reverse path does.
        let front = delta % 2 != 0;
        let mut k1start = 0isize;
        let mut k1end = 0isize;
        let mut k2start = 0isize;
        let mut k2end = 0isize;

        for d in 0..max_d {
            if let Some(limit) = deadline {
                if Instant::now() > limit {
                    break;
                }
            }

            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = v_offset + k1;
                let mut x1 = if k1 == -d
                    || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize])
                {
                    v1[(k1_offset + 1) as usize]
                } else {
                    v1[(k1_offset - 1) as usize] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < n && y1 < m && text1[x1 as usize] == text2[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset as usize] = x1;
                if x1 > n {
                    k1end += 2;
                } else if y1 > m {
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && (k2_offset as usize) < v_length && v2[k2_offset as usize] != -1
                    {
                        let x2 = n - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = v_offset + k2;
                let mut x2 = if k2 == -d
                    || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize])
                {
                    v2[(k2_offset + 1) as usize]
                } else {
                    v2[(k2_offset - 1) as usize] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < n
                    && y2 < m
                    && text1[(n - x2 - 1) as usize] == text2[(m - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset as usize] = x2;
                if x2 > n {
                    k2end += 2;
                } else if y2 > m {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && (k1_offset as usize) < v_length && v1[k1_offset as usize] != -1
                    {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        let x2_forward = n - x2;
                        if x1 >= x2_forward {
                            return self.bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k2 += 2;
            }
        }

        // The deadline passed, or the number of edits equals the number
        // of units: no commonality at all.
        vec![
            Diff::from_units(Op::Delete, text1.to_vec()),
            Diff::from_units(Op::Insert, text2.to_vec()),
        ]
    }

    fn bisect_split(
        &self,
        text1: &[u16],
        text2: &[u16],
        x: usize,
        y: usize,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        let (left1, right1) = text1.split_at(x);
        let (left2, right2) = text2.split_at(y);
        let mut diffs = self.diff_units(left1, left2, false, deadline);
        diffs.extend(self.diff_units(right1, right2, false, deadline));
        diffs
    }

    /// Line-granular first pass for large inputs: pack unique lines into
    /// single code units, diff the short packed strings, rehydrate, then
    /// refine each remaining replacement run unit by unit.
    fn line_mode(&self, text1: &[u16], text2: &[u16], deadline: Option<Instant>) -> Vec<Diff> {
        let (packed1, packed2, line_array) = lines_to_units_internal(text1, text2);
        let mut diffs = self.diff_units(&packed1, &packed2, false, deadline);
        units_to_lines_internal(&mut diffs, &line_array);
        cleanup::cleanup_semantic(&mut diffs);

        // Rediff each replacement run, now unit by unit.
        diffs.push(Diff::from_units(Op::Equal, Vec::new()));
        let mut pointer = 0;
        let mut count_delete = 0;
        let mut count_insert = 0;
        let mut text_delete: Units = Vec::new();
        let mut text_insert: Units = Vec::new();
        while pointer < diffs.len() {
            match diffs[pointer].op {
                Op::Insert => {
                    count_insert += 1;
                    text_insert.extend_from_slice(&diffs[pointer].data);
                }
                Op::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].data);
                }
                Op::Equal => {
                    if count_delete >= 1 && count_insert >= 1 {
                        let start = pointer - count_delete - count_insert;
                        let sub = self.diff_units(&text_delete, &text_insert, false, deadline);
                        let sub_len = sub.len();
                        diffs.splice(start..pointer, sub);
                        pointer = start + sub_len;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();
        diffs
    }
}

fn half_match_at(long: &[u16], short: &[u16], i: usize) -> Option<HalfMatch> {
    let seed = &long[i..i + long.len() / 4];
    let mut best_common: &[u16] = &[];
    let mut best_long_a: &[u16] = &[];
    let mut best_long_b: &[u16] = &[];
    let mut best_short_a: &[u16] = &[];
    let mut best_short_b: &[u16] = &[];

    let mut j = unit::find(short, seed, 0);
    while let Some(pos) = j {
        let prefix_len = common_prefix_units(&long[i..], &short[pos..]);
        let suffix_len = common_suffix_units(&long[..i], &short[..pos]);
        if best_common.len() < suffix_len + prefix_len {
            best_common = &short[pos - suffix_len..pos + prefix_len];
            best_long_a = &long[..i - suffix_len];
            best_long_b = &long[i + prefix_len..];
            best_short_a = &short[..pos - suffix_len];
            best_short_b = &short[pos + prefix_len..];
        }
        j = unit::find(short, seed, pos + 1);
    }
    if best_common.len() * 2 >= long.len() {
        Some(HalfMatch {
            prefix1: best_long_a.to_vec(),
            suffix1: best_long_b.to_vec(),
            prefix2: best_short_a.to_vec(),
            suffix2: best_short_b.to_vec(),
            common: best_common.to_vec(),
        })
    } else {
        None
    }
}

/// Packs the lines of two texts into single code units.
///
/// Returns the packed texts and the line table; `table[0]` is empty so
/// every identifier is at least 1. Lines keep their trailing `\n`; an
/// unterminated tail counts as a line.
pub fn lines_to_units(text1: &str, text2: &str) -> (Vec<u16>, Vec<u16>, Vec<String>) {
    let (packed1, packed2, table) =
        lines_to_units_internal(&unit::units(text1), &unit::units(text2));
    let table = table.iter().map(|line| unit::string(line)).collect();
    (packed1, packed2, table)
}

/// Rehydrates packed diffs produced over [`lines_to_units`] output.
pub fn units_to_lines(diffs: &mut [Diff], table: &[String]) {
    let table: Vec<Units> = table.iter().map(|line| unit::units(line)).collect();
    units_to_lines_internal(diffs, &table);
}

fn lines_to_units_internal(text1: &[u16], text2: &[u16]) -> (Units, Units, Vec<Units>) {
    let mut line_array: Vec<Units> = vec![Vec::new()];
    let mut line_hash: HashMap<Units, u16> = HashMap::new();
    // Identifier budgets keep every line id inside 16 bits: the first
    // text may claim 40,000 distinct lines, the second the remainder.
    let packed1 = pack_lines(text1, &mut line_array, &mut line_hash, 40_000);
    let packed2 = pack_lines(text2, &mut line_array, &mut line_hash, 65_535);
    (packed1, packed2, line_array)
}

fn pack_lines(
    text: &[u16],
    line_array: &mut Vec<Units>,
    line_hash: &mut HashMap<Units, u16>,
    max_lines: usize,
) -> Units {
    let mut packed = Units::new();
    let mut line_start = 0;
    while line_start < text.len() {
        let mut line_end = unit::find(text, &[NEWLINE], line_start).unwrap_or(text.len() - 1);
        let mut line = text[line_start..=line_end].to_vec();
        if let Some(&id) = line_hash.get(&line) {
            packed.push(id);
        } else {
            if line_array.len() == max_lines {
                // Identifier budget exhausted: swallow the rest of the
                // text as one final unanalyzed line.
                line = text[line_start..].to_vec();
                line_end = text.len() - 1;
            }
            let id = line_array.len() as u16;
            line_hash.insert(line.clone(), id);
            line_array.push(line);
            packed.push(id);
        }
        line_start = line_end + 1;
    }
    packed
}

fn units_to_lines_internal(diffs: &mut [Diff], line_array: &[Units]) {
    for diff in diffs {
        let mut text = Units::with_capacity(diff.data.len());
        for &id in &diff.data {
            text.extend_from_slice(&line_array[id as usize]);
        }
        diff.data = text;
    }
}
