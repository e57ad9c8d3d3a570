//! Patch construction, serialization, and drift-tolerant application.
//!
//! A patch is a hunk: an edit script wrapped in Equal context, plus the
//! coordinates it was cut from. Application re-locates each hunk's
//! context fuzzily, diffs the found text against the expected text, and
//! threads every edit position through that secondary diff so the hunk
//! lands correctly even when the target has drifted.

use std::fmt;

use thiserror::Error;

use crate::cleanup;
use crate::delta::{self, levenshtein, x_index};
use crate::diff::{Diff, Op};
use crate::unit::{self, Units};
use crate::Engine;
use textmend_percent::{decode, encode, PercentError};

/// One hunk: context-wrapped edits and their coordinates.
///
/// `start1`/`length1` index the source text, `start2`/`length2` the
/// rewritten text, all in code units. The header renders 1-based, with
/// 0 reserved for zero-length hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub diffs: Vec<Diff>,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

impl fmt::Display for Patch {
    /// Emits the hunk in unified-diff-like form with percent-encoded
    /// payload lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coords1 = match self.length1 {
            0 => format!("{},0", self.start1),
            1 => format!("{}", self.start1 + 1),
            n => format!("{},{}", self.start1 + 1, n),
        };
        let coords2 = match self.length2 {
            0 => format!("{},0", self.start2),
            1 => format!("{}", self.start2 + 1),
            n => format!("{},{}", self.start2 + 1, n),
        };
        writeln!(f, "@@ -{coords1} +{coords2} @@")?;
        for diff in &self.diffs {
            let sign = match diff.op {
                Op::Insert => '+',
                Op::Delete => '-',
                Op::Equal => ' ',
            };
            writeln!(f, "{}{}", sign, encode(&diff.data))?;
        }
        Ok(())
    }
}

/// Errors produced while parsing patch text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchParseError {
    /// A line where a `@@` hunk header was required did not parse as
    /// one.
    #[error("invalid patch header: {0:?}")]
    InvalidHeader(String),
    /// An edit line started with something other than space, `-`, or
    /// `+`.
    #[error("invalid patch mode {mode:?} in: {line:?}")]
    InvalidMode { mode: char, line: String },
    /// An edit payload failed to decode.
    #[error("invalid escape in patch: {0}")]
    Codec(#[from] PercentError),
}

/// The input shapes accepted by [`Engine::patch_make`].
pub enum PatchSource<'a> {
    /// Diff the two texts, then build patches from the result.
    Texts(&'a str, &'a str),
    /// Build patches from a diff; the source text is reconstructed from
    /// its Equal and Delete payloads.
    Diffs(&'a [Diff]),
    /// The canonical shape: the source text and a diff over it.
    TextDiffs(&'a str, &'a [Diff]),
    /// Deprecated wire-compatible shape; the middle text is ignored.
    TextsDiffs(&'a str, &'a str, &'a [Diff]),
}

/// Parses patch text into a list of hunks.
pub fn patch_from_text(text: &str) -> Result<Vec<Patch>, PatchParseError> {
    let mut patches = Vec::new();
    if text.is_empty() {
        return Ok(patches);
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let mut pointer = 0;
    while pointer < lines.len() {
        let header = parse_header(lines[pointer])
            .ok_or_else(|| PatchParseError::InvalidHeader(lines[pointer].to_string()))?;
        let mut patch = Patch::default();
        let (start1, len1, start2, len2) = header;
        (patch.start1, patch.length1) = decode_coords(start1, len1);
        (patch.start2, patch.length2) = decode_coords(start2, len2);
        pointer += 1;

        while pointer < lines.len() {
            let line = lines[pointer];
            let Some(sign) = line.chars().next() else {
                // Blank line? Whatever.
                pointer += 1;
                continue;
            };
            if sign == '@' {
                // Start of the next hunk.
                break;
            }
            let payload = decode(&line[sign.len_utf8()..])?;
            match sign {
                '-' => patch.diffs.push(Diff::from_units(Op::Delete, payload)),
                '+' => patch.diffs.push(Diff::from_units(Op::Insert, payload)),
                ' ' => patch.diffs.push(Diff::from_units(Op::Equal, payload)),
                _ => {
                    return Err(PatchParseError::InvalidMode {
                        mode: sign,
                        line: line.to_string(),
                    })
                }
            }
            pointer += 1;
        }
        patches.push(patch);
    }
    Ok(patches)
}

/// Serializes hunks back into patch text.
pub fn patch_to_text(patches: &[Patch]) -> String {
    patches.iter().map(Patch::to_string).collect()
}

/// Parses `@@ -S1[,L1] +S2[,L2] @@` into its four numbers.
fn parse_header(line: &str) -> Option<(usize, Option<usize>, usize, Option<usize>)> {
    let rest = line.strip_prefix("@@ -")?;
    let ((start1, len1), rest) = parse_coords(rest)?;
    let rest = rest.strip_prefix(" +")?;
    let ((start2, len2), rest) = parse_coords(rest)?;
    (rest == " @@").then_some((start1, len1, start2, len2))
}

fn parse_coords(s: &str) -> Option<((usize, Option<usize>), &str)> {
    let (start, rest) = parse_number(s)?;
    match rest.strip_prefix(',') {
        None => Some(((start, None), rest)),
        Some(after) => {
            let (length, rest) = parse_number(after)?;
            Some(((start, Some(length)), rest))
        }
    }
}

fn parse_number(s: &str) -> Option<(usize, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok().map(|n| (n, &s[end..]))
}

/// Header coordinates to 0-based start plus length: a missing length
/// means one unit, and length 0 leaves the printed start untouched.
fn decode_coords(start: usize, length: Option<usize>) -> (usize, usize) {
    match length {
        None => (start.saturating_sub(1), 1),
        Some(0) => (start, 0),
        Some(n) => (start.saturating_sub(1), n),
    }
}

impl Engine {
    /// Builds a list of patches from any of the [`PatchSource`] shapes.
    pub fn patch_make(&self, source: PatchSource<'_>) -> Vec<Patch> {
        match source {
            PatchSource::Texts(text1, text2) => {
                let mut diffs = self.diff_main(text1, text2);
                if diffs.len() > 2 {
                    cleanup::cleanup_semantic(&mut diffs);
                    self.cleanup_efficiency(&mut diffs);
                }
                self.patch_make_units(&unit::units(text1), &diffs)
            }
            PatchSource::Diffs(diffs) => {
                let text1 = delta::source_units(diffs);
                self.patch_make_units(&text1, diffs)
            }
            PatchSource::TextDiffs(text1, diffs) => {
                self.patch_make_units(&unit::units(text1), diffs)
            }
            PatchSource::TextsDiffs(text1, _text2, diffs) => {
                self.patch_make_units(&unit::units(text1), diffs)
            }
        }
    }

    fn patch_make_units(&self, text1: &[u16], diffs: &[Diff]) -> Vec<Patch> {
        let mut patches = Vec::new();
        if diffs.is_empty() {
            return patches;
        }
        let mut patch = Patch::default();
        let mut char_count1 = 0;
        let mut char_count2 = 0;
        // Text before this patch is applied; recreated from postpatch
        // at each boundary so later hunks index the rewritten text.
        let mut prepatch: Units = text1.to_vec();
        let mut postpatch: Units = text1.to_vec();
        for (x, diff) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && diff.op != Op::Equal {
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }
            match diff.op {
                Op::Insert => {
                    patch.diffs.push(diff.clone());
                    patch.length2 += diff.data.len();
                    postpatch.splice(char_count2..char_count2, diff.data.iter().copied());
                }
                Op::Delete => {
                    patch.length1 += diff.data.len();
                    patch.diffs.push(diff.clone());
                    postpatch.drain(char_count2..char_count2 + diff.data.len());
                }
                Op::Equal => {
                    if diff.data.len() <= 2 * self.patch_margin
                        && !patch.diffs.is_empty()
                        && x != diffs.len() - 1
                    {
                        // Small equality inside a patch.
                        patch.diffs.push(diff.clone());
                        patch.length1 += diff.data.len();
                        patch.length2 += diff.data.len();
                    }
                    if diff.data.len() >= 2 * self.patch_margin && !patch.diffs.is_empty() {
                        // Time for a new patch.
                        self.add_context_units(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));
                        // The patched text already reflects everything
                        // up to this point.
                        prepatch = postpatch.clone();
                        char_count1 = char_count2;
                    }
                }
            }
            if diff.op != Op::Insert {
                char_count1 += diff.data.len();
            }
            if diff.op != Op::Delete {
                char_count2 += diff.data.len();
            }
        }
        if !patch.diffs.is_empty() {
            self.add_context_units(&mut patch, &prepatch);
            patches.push(patch);
        }
        patches
    }

    /// Grows Equal context around a patch until the context is unique
    /// inside `text`, so the patch can be re-located later, capped so
    /// the pattern still fits the match registers.
    pub fn patch_add_context(&self, patch: &mut Patch, text: &str) {
        self.add_context_units(patch, &unit::units(text));
    }

    fn add_context_units(&self, patch: &mut Patch, text: &[u16]) {
        if text.is_empty() {
            return;
        }
        let body_start = patch.start2.min(text.len());
        let body_end = (patch.start2 + patch.length1).min(text.len());
        let mut pattern = text[body_start..body_end].to_vec();
        let mut padding = 0;
        while unit::find(text, &pattern, 0) != unit::rfind(text, &pattern, text.len())
            && pattern.len() < self.match_max_bits.saturating_sub(2 * self.patch_margin)
        {
            padding += self.patch_margin;
            let start = body_start.saturating_sub(padding);
            let end = (body_end + padding).min(text.len());
            pattern = text[start..end].to_vec();
        }
        // One margin beyond the unique window.
        padding += self.patch_margin;

        let prefix_start = body_start.saturating_sub(padding);
        let prefix = &text[prefix_start..body_start];
        if !prefix.is_empty() {
            patch
                .diffs
                .insert(0, Diff::from_units(Op::Equal, prefix.to_vec()));
        }
        let suffix_end = (body_end + padding).min(text.len());
        let suffix = &text[body_end..suffix_end];
        if !suffix.is_empty() {
            patch.diffs.push(Diff::from_units(Op::Equal, suffix.to_vec()));
        }

        patch.start1 = patch.start1.saturating_sub(prefix.len());
        patch.start2 = patch.start2.saturating_sub(prefix.len());
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    /// Splits any patch whose span exceeds the match registers into a
    /// chain of smaller patches, threading margin-sized context from
    /// each link to the next. The combined effect is unchanged.
    pub fn patch_split_max(&self, patches: &mut Vec<Patch>) {
        let patch_size = self.match_max_bits;
        let fill_limit = patch_size.saturating_sub(self.patch_margin);
        let mut x = 0;
        while x < patches.len() {
            if patches[x].length1 <= patch_size {
                x += 1;
                continue;
            }
            let mut bigpatch = patches.remove(x);
            let mut insert_at = x;
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext: Units = Vec::new();
            while !bigpatch.diffs.is_empty() {
                let mut patch = Patch {
                    start1: start1 - precontext.len(),
                    start2: start2 - precontext.len(),
                    ..Patch::default()
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch
                        .diffs
                        .push(Diff::from_units(Op::Equal, precontext.clone()));
                }
                while !bigpatch.diffs.is_empty() && patch.length1 < fill_limit {
                    let op = bigpatch.diffs[0].op;
                    if op == Op::Insert {
                        // Insertions are harmless and pass whole.
                        let diff = bigpatch.diffs.remove(0);
                        patch.length2 += diff.data.len();
                        start2 += diff.data.len();
                        patch.diffs.push(diff);
                        empty = false;
                    } else if op == Op::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op == Op::Equal
                        && bigpatch.diffs[0].data.len() > 2 * patch_size
                    {
                        // An oversized deletion is taken whole rather
                        // than chopped into unmatchable slivers.
                        let diff = bigpatch.diffs.remove(0);
                        patch.length1 += diff.data.len();
                        start1 += diff.data.len();
                        empty = false;
                        patch.diffs.push(diff);
                    } else {
                        let take = bigpatch.diffs[0]
                            .data
                            .len()
                            .min(fill_limit - patch.length1);
                        let data: Units = bigpatch.diffs[0].data[..take].to_vec();
                        patch.length1 += data.len();
                        start1 += data.len();
                        if op == Op::Equal {
                            patch.length2 += data.len();
                            start2 += data.len();
                        } else {
                            empty = false;
                        }
                        if take == bigpatch.diffs[0].data.len() {
                            bigpatch.diffs.remove(0);
                        } else {
                            bigpatch.diffs[0].data.drain(..take);
                        }
                        patch.diffs.push(Diff::from_units(op, data));
                    }
                }
                // Compute the context to carry into the next link.
                let target = delta::target_units(&patch.diffs);
                precontext = target[target.len().saturating_sub(self.patch_margin)..].to_vec();
                // Append the trailing context of this link.
                let source = delta::source_units(&bigpatch.diffs);
                let postcontext_len = source.len().min(self.patch_margin);
                if postcontext_len > 0 {
                    let postcontext = &source[..postcontext_len];
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    match patch.diffs.last_mut() {
                        Some(last) if last.op == Op::Equal => {
                            last.data.extend_from_slice(postcontext)
                        }
                        _ => patch
                            .diffs
                            .push(Diff::from_units(Op::Equal, postcontext.to_vec())),
                    }
                }
                if !empty {
                    patches.insert(insert_at, patch);
                    insert_at += 1;
                }
            }
            x = insert_at;
        }
    }

    /// Wraps the first and last patches in sentinel context so edits at
    /// the very edges of a text have something to anchor on. Returns the
    /// sentinel string; callers wrap the text with the same sentinels
    /// before applying.
    pub fn patch_add_padding(&self, patches: &mut Vec<Patch>) -> String {
        let padding_length = self.patch_margin;
        let null_padding: Units = (0..padding_length).map(|i| (i % 4 + 1) as u16).collect();
        if patches.is_empty() {
            return unit::string(&null_padding);
        }

        // Bump every patch past the leading sentinel.
        for patch in patches.iter_mut() {
            patch.start1 += padding_length;
            patch.start2 += padding_length;
        }

        let first = patches.first_mut().expect("checked non-empty above");
        if first.diffs.first().is_none_or(|diff| diff.op != Op::Equal) {
            // No leading context; take the whole sentinel.
            first
                .diffs
                .insert(0, Diff::from_units(Op::Equal, null_padding.clone()));
            first.start1 -= padding_length;
            first.start2 -= padding_length;
            first.length1 += padding_length;
            first.length2 += padding_length;
        } else if padding_length > first.diffs[0].data.len() {
            // Narrow leading context; grow it with the sentinel tail.
            let existing = first.diffs[0].data.len();
            let extra = padding_length - existing;
            let mut data = null_padding[existing..].to_vec();
            data.extend_from_slice(&first.diffs[0].data);
            first.diffs[0].data = data;
            first.start1 -= extra;
            first.start2 -= extra;
            first.length1 += extra;
            first.length2 += extra;
        }

        let last = patches.last_mut().expect("checked non-empty above");
        if last.diffs.last().is_none_or(|diff| diff.op != Op::Equal) {
            last.diffs
                .push(Diff::from_units(Op::Equal, null_padding.clone()));
            last.length1 += padding_length;
            last.length2 += padding_length;
        } else if padding_length > last.diffs.last().expect("non-empty").data.len() {
            let tail = last.diffs.last_mut().expect("non-empty");
            let extra = padding_length - tail.data.len();
            tail.data.extend_from_slice(&null_padding[..extra]);
            last.length1 += extra;
            last.length2 += extra;
        }

        unit::string(&null_padding)
    }

    /// Applies patches to `text`, healing drift along the way.
    ///
    /// Returns the rewritten text plus one flag per applied hunk, in
    /// order (oversized hunks are split first, so there may be more
    /// flags than input patches). A false flag marks a hunk whose
    /// context could not be located, or whose deletion target had
    /// strayed too far; the rest of the patches still apply. The input
    /// patches are never mutated.
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }
        let mut patches = patches.to_vec();
        let null_padding = unit::units(&self.patch_add_padding(&mut patches));
        let mut text: Units = {
            let mut padded = null_padding.clone();
            padded.extend(unit::units(text));
            padded.extend_from_slice(&null_padding);
            padded
        };
        self.patch_split_max(&mut patches);

        // Net unit shift introduced by earlier patches, used to project
        // each patch's expected location onto the drifted text.
        let mut delta: isize = 0;
        let mut results = vec![false; patches.len()];
        for (x, patch) in patches.iter().enumerate() {
            // May sit left of the text start when earlier patches
            // shrank it; clamped only at the match calls.
            let expected_loc = patch.start2 as isize + delta;
            let text1 = delta::source_units(&patch.diffs);
            let mut start_loc;
            let mut end_loc: Option<usize> = None;
            if text1.len() > self.match_max_bits {
                // Anchor on the head window, then confirm with the tail
                // window; inconsistent anchors mean a false positive.
                start_loc = self.match_units(
                    &text,
                    &text1[..self.match_max_bits],
                    expected_loc.max(0) as usize,
                );
                if start_loc.is_some() {
                    let tail_loc =
                        expected_loc + (text1.len() - self.match_max_bits) as isize;
                    end_loc = self.match_units(
                        &text,
                        &text1[text1.len() - self.match_max_bits..],
                        tail_loc.max(0) as usize,
                    );
                    match end_loc {
                        Some(end) if start_loc.unwrap_or(usize::MAX) < end => {}
                        _ => start_loc = None,
                    }
                }
            } else {
                start_loc = self.match_units(&text, &text1, expected_loc.max(0) as usize);
            }

            let Some(start) = start_loc else {
                // No match; back out this patch's own length delta so
                // later patches are not thrown off.
                delta -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };
            results[x] = true;
            delta = start as isize - expected_loc;
            let text2: Units = match end_loc {
                None => text[start..(start + text1.len()).min(text.len())].to_vec(),
                Some(end) => {
                    text[start..(end + self.match_max_bits).min(text.len())].to_vec()
                }
            };
            if text1 == text2 {
                // Perfect match; splice the rewrite straight in.
                let target = delta::target_units(&patch.diffs);
                text.splice(start..start + text1.len(), target);
                continue;
            }
            // Imperfect match: diff what we found against what we
            // expected, and thread the patch through that diff.
            let mut diffs = self.diff_units(&text1, &text2, false, self.deadline());
            if text1.len() > self.match_max_bits
                && levenshtein(&diffs) as f64 / text1.len() as f64
                    > self.patch_delete_threshold as f64
            {
                // The end points match but the content is too
                // different; applying would clobber unrelated text.
                results[x] = false;
                continue;
            }
            cleanup::cleanup_semantic_lossless(&mut diffs);
            let mut index1 = 0;
            for diff in &patch.diffs {
                if diff.op != Op::Equal {
                    let index2 = x_index(&diffs, index1);
                    match diff.op {
                        Op::Insert => {
                            text.splice(start + index2..start + index2, diff.data.iter().copied());
                        }
                        Op::Delete => {
                            let del_end = x_index(&diffs, index1 + diff.data.len());
                            text.drain(start + index2..start + del_end);
                        }
                        Op::Equal => {}
                    }
                }
                if diff.op != Op::Insert {
                    index1 += diff.data.len();
                }
            }
        }

        // Strip the sentinels.
        let body = &text[null_padding.len()..text.len() - null_padding.len()];
        (unit::string(body), results)
    }
}
