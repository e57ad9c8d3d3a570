//! Normalization passes over edit scripts.
//!
//! Every pass preserves the reconstruction laws: the Equal+Delete
//! payloads still concatenate to the source text and the Equal+Insert
//! payloads to the target text. All passes are idempotent.

use crate::diff::{common_overlap_units, common_prefix_units, common_suffix_units, Diff, Op};
use crate::unit::{self, Units, NEWLINE};
use crate::Engine;

/// Merges adjacent edits of the same kind, factors common affixes out of
/// replacement runs, and slides single edits through neighboring
/// equalities when that shortens the script. Terminal pass of every
/// other cleanup.
pub fn cleanup_merge(diffs: &mut Vec<Diff>) {
    if diffs.is_empty() {
        return;
    }
    // Sentinel equality so the final run is flushed like any other.
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
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&diffs[pointer].data);
                pointer += 1;
            }
            Op::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor a common prefix into the equality
                        // before the run.
                        let prefix = common_prefix_units(&text_insert, &text_delete);
                        if prefix != 0 {
                            let run_start = pointer - count_delete - count_insert;
                            if run_start > 0 && diffs[run_start - 1].op == Op::Equal {
                                diffs[run_start - 1].data.extend_from_slice(&text_insert[..prefix]);
                            } else {
                                diffs.insert(
                                    0,
                                    Diff::from_units(Op::Equal, text_insert[..prefix].to_vec()),
                                );
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }
                        // Factor a common suffix into the equality after
                        // the run.
                        let suffix = common_suffix_units(&text_insert, &text_delete);
                        if suffix != 0 {
                            let mut data = text_insert[text_insert.len() - suffix..].to_vec();
                            data.extend_from_slice(&diffs[pointer].data);
                            diffs[pointer].data = data;
                            text_insert.truncate(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                        }
                    }
                    // Replace the run with at most one Delete and one
                    // Insert.
                    pointer -= count_delete + count_insert;
                    diffs.drain(pointer..pointer + count_delete + count_insert);
                    if !text_delete.is_empty() {
                        diffs.insert(pointer, Diff::from_units(Op::Delete, text_delete.clone()));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        diffs.insert(pointer, Diff::from_units(Op::Insert, text_insert.clone()));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && diffs[pointer - 1].op == Op::Equal {
                    // Merge this equality into the previous one.
                    let data = diffs.remove(pointer).data;
                    diffs[pointer - 1].data.extend_from_slice(&data);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if diffs.last().is_some_and(Diff::is_empty) {
        diffs.pop();
    }

    // Second pass: slide single edits through a flanking equality when
    // the edit ends with it (shift left) or starts with it (shift
    // right), eliminating the equality.
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            if diffs[pointer].data.ends_with(&diffs[pointer - 1].data) {
                let prev = diffs[pointer - 1].data.clone();
                let kept = diffs[pointer].data[..diffs[pointer].data.len() - prev.len()].to_vec();
                let mut slid = prev.clone();
                slid.extend_from_slice(&kept);
                diffs[pointer].data = slid;
                let mut next = prev;
                next.extend_from_slice(&diffs[pointer + 1].data);
                diffs[pointer + 1].data = next;
                diffs.remove(pointer - 1);
                changes = true;
            } else if diffs[pointer].data.starts_with(&diffs[pointer + 1].data) {
                let next = diffs[pointer + 1].data.clone();
                diffs[pointer - 1].data.extend_from_slice(&next);
                let mut slid = diffs[pointer].data[next.len()..].to_vec();
                slid.extend_from_slice(&next);
                diffs[pointer].data = slid;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    // A slide can expose further merges.
    if changes {
        cleanup_merge(diffs);
    }
}

/// Slides each single edit flanked by equalities to the best semantic
/// boundary, judged by [`boundary_score`]. Never changes the texts a
/// diff reconstructs.
pub fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            let mut equality1 = diffs[pointer - 1].data.clone();
            let mut edit = diffs[pointer].data.clone();
            let mut equality2 = diffs[pointer + 1].data.clone();

            // Shift the edit as far left as possible first.
            let common_offset = common_suffix_units(&equality1, &edit);
            if common_offset != 0 {
                let common = edit[edit.len() - common_offset..].to_vec();
                equality1.truncate(equality1.len() - common_offset);
                let mut shifted = common.clone();
                shifted.extend_from_slice(&edit[..edit.len() - common_offset]);
                edit = shifted;
                let mut shifted2 = common;
                shifted2.extend_from_slice(&equality2);
                equality2 = shifted2;
            }

            // Step right one unit at a time, keeping the best score.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit[0]);
                edit.remove(0);
                edit.push(equality2[0]);
                equality2.remove(0);
                let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
                // >= favors the rightmost of equal-scoring positions,
                // after the initial full-left shift.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].data != best_equality1 {
                if !best_equality1.is_empty() {
                    diffs[pointer - 1].data = best_equality1;
                } else {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                diffs[pointer].data = best_edit;
                if !best_equality2.is_empty() {
                    diffs[pointer + 1].data = best_equality2;
                } else {
                    diffs.remove(pointer + 1);
                    pointer -= 1;
                }
            }
        }
        pointer += 1;
    }
}

/// Scores the boundary between two texts; higher is a more natural
/// break. 6 string edge, 5 blank line, 4 line break, 3 end of sentence,
/// 2 whitespace, 1 non-alphanumeric, 0 inside a word.
fn boundary_score(one: &[u16], two: &[u16]) -> usize {
    if one.is_empty() || two.is_empty() {
        return 6;
    }
    let char1 = one[one.len() - 1];
    let char2 = two[0];
    let non_alnum1 = !unit::is_alphanumeric(char1);
    let non_alnum2 = !unit::is_alphanumeric(char2);
    let whitespace1 = non_alnum1 && unit::is_whitespace(char1);
    let whitespace2 = non_alnum2 && unit::is_whitespace(char2);
    let line_break1 = whitespace1 && unit::is_line_break(char1);
    let line_break2 = whitespace2 && unit::is_line_break(char2);
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

const CR: u16 = b'\r' as u16;

/// Matches a trailing `\n\n` or `\n\r\n`.
fn ends_with_blank_line(text: &[u16]) -> bool {
    let n = text.len();
    (n >= 2 && text[n - 2] == NEWLINE && text[n - 1] == NEWLINE)
        || (n >= 3 && text[n - 3] == NEWLINE && text[n - 2] == CR && text[n - 1] == NEWLINE)
}

/// Matches a leading `\n\n`, `\r\n\n`, `\n\r\n`, or `\r\n\r\n`.
fn starts_with_blank_line(text: &[u16]) -> bool {
    let first = match text.first() {
        Some(&CR) => {
            if text.get(1) != Some(&NEWLINE) {
                return false;
            }
            2
        }
        Some(&NEWLINE) => 1,
        _ => return false,
    };
    match text.get(first) {
        Some(&NEWLINE) => true,
        Some(&CR) => text.get(first + 1) == Some(&NEWLINE),
        _ => false,
    }
}

/// Removes equalities that are semantically trivial: shorter than the
/// edit mass on both of their sides. Follows up with the lossless
/// boundary slide and extraction of replacement overlaps into new
/// equalities.
pub fn cleanup_semantic(diffs: &mut Vec<Diff>) {
    let mut changes = false;
    // Indices of candidate equalities, newest last.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Units> = None;
    let mut pointer: isize = 0;
    // Edit mass on each side of the candidate equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;
    while pointer < diffs.len() as isize {
        let idx = pointer as usize;
        if diffs[idx].op == Op::Equal {
            equalities.push(idx);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[idx].data.clone());
        } else {
            if diffs[idx].op == Op::Insert {
                length_insertions2 += diffs[idx].data.len();
            } else {
                length_deletions2 += diffs[idx].data.len();
            }
            let eliminate = last_equality.as_ref().is_some_and(|eq| {
                eq.len() <= length_insertions1.max(length_deletions1)
                    && eq.len() <= length_insertions2.max(length_deletions2)
            });
            if eliminate {
                let eq_index = *equalities.last().expect("candidate tracked with equality");
                let eq = last_equality.take().expect("checked above");
                // Duplicate the equality as a deletion, and demote the
                // original to an insertion.
                diffs.insert(eq_index, Diff::from_units(Op::Delete, eq));
                diffs[eq_index + 1].op = Op::Insert;
                equalities.pop();
                equalities.pop();
                pointer = equalities.last().map_or(-1, |&i| i as isize);
                length_insertions1 = 0;
                length_deletions1 = 0;
                length_insertions2 = 0;
                length_deletions2 = 0;
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Extract overlaps between adjacent deletions and insertions into
    // equalities: abcxxx/xxxdef becomes abc, =xxx, def.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Op::Delete && diffs[pointer].op == Op::Insert {
            let deletion = diffs[pointer - 1].data.clone();
            let insertion = diffs[pointer].data.clone();
            let overlap1 = common_overlap_units(&deletion, &insertion);
            let overlap2 = common_overlap_units(&insertion, &deletion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    diffs.insert(
                        pointer,
                        Diff::from_units(Op::Equal, insertion[..overlap1].to_vec()),
                    );
                    diffs[pointer - 1].data = deletion[..deletion.len() - overlap1].to_vec();
                    diffs[pointer + 1].data = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // Reverse overlap: the deletion tail restates the
                // insertion head, so swap the pair around the equality.
                diffs.insert(
                    pointer,
                    Diff::from_units(Op::Equal, deletion[..overlap2].to_vec()),
                );
                diffs[pointer - 1] =
                    Diff::from_units(Op::Insert, insertion[..insertion.len() - overlap2].to_vec());
                diffs[pointer + 1] = Diff::from_units(Op::Delete, deletion[overlap2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

impl Engine {
    /// Removes equalities that cost more to keep than to respell,
    /// judged against `diff_edit_cost`: an equality boxed in by edits on
    /// all four sides goes, as does one boxed in on three sides that is
    /// shorter than half the edit cost.
    pub fn cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        let mut changes = false;
        let mut equalities: Vec<usize> = Vec::new();
        let mut last_equality: Option<Units> = None;
        let mut pointer: isize = 0;
        // Edit presence on each side of the candidate equality.
        let mut pre_ins = false;
        let mut pre_del = false;
        let mut post_ins = false;
        let mut post_del = false;
        while pointer < diffs.len() as isize {
            let idx = pointer as usize;
            if diffs[idx].op == Op::Equal {
                if diffs[idx].data.len() < self.diff_edit_cost && (post_ins || post_del) {
                    equalities.push(idx);
                    pre_ins = post_ins;
                    pre_del = post_del;
                    last_equality = Some(diffs[idx].data.clone());
                } else {
                    equalities.clear();
                    last_equality = None;
                }
                post_ins = false;
                post_del = false;
            } else {
                if diffs[idx].op == Op::Delete {
                    post_del = true;
                } else {
                    post_ins = true;
                }
                let sides =
                    pre_ins as usize + pre_del as usize + post_ins as usize + post_del as usize;
                let eliminate = last_equality.as_ref().is_some_and(|eq| {
                    (pre_ins && pre_del && post_ins && post_del)
                        || (eq.len() * 2 < self.diff_edit_cost && sides == 3)
                });
                if eliminate {
                    let eq_index = *equalities.last().expect("candidate tracked with equality");
                    let eq = last_equality.take().expect("checked above");
                    diffs.insert(eq_index, Diff::from_units(Op::Delete, eq));
                    diffs[eq_index + 1].op = Op::Insert;
                    equalities.pop();
                    if pre_ins && pre_del {
                        // No equality candidates can survive a full box.
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        equalities.pop();
                        pointer = equalities.last().map_or(-1, |&i| i as isize);
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                }
            }
            pointer += 1;
        }

        if changes {
            cleanup_merge(diffs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_detection() {
        assert!(ends_with_blank_line(&unit::units("AAA\n\n")));
        assert!(ends_with_blank_line(&unit::units("AAA\n\r\n")));
        assert!(!ends_with_blank_line(&unit::units("AAA\r\n")));
        assert!(starts_with_blank_line(&unit::units("\r\n\r\nAAA")));
        assert!(starts_with_blank_line(&unit::units("\n\nAAA")));
        assert!(!starts_with_blank_line(&unit::units("\nAAA")));
    }

    #[test]
    fn boundary_scores() {
        let score = |a: &str, b: &str| boundary_score(&unit::units(a), &unit::units(b));
        assert_eq!(score("", "whatever"), 6);
        assert_eq!(score("AAA\n\n", "BBB"), 5);
        assert_eq!(score("AAA\n", "BBB"), 4);
        assert_eq!(score("The xxx.", " The yyy."), 3);
        assert_eq!(score("The ", "cat"), 2);
        assert_eq!(score("The-", "cat"), 1);
        assert_eq!(score("Th", "ecat"), 0);
    }
}
