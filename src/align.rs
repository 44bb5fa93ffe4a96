//! Greedy fuzzy alignment of two line sequences.
//!
//! This is the HOT PATH. For every line of B the aligner looks forward in A
//! for the first line that clears the similarity threshold, flushes the A
//! lines it skipped on the way, and falls back to a reference-only best
//! match when nothing qualifies. A lines never consumed are emitted last.
//!
//! The walk is greedy: the first qualifying line in document order wins over a
//! higher score further ahead.

use rayon::prelude::*;
use tracing::debug;

use crate::highlight::highlight;
use crate::models::{AlignParams, AlignmentItem, AlignmentResult};
use crate::similarity::similarity;

/// Align two line sequences with the given parameters.
pub fn align_lines<S>(a: &[S], b: &[S], params: &AlignParams) -> AlignmentResult
where
    S: AsRef<str> + Sync,
{
    align_lines_with_progress(a, b, params, || {})
}

/// Align two line sequences, calling `on_step` once per line of B.
pub fn align_lines_with_progress<S, F>(
    a: &[S],
    b: &[S],
    params: &AlignParams,
    mut on_step: F,
) -> AlignmentResult
where
    S: AsRef<str> + Sync,
    F: FnMut(),
{
    let threshold = params.threshold;

    // consumed[k]: A line k is bound to a B position (or flushed as skipped)
    let mut consumed = vec![false; a.len()];
    // Next A index the sequential lookahead may start from
    let mut next_start = 0usize;

    let mut items = Vec::with_capacity(a.len() + b.len());
    let mut score_sum = 0.0f64;
    let mut scored = 0usize;

    for (j, bb) in b.iter().enumerate() {
        let bb = bb.as_ref();

        let matched = find_sequential_match(a, bb, next_start, &consumed, params);

        if let Some(i2) = matched {
            for skipped in next_start..i2 {
                if consumed[skipped] {
                    continue;
                }
                items.push(left_only_item(a, b, skipped, params));
                consumed[skipped] = true;
            }
            next_start = i2 + 1;
            consumed[i2] = true;
        }

        let left = matched.map(|i| a[i].as_ref());

        // Reference-only candidate, left unconsumed
        let left_best = match matched {
            Some(_) => None,
            None => best_match(a, bb, |k| consumed[k], params)
                .filter(|&(_, score)| score > threshold)
                .map(|(k, _)| a[k].as_ref()),
        };

        let compared = left.or(left_best);
        let highlighted = highlight(compared, Some(bb));
        let score = similarity(compared.unwrap_or(""), bb);

        score_sum += score;
        scored += 1;

        items.push(AlignmentItem {
            left: left.map(str::to_string),
            left_best: left_best.map(str::to_string),
            left_highlighted: highlighted.left,
            left_number: matched,
            right: Some(bb.to_string()),
            right_best: None,
            right_highlighted: highlighted.right,
            right_number: Some(j),
            score: Some(score),
        });

        on_step();
    }

    // Trailing pass: A lines that never got a slot
    for k in 0..a.len() {
        if !consumed[k] {
            items.push(left_only_item(a, b, k, params));
        }
    }

    let score = if scored > 0 {
        score_sum / scored as f64
    } else {
        0.0
    };

    debug!(
        left_lines = a.len(),
        right_lines = b.len(),
        matched = consumed.iter().filter(|&&c| c).count(),
        items = items.len(),
        score,
        "alignment complete"
    );

    AlignmentResult { score, items }
}

/// First unconsumed A index at or after `start` whose similarity to `target`
/// exceeds the threshold.
fn find_sequential_match<S>(
    a: &[S],
    target: &str,
    start: usize,
    consumed: &[bool],
    params: &AlignParams,
) -> Option<usize>
where
    S: AsRef<str> + Sync,
{
    if start >= a.len() {
        return None;
    }

    let qualifies = |k: usize| !consumed[k] && similarity(a[k].as_ref(), target) > params.threshold;

    if params.parallel {
        (start..a.len()).into_par_iter().position_first(|k| qualifies(k)).map(|pos| start + pos)
    } else {
        (start..a.len()).find(|&k| qualifies(k))
    }
}

/// Highest-scoring line of `lines` against `target`, skipping indices for
/// which `skip` returns true.
///
/// Ties go to the lowest index and a score of 0 is never a candidate. The
/// caller decides whether the winner clears the threshold.
fn best_match<S, K>(lines: &[S], target: &str, skip: K, params: &AlignParams) -> Option<(usize, f64)>
where
    S: AsRef<str> + Sync,
    K: Fn(usize) -> bool + Sync,
{
    if params.parallel {
        lines
            .par_iter()
            .enumerate()
            .filter(|(k, _)| !skip(*k))
            .map(|(k, line)| (k, similarity(line.as_ref(), target)))
            .filter(|&(_, score)| score > 0.0)
            .reduce_with(prefer_best)
    } else {
        let mut best: Option<(usize, f64)> = None;
        let mut best_score = 0.0f64;
        for (k, line) in lines.iter().enumerate() {
            if skip(k) {
                continue;
            }
            let score = similarity(line.as_ref(), target);
            if score > best_score {
                best_score = score;
                best = Some((k, score));
            }
        }
        best
    }
}

/// Deterministic max: higher score wins, then lower index.
#[inline]
fn prefer_best(x: (usize, f64), y: (usize, f64)) -> (usize, f64) {
    if y.1 > x.1 || (y.1 == x.1 && y.0 < x.0) {
        y
    } else {
        x
    }
}

/// Item for an A line without a B slot, with its best B line as reference.
fn left_only_item<S>(a: &[S], b: &[S], index: usize, params: &AlignParams) -> AlignmentItem
where
    S: AsRef<str> + Sync,
{
    let line = a[index].as_ref();
    let right_best = best_match(b, line, |_| false, params)
        .filter(|&(_, score)| score > params.threshold)
        .map(|(k, _)| b[k].as_ref());
    let highlighted = highlight(Some(line), right_best);

    AlignmentItem {
        left: Some(line.to_string()),
        left_best: None,
        left_highlighted: highlighted.left,
        left_number: Some(index),
        right: None,
        right_best: right_best.map(str::to_string),
        right_highlighted: highlighted.right,
        right_number: None,
        score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(threshold: f64) -> AlignParams {
        AlignParams {
            threshold,
            parallel: false,
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_sequences() {
        let empty: Vec<String> = Vec::new();
        let result = align_lines(&empty, &empty, &AlignParams::default());
        assert_eq!(result.score, 0.0);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_identical_single_line() {
        let a = lines(&["A"]);
        let result = align_lines(&a, &a, &AlignParams::default());

        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.left.as_deref(), Some("A"));
        assert_eq!(item.right.as_deref(), Some("A"));
        assert_eq!(item.left_number, Some(0));
        assert_eq!(item.right_number, Some(0));
        assert_eq!(item.score, Some(1.0));
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_left_only_input() {
        let a = lines(&["A"]);
        let b: Vec<String> = Vec::new();
        let result = align_lines(&a, &b, &AlignParams::default());

        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.left.as_deref(), Some("A"));
        assert_eq!(item.right, None);
        assert_eq!(item.right_best, None);
        assert_eq!(item.score, None);
        assert_eq!(item.left_highlighted, "~~A~~");
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_right_only_input() {
        let a: Vec<String> = Vec::new();
        let b = lines(&["B"]);
        let result = align_lines(&a, &b, &AlignParams::default());

        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.left, None);
        assert_eq!(item.left_number, None);
        assert_eq!(item.right.as_deref(), Some("B"));
        assert_eq!(item.right_highlighted, "**B**");
        assert_eq!(item.score, Some(similarity("", "B")));
    }

    #[test]
    fn test_threshold_is_strict() {
        // similarity is exactly 0.8
        let a = lines(&["abcde"]);
        let b = lines(&["abcXY"]);

        let result = align_lines(&a, &b, &params(0.8));
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].left, None);
        assert_eq!(result.items[0].score, Some(0.0));
        assert_eq!(result.items[1].left_number, Some(0));
        assert_eq!(result.items[1].right_best, None);

        let result = align_lines(&a, &b, &params(0.79));
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].left_number, Some(0));
        assert_eq!(result.items[0].score, Some(0.8));
    }

    #[test]
    fn test_first_qualifying_line_wins() {
        // a[0] qualifies with a lower score than the exact a[1]
        let a = lines(&["hello worle", "hello world"]);
        let b = lines(&["hello world"]);
        let result = align_lines(&a, &b, &params(0.8));

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].left_number, Some(0));
        assert!(result.items[0].score.unwrap() < 1.0);

        // Exact line is left over, referencing the B line it lost
        let leftover = &result.items[1];
        assert_eq!(leftover.left_number, Some(1));
        assert_eq!(leftover.right_number, None);
        assert_eq!(leftover.right_best.as_deref(), Some("hello world"));
        assert_eq!(leftover.score, None);
    }

    #[test]
    fn test_skipped_lines_are_flushed_before_match() {
        let a = lines(&["Preamble text here", "Deleted paragraph", "The cat sat"]);
        let b = lines(&["The cat sat"]);
        let result = align_lines(&a, &b, &params(0.8));

        let numbers: Vec<_> = result
            .items
            .iter()
            .map(|i| (i.left_number, i.right_number))
            .collect();
        assert_eq!(
            numbers,
            vec![(Some(0), None), (Some(1), None), (Some(2), Some(0))]
        );
        assert_eq!(result.items[0].score, None);
        assert_eq!(result.items[1].score, None);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_skipped_line_references_best_right_line() {
        // "The cat sat down" is skipped to reach the exact match but is
        // still close to b[1]
        let a = lines(&["The cat sat down", "A dog ran"]);
        let b = lines(&["A dog ran", "The cat sat down!"]);
        let result = align_lines(&a, &b, &params(0.8));

        assert_eq!(result.items[0].left_number, Some(0));
        assert_eq!(result.items[0].right_best.as_deref(), Some("The cat sat down!"));
        assert_eq!(result.items[0].right_highlighted, "The cat sat down**!**");

        // b[1] finds nothing sequentially and no unconsumed candidate
        let last = &result.items[2];
        assert_eq!(last.right_number, Some(1));
        assert_eq!(last.left, None);
        assert_eq!(last.left_best, None);
        assert_eq!(last.score, Some(0.0));
    }

    #[test]
    fn test_reworded_line_with_lower_threshold() {
        let a = lines(&["The cat sat", "A dog ran"]);
        let b = lines(&["The cat sat", "A dog sprinted"]);

        let result = align_lines(&a, &b, &params(0.7));
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].score, Some(1.0));

        let second = &result.items[1];
        let score = second.score.unwrap();
        assert!(score > 0.0 && score < 1.0);
        assert!(second.left_highlighted.contains("~~"));
        assert!(second.right_highlighted.contains("**"));
        assert!(second.left_highlighted.starts_with("A dog "));
        assert!(second.right_highlighted.starts_with("A dog "));
        assert!((result.score - (1.0 + score) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_reworded_line_below_default_threshold() {
        let a = lines(&["The cat sat", "A dog ran"]);
        let b = lines(&["The cat sat", "A dog sprinted"]);

        // 17/23 does not clear 0.8
        let result = align_lines(&a, &b, &params(0.8));
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.items[1].left, None);
        assert_eq!(result.items[1].score, Some(0.0));
        assert_eq!(result.items[2].left_number, Some(1));
        assert_eq!(result.items[2].score, None);
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn test_reordered_lines() {
        let a = lines(&["First paragraph", "Second paragraph", "Third paragraph"]);
        let b = lines(&["Third paragraph", "First paragraph", "Second paragraph"]);
        let result = align_lines(&a, &b, &params(0.95));

        // b[0] jumps to a[2], flushing a[0] and a[1]
        let numbers: Vec<_> = result
            .items
            .iter()
            .map(|i| (i.left_number, i.right_number))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (Some(0), None),
                (Some(1), None),
                (Some(2), Some(0)),
                (None, Some(1)),
                (None, Some(2)),
            ]
        );
        assert_eq!(result.items[0].right_best.as_deref(), Some("First paragraph"));
    }

    #[test]
    fn test_progress_called_per_right_line() {
        let a = lines(&["x", "y"]);
        let b = lines(&["x", "y", "z"]);
        let mut steps = 0;
        align_lines_with_progress(&a, &b, &params(0.8), || steps += 1);
        assert_eq!(steps, 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let a = lines(&[
            "Recalling its previous resolutions",
            "Welcomes the report of the Secretary-General",
            "Decides to remain seized of the matter",
            "Requests a report at its next session",
            "Notes with concern the situation",
        ]);
        let b = lines(&[
            "Recalling all its previous resolutions",
            "Notes with grave concern the situation",
            "Welcomes the reports of the Secretary-General",
            "Decides to remain actively seized of the matter",
        ]);

        for threshold in [0.5, 0.8, 0.9] {
            let seq = align_lines(&a, &b, &AlignParams { threshold, parallel: false });
            let par = align_lines(&a, &b, &AlignParams { threshold, parallel: true });
            assert_eq!(seq, par, "threshold {}", threshold);
        }
    }

    #[test]
    fn test_prefer_best_tie_break() {
        assert_eq!(prefer_best((3, 0.9), (1, 0.9)), (1, 0.9));
        assert_eq!(prefer_best((1, 0.9), (3, 0.9)), (1, 0.9));
        assert_eq!(prefer_best((1, 0.5), (3, 0.9)), (3, 0.9));
    }

    #[test]
    fn test_best_match_ignores_zero_scores() {
        // Only an empty side scores 0
        let b = lines(&["xyz"]);
        assert_eq!(best_match(&b, "", |_| false, &params(0.8)), None);
        assert_eq!(best_match(&b, "abc", |_| false, &params(0.8)), Some((0, 0.5)));
        assert_eq!(best_match(&b, "xyz", |_| true, &params(0.8)), None);
        let b = lines(&["abd", "abc", "abc"]);
        assert_eq!(best_match(&b, "abc", |_| false, &params(0.8)), Some((1, 1.0)));
        assert_eq!(best_match(&b, "abc", |k| k == 1, &params(0.8)), Some((2, 1.0)));
    }
}
