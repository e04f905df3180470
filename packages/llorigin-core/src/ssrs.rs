//! Server-Side Representation Switching: name parsing and the digit
//! rewrite that downshifts a lagging client's requested quality.

use once_cell::sync::Lazy;
use regex::Regex;

static QUALITY_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"stream(\d+)").unwrap());
static SEGMENT_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d+)\.m4s$").unwrap());
static FIRST_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

/// Extracts the quality index from an object name's `stream<N>` token,
/// e.g. `chunk-stream2-00048.m4s` → `Some(2)`.
pub fn quality_index(name: &str) -> Option<usize> {
    QUALITY_INDEX_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the trailing segment number from a chunk name,
/// e.g. `chunk-stream2-00048.m4s` → `Some(48)`.
pub fn segment_number(name: &str) -> Option<u64> {
    SEGMENT_NUMBER_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Computes the SSRS target representation index given the live edge
/// (`current_segment`), the client's requested segment number, and the
/// stream's max adaptation-set index. `lag` is measured in whole segments;
/// target is clamped to `[0, max_adaptation_set]`.
pub fn target_representation(
    current_segment: u64,
    requested_segment: u64,
    max_adaptation_set: usize,
) -> usize {
    let lag = current_segment.saturating_sub(requested_segment);
    let target = (max_adaptation_set as i64) - (lag as i64);
    target.clamp(0, max_adaptation_set as i64) as usize
}

/// Rewrites the first ASCII digit anywhere in `name` to `target`.
///
/// This is a deliberately literal rewrite: if the stream id itself
/// contains a digit earlier in the name, that digit is rewritten instead
/// of the quality-index digit. Object names are expected to follow the
/// `chunk-stream<N>-<segment>.m4s` / `init-stream<N>...` convention, where
/// the first digit is always the quality index, so this holds in practice;
/// a stream id containing a digit (e.g. `stream10`) would need the name
/// grammar tightened to target the digits following the `stream` token
/// specifically.
pub fn rewrite_first_digit(name: &str, target: usize) -> String {
    let replacement = target.to_string();
    let mut replaced_once = false;
    FIRST_DIGIT_RE
        .replace(name, |_: &regex::Captures| {
            if replaced_once {
                unreachable!("replace (not replacen) only invokes the closure once")
            }
            replaced_once = true;
            replacement.clone()
        })
        .into_owned()
}
