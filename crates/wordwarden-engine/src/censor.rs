//! Word-level censorship of chat messages.
//!
//! [`censor`] splits a message on single spaces and routes every token
//! through a fixed sequence of checks:
//!
//! 1. Whole-token whitelist membership (covers underscored usernames).
//! 2. Whitelist membership of the alphabetic-only form.
//! 3. Temporary-username detection (known prefix + exact suffix).
//! 4. Morphological tolerance (strip `s`/`ve`/`d`/`ed`/`less`/`ing`,
//!    append `g`).
//! 5. Stretched-character tolerance ("testtttt" → "test").
//! 6. Duplicate-run collapse ("qqwweerrttyy" → "qwerty").
//!
//! The first accepting check wins; this order MUST NOT change.
//! Single-letter tokens are buffered and judged as one word so spaced
//! out evasion ("b a d") cannot slip through.

use wordwarden_types::Dataset;

/// Suffixes stripped when testing morphological variants (plurals,
/// possessives, tenses).
const STRIPPED_SUFFIXES: [&str; 6] = ["s", "ve", "d", "ed", "less", "ing"];

/// Suffixes appended when testing dropped-letter variants
/// ("makin" → "making").
const APPENDED_SUFFIXES: [&str; 1] = ["g"];

/// Upper bound on collapsible runs considered by the power-set
/// enumeration; beyond this only the all-runs-to-two candidate is
/// tried.
const MAX_COLLAPSIBLE_RUNS: usize = 16;

// ---------------------------------------------------------------------------
// CensorOutcome
// ---------------------------------------------------------------------------

/// Result of censoring one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CensorOutcome {
    /// The message with every rejected word replaced by asterisks.
    pub censored: String,
    /// Lowercased rejected words, in encounter order.
    pub rejected: Vec<String>,
}

// ---------------------------------------------------------------------------
// Whitelist membership
// ---------------------------------------------------------------------------

/// Short-circuit membership test across every whitelist set.
///
/// Ordered by expected set size, smallest first. Order affects lookup
/// cost only, never the result.
pub fn word_in_whitelists(ds: &Dataset, word: &str) -> bool {
    ds.custom.contains(word)
        || ds.random_prefixes.contains(word)
        || ds.random_suffixes.contains(word)
        || ds.nicknames_set.contains(word)
        || ds.trusted_usernames.contains(word)
        || ds.usernames.contains(word)
        || ds.sorted_bulk.contains(word)
        || ds.custom_legacy.contains(word)
        || ds.dictionary.contains(word)
}

// ---------------------------------------------------------------------------
// censor
// ---------------------------------------------------------------------------

/// Censors a message against the dataset's whitelists.
///
/// Deterministic and side-effect free. Non-ASCII bytes are stripped
/// before processing. Tokens that clean down to nothing (numeric or
/// punctuation-only) pass through unchanged; everything else is either
/// accepted by one of the tolerance checks or masked with asterisks
/// and reported in [`CensorOutcome::rejected`].
pub fn censor(ds: &Dataset, raw_message: &str) -> CensorOutcome {
    let ascii: String = raw_message.chars().filter(|c| c.is_ascii()).collect();

    let mut rejected: Vec<String> = Vec::new();
    let mut assembly: Vec<String> = Vec::new();
    let mut spaced_buffer = String::new();

    for token in ascii.split(' ') {
        let clean: String = token
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        // Single letters feed the spaced-out-word buffer and emit
        // nothing until the buffer flushes.
        if clean.len() == 1 {
            spaced_buffer.push_str(&clean);
            continue;
        }

        if !spaced_buffer.is_empty() {
            assembly.push(flush_spaced_buffer(ds, &mut spaced_buffer, &mut rejected));
        }

        assembly.push(process_token(ds, token, &clean, &mut rejected));
    }

    // A message ending in single-letter tokens still flushes.
    if !spaced_buffer.is_empty() {
        assembly.push(flush_spaced_buffer(ds, &mut spaced_buffer, &mut rejected));
    }

    CensorOutcome {
        censored: assembly.join(" "),
        rejected,
    }
}

/// Judges the accumulated single-letter buffer as one word, then
/// re-expands it into the spaced form the sender typed.
fn flush_spaced_buffer(
    ds: &Dataset,
    buffer: &mut String,
    rejected: &mut Vec<String>,
) -> String {
    let word = std::mem::take(buffer);
    let lower = word.to_lowercase();

    let emitted = if word_in_whitelists(ds, &lower) {
        word
    } else {
        rejected.push(lower);
        "*".repeat(word.len())
    };

    let letters: Vec<String> = emitted.chars().map(|c| c.to_string()).collect();
    letters.join(" ")
}

/// Runs one multi-letter token through the acceptance checks; masks it
/// on rejection.
fn process_token(
    ds: &Dataset,
    original: &str,
    clean: &str,
    rejected: &mut Vec<String>,
) -> String {
    if clean.is_empty() {
        return original.to_string();
    }

    // Whole-token membership first: usernames may legitimately
    // contain underscores that the alphabetic filter would strip.
    let lower_token = original.to_lowercase();
    if word_in_whitelists(ds, &lower_token) {
        return original.to_string();
    }

    let lower = clean.to_lowercase();
    if word_in_whitelists(ds, &lower)
        || is_temp_username(ds, &lower)
        || suffix_tolerated(ds, &lower)
        || stretched_tolerated(ds, &lower)
        || duplicate_runs_tolerated(ds, &lower)
    {
        return original.to_string();
    }

    rejected.push(lower);
    mask_token(original, clean)
}

// ---------------------------------------------------------------------------
// Acceptance checks
// ---------------------------------------------------------------------------

/// Detects mentions of system-assigned temporary usernames: a known
/// random prefix whose remainder exactly equals a known random suffix.
fn is_temp_username(ds: &Dataset, lower: &str) -> bool {
    for prefix in &ds.random_prefixes {
        if let Some(remainder) = lower.strip_prefix(prefix.as_str()) {
            if ds.random_suffixes.contains(remainder) {
                return true;
            }
        }
    }
    false
}

/// Accepts common morphological variants of whitelisted words.
fn suffix_tolerated(ds: &Dataset, lower: &str) -> bool {
    for suffix in STRIPPED_SUFFIXES {
        if let Some(truncated) = lower.strip_suffix(suffix) {
            if !truncated.is_empty() && word_in_whitelists(ds, truncated) {
                return true;
            }
        }
    }

    for suffix in APPENDED_SUFFIXES {
        let supplemented = format!("{lower}{suffix}");
        if word_in_whitelists(ds, &supplemented) {
            return true;
        }
    }

    false
}

/// Accepts words with a stretched trailing run ("testtttt" → "test").
///
/// Trims one trailing character at a time while it equals its
/// predecessor, testing each prefix of length ≥ 3. A match anywhere in
/// the shrink sequence accepts the original token unmodified.
fn stretched_tolerated(ds: &Dataset, lower: &str) -> bool {
    let chars: Vec<char> = lower.chars().collect();
    if chars.len() < 3 {
        return false;
    }

    let mut end = chars.len() - 1;
    while end > 2 && chars[end] == chars[end - 1] {
        let attempt: String = chars[..end].iter().collect();
        if word_in_whitelists(ds, &attempt) {
            return true;
        }
        end -= 1;
    }
    false
}

/// Accepts words whose duplicated character runs collapse to a
/// whitelisted form ("qqwwweeeerrrrrttttttyyyyyyy" → "qwerty").
///
/// Tries the all-runs-to-two candidate first, then iterates the power
/// set of per-run lengths {2, 1} by bitmask.
fn duplicate_runs_tolerated(ds: &Dataset, lower: &str) -> bool {
    let runs = char_runs(lower);
    let collapsible = runs.iter().filter(|&&(_, len)| len >= 2).count();
    if collapsible == 0 {
        return false;
    }

    if word_in_whitelists(ds, &collapse_variant(&runs, 0)) {
        return true;
    }

    if collapsible > MAX_COLLAPSIBLE_RUNS {
        return false;
    }

    for mask in 1..(1u64 << collapsible) {
        if word_in_whitelists(ds, &collapse_variant(&runs, mask)) {
            return true;
        }
    }
    false
}

/// Splits a word into maximal runs of one repeated character.
fn char_runs(word: &str) -> Vec<(char, usize)> {
    let mut runs: Vec<(char, usize)> = Vec::new();
    for ch in word.chars() {
        match runs.last_mut() {
            Some((last, len)) if *last == ch => *len += 1,
            _ => runs.push((ch, 1)),
        }
    }
    runs
}

/// Rebuilds a word from its runs, shortening each collapsible run to
/// two characters, or to one where the run's mask bit is set.
fn collapse_variant(runs: &[(char, usize)], mask: u64) -> String {
    let mut out = String::new();
    let mut run_index = 0;
    for &(ch, len) in runs {
        let emit = if len >= 2 {
            let keep = if mask >> run_index & 1 == 1 { 1 } else { 2 };
            run_index += 1;
            keep
        } else {
            1
        };
        for _ in 0..emit {
            out.push(ch);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Masking
// ---------------------------------------------------------------------------

/// Replaces the alphabetic span of a rejected token with asterisks.
///
/// If punctuation is interleaved so the span is not contiguous, the
/// whole token is masked instead.
fn mask_token(original: &str, clean: &str) -> String {
    match original.find(clean) {
        Some(pos) => {
            let mut masked = String::with_capacity(original.len());
            masked.push_str(&original[..pos]);
            masked.extend(std::iter::repeat('*').take(clean.len()));
            masked.push_str(&original[pos + clean.len()..]);
            masked
        }
        None => "*".repeat(original.chars().count()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
