//! Username helpers: whitelist tests, nicknames, trust, blacklist
//! scanning, and deterministic temporary-alias generation.

use wordwarden_types::Dataset;

use crate::censor::word_in_whitelists;

/// Tests whether a username is safe to display.
///
/// The whole lowercased name is tried first; failing that, every
/// underscore-separated segment must be whitelisted on its own.
pub fn username_in_whitelist(ds: &Dataset, username: &str) -> bool {
    let lower = username.to_lowercase();
    if word_in_whitelists(ds, &lower) {
        return true;
    }
    lower.split('_').all(|segment| word_in_whitelists(ds, segment))
}

/// Returns `true` if the user predates the whitelist system and was
/// never banned. Trusted users bypass censorship entirely.
pub fn user_is_trusted(ds: &Dataset, username: &str) -> bool {
    ds.trusted_usernames.contains(&username.to_lowercase())
}

/// Looks up the user's preferred display alias, if one is set.
pub fn user_nickname(ds: &Dataset, username: &str) -> Option<String> {
    ds.nicknames.get(&username.to_lowercase()).cloned()
}

/// Collects message tokens whose lowercase form is blacklisted.
///
/// Tokens are matched verbatim (punctuation included) after non-ASCII
/// bytes are stripped; the returned words keep their original casing
/// for the sender-facing notice.
pub fn blacklisted_words(ds: &Dataset, message: &str) -> Vec<String> {
    let ascii: String = message.chars().filter(|c| c.is_ascii()).collect();
    ascii
        .split(' ')
        .filter(|token| !token.is_empty() && ds.blacklist.contains(&token.to_lowercase()))
        .map(|token| token.to_string())
        .collect()
}

/// Derives a deterministic two-word alias from a seed string.
///
/// The seed's ASCII byte values are summed and used to index the
/// sorted prefix and suffix lists, so the same seed always yields the
/// same alias. Returns `None` when either list is empty.
pub fn temp_username(ds: &Dataset, seed: &str) -> Option<String> {
    let mut prefixes: Vec<&String> = ds.random_prefixes.iter().collect();
    let mut suffixes: Vec<&String> = ds.random_suffixes.iter().collect();
    if prefixes.is_empty() || suffixes.is_empty() {
        return None;
    }
    prefixes.sort();
    suffixes.sort();

    let seed_number: usize = seed
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| c as usize)
        .sum();

    let prefix = prefixes[seed_number % prefixes.len()];
    let suffix = suffixes[seed_number % suffixes.len()];
    Some(format!("{}{}", capitalize(prefix), capitalize(suffix)))
}

/// Uppercases the first character of a word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_username_match() {
        let mut ds = Dataset::default();
        ds.usernames.insert("cool_guy".into());
        assert!(username_in_whitelist(&ds, "Cool_Guy"));
    }

    #[test]
    fn underscore_segments_each_checked() {
        let mut ds = Dataset::default();
        ds.dictionary.insert("cool".into());
        ds.dictionary.insert("guy".into());

        assert!(username_in_whitelist(&ds, "cool_guy"));
        assert!(!username_in_whitelist(&ds, "cool_stranger"));
    }

    #[test]
    fn unlisted_plain_username_rejected() {
        let ds = Dataset::default();
        assert!(!username_in_whitelist(&ds, "nobody"));
    }

    #[test]
    fn trusted_lookup_is_case_insensitive() {
        let mut ds = Dataset::default();
        ds.trusted_usernames.insert("veteran".into());
        assert!(user_is_trusted(&ds, "Veteran"));
        assert!(!user_is_trusted(&ds, "newcomer"));
    }

    #[test]
    fn nickname_lookup_lowercases_key() {
        let mut ds = Dataset::default();
        ds.nicknames.insert("someuser".into(), "Ace".into());
        assert_eq!(user_nickname(&ds, "SomeUser"), Some("Ace".into()));
        assert_eq!(user_nickname(&ds, "other"), None);
    }

    #[test]
    fn blacklist_scan_keeps_original_casing() {
        let mut ds = Dataset::default();
        ds.blacklist.insert("slur".into());

        let found = blacklisted_words(&ds, "well Slur happened");
        assert_eq!(found, vec!["Slur".to_string()]);
    }

    #[test]
    fn blacklist_matches_tokens_verbatim() {
        let mut ds = Dataset::default();
        ds.blacklist.insert("slur".into());

        // Punctuation keeps the token from matching; the censor pass
        // handles that shape instead.
        assert!(blacklisted_words(&ds, "slur!").is_empty());
        assert_eq!(blacklisted_words(&ds, "slur"), vec!["slur".to_string()]);
    }

    #[test]
    fn temp_username_is_deterministic() {
        let mut ds = Dataset::default();
        ds.random_prefixes.extend(["happy".to_string(), "quiet".to_string()]);
        ds.random_suffixes.extend(["tiger".to_string(), "otter".to_string()]);

        let first = temp_username(&ds, "SomeSeed");
        let second = temp_username(&ds, "SomeSeed");
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn temp_username_indexes_sorted_lists() {
        let mut ds = Dataset::default();
        ds.random_prefixes.extend(["happy".to_string(), "quiet".to_string()]);
        ds.random_suffixes.extend(["tiger".to_string(), "otter".to_string()]);

        // "ab" sums to 195, odd: second entry of each sorted list.
        assert_eq!(temp_username(&ds, "ab"), Some("QuietTiger".into()));
        // "ac" sums to 196, even: first entry of each sorted list.
        assert_eq!(temp_username(&ds, "ac"), Some("HappyOtter".into()));
    }

    #[test]
    fn temp_username_ignores_non_ascii_seed_bytes() {
        let mut ds = Dataset::default();
        ds.random_prefixes.insert("happy".into());
        ds.random_suffixes.insert("tiger".into());

        assert_eq!(temp_username(&ds, "séed"), temp_username(&ds, "sed"));
    }

    #[test]
    fn temp_username_empty_lists_yield_none() {
        let ds = Dataset::default();
        assert_eq!(temp_username(&ds, "anyone"), None);
    }
}
