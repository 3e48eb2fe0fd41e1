//! Full-message censorship scenarios across the engine surface.

use wordwarden_engine::{blacklisted_words, censor, temp_username, username_in_whitelist};
use wordwarden_types::Dataset;

fn realistic_dataset() -> Dataset {
    let mut ds = Dataset::default();
    ds.dictionary
        .extend(["the", "quick", "brown", "fox", "jumps"].map(String::from));
    ds.custom.extend(["pogchamp"].map(String::from));
    ds.usernames.extend(["streamer_one"].map(String::from));
    ds.random_prefixes
        .extend(["happy", "quiet"].map(String::from));
    ds.random_suffixes
        .extend(["tiger", "otter"].map(String::from));
    ds.blacklist.extend(["slur"].map(String::from));
    ds
}

#[test]
fn clean_sentence_passes_untouched() {
    let ds = realistic_dataset();
    let outcome = censor(&ds, "the quick brown fox jumps");
    assert_eq!(outcome.censored, "the quick brown fox jumps");
    assert!(outcome.rejected.is_empty());
}

#[test]
fn unknown_words_masked_in_place() {
    let ds = realistic_dataset();
    let outcome = censor(&ds, "the quick zorgon fox");
    assert_eq!(outcome.censored, "the quick ****** fox");
    assert_eq!(outcome.rejected, vec!["zorgon".to_string()]);
}

#[test]
fn emote_variants_tolerated() {
    let ds = realistic_dataset();
    // Stretched emote and plural both resolve to whitelisted forms.
    for input in ["pogchampppp", "pogchamps"] {
        let outcome = censor(&ds, input);
        assert!(outcome.rejected.is_empty(), "{input} was rejected");
        assert_eq!(outcome.censored, input);
    }
}

#[test]
fn assigned_alias_mentions_are_safe() {
    let ds = realistic_dataset();
    let alias = temp_username(&ds, "newuser123").expect("generator lists populated");

    let message = format!("the quick {alias}");
    let outcome = censor(&ds, &message);
    assert_eq!(outcome.censored, message);
    assert!(outcome.rejected.is_empty());
}

#[test]
fn username_whitelist_covers_segmented_names() {
    let ds = realistic_dataset();
    assert!(username_in_whitelist(&ds, "streamer_one"));
    assert!(username_in_whitelist(&ds, "quick_fox"));
    assert!(!username_in_whitelist(&ds, "zorgon_fox"));
}

#[test]
fn blacklist_scan_is_independent_of_censorship() {
    let ds = realistic_dataset();
    let hits = blacklisted_words(&ds, "the slur returns");
    assert_eq!(hits, vec!["slur".to_string()]);

    // The censor itself masks rather than flags; flagging is the
    // orchestrator's decision.
    let outcome = censor(&ds, "the slur returns");
    assert_eq!(outcome.censored, "the **** *******");
}
