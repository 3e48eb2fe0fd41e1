//! Pure censorship engine.
//!
//! Everything in this crate is a deterministic function from a
//! [`Dataset`](wordwarden_types::Dataset) snapshot and input text to a
//! result — no I/O, no clocks, no state between calls. The engine
//! never fails: a word that cannot be matched by any tolerance rule is
//! censored, which is its natural failure mode.

mod censor;
mod username;

pub use censor::{censor, word_in_whitelists, CensorOutcome};
pub use username::{
    blacklisted_words, temp_username, user_is_trusted, user_nickname, username_in_whitelist,
};
