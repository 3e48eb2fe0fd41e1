//! Channel announcements for accepted whitelist updates.
//!
//! The chat-platform bot that actually posts these lines lives
//! outside this system; the client only formats them and hands them
//! to the announcement channel.

/// Formats the channel announcement for one approved word.
pub fn announcement_line(word: &str, is_username: bool) -> String {
    if is_username {
        format!("[The username \"{word}\" has been approved.]")
    } else {
        format!("[The word \"{word}\" has been added to the whitelist.]")
    }
}
