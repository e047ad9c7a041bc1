//! Message content heuristics
//!
//! Pre-submission filter for the optional free-text message attached to a
//! song. Pure policy: rejects text a human would not have typed (spam runs,
//! keyboard mashing, numeral floods). May be disabled in configuration
//! without affecting any core invariant.

use jukeq_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 200;

/// Longest allowed run of one repeated character
const MAX_CHAR_RUN: usize = 4;

static LETTER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{10,}").unwrap());

static SPECIAL_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*()_+=\-\[\]{};:'",.<>/?\\|]{4,}"#).unwrap());

/// Validate a non-empty message against the content heuristics
///
/// Each rejection names the specific reason so the submitter can correct it.
pub fn validate(text: &str) -> Result<()> {
    let length = text.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&length) {
        return Err(Error::InvalidMessage(format!(
            "message must be between {} and {} characters",
            MIN_LEN, MAX_LEN
        )));
    }

    if has_repeated_run(text) {
        return Err(Error::InvalidMessage(
            "message contains too many repeated characters".to_string(),
        ));
    }

    // A long unbroken letter sequence with no whitespace anywhere reads as
    // keyboard mashing
    if LETTER_RUN.is_match(text) && !text.contains(char::is_whitespace) {
        return Err(Error::InvalidMessage(
            "message looks like a random character string".to_string(),
        ));
    }

    if SPECIAL_RUN.is_match(text) {
        return Err(Error::InvalidMessage(
            "message contains too many special characters".to_string(),
        ));
    }

    let letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    if digits > letters * 2 {
        return Err(Error::InvalidMessage(
            "message contains too many numerals".to_string(),
        ));
    }

    Ok(())
}

/// More than `MAX_CHAR_RUN` consecutive occurrences of one character
///
/// The `regex` crate has no backreferences, so the run check is a char scan.
fn has_repeated_run(text: &str) -> bool {
    let mut run = 0usize;
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
            if run > MAX_CHAR_RUN {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_messages() {
        assert!(validate("for the night shift crew").is_ok());
        assert!(validate("hi").is_ok());
        assert!(validate("happy birthday Lan! 20 today").is_ok());
    }

    #[test]
    fn rejects_too_short_and_too_long() {
        assert!(validate("x").is_err());
        assert!(validate(&"a ".repeat(101)).is_err());
    }

    #[test]
    fn boundary_lengths_pass() {
        assert!(validate("ab").is_ok());
        let exactly_200: String = "ab ".repeat(66).chars().take(200).collect();
        assert!(validate(&exactly_200).is_ok());
    }

    #[test]
    fn rejects_repeated_character_runs() {
        assert!(validate("soooooo good").is_err());
        // Four in a row is still fine
        assert!(validate("sooo good").is_ok());
    }

    #[test]
    fn rejects_whitespace_free_letter_mash() {
        assert!(validate("qwertyuiopasdfgh").is_err());
        // Same letters with spaces read as words
        assert!(validate("qwerty uiop asdfgh").is_ok());
    }

    #[test]
    fn rejects_special_character_runs() {
        assert!(validate("what?!?!?").is_err());
        assert!(validate("nice song :)").is_ok());
    }

    #[test]
    fn rejects_numeral_floods() {
        assert!(validate("123456789 ok").is_err());
        assert!(validate("track 42").is_ok());
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(validate("âm nhạc là cuộc sống").is_ok());
        // 200 multibyte characters exceed 200 bytes but sit at the cap
        let at_cap: String = "đê ".repeat(67).chars().take(200).collect();
        assert!(validate(&at_cap).is_ok());
    }
}
