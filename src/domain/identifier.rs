//! Identifier rules for entries and groups.

use crate::domain::error::{SettingsError, SettingsResult};

/// Characters that may never appear in an id. `.` is the path separator.
pub const INVALID_ID_CHARS: [char; 2] = ['.', ' '];

/// True iff `id` contains none of [`INVALID_ID_CHARS`].
pub fn is_valid(id: &str) -> bool {
    !id.contains(&INVALID_ID_CHARS[..])
}

/// Illegal characters of `s`, each reported once in first-seen order.
pub fn invalid_chars_in(s: &str) -> Vec<char> {
    let mut found = Vec::new();
    for c in s.chars().filter(|c| INVALID_ID_CHARS.contains(c)) {
        if !found.contains(&c) {
            found.push(c);
        }
    }
    found
}

/// Validate an id for use as a node name. Empty ids are rejected as well.
pub fn validate(id: &str) -> SettingsResult<()> {
    if id.is_empty() {
        return Err(SettingsError::InvalidIdentifier {
            id: String::new(),
            illegal: "<empty>".to_string(),
        });
    }
    if !is_valid(id) {
        return Err(SettingsError::InvalidIdentifier {
            id: id.to_string(),
            illegal: invalid_chars_in(id).into_iter().collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Root1", true)]
    #[case("G1-String", true)]
    #[case("invalid.id", false)]
    #[case("invalid id", false)]
    #[case("even more.id", false)]
    fn test_is_valid(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(is_valid(id), expected);
    }

    #[test]
    fn test_invalid_chars_in_keeps_first_seen_order() {
        assert_eq!(invalid_chars_in("a b.c d.e"), vec![' ', '.']);
        assert_eq!(invalid_chars_in("a.b c"), vec!['.', ' ']);
        assert!(invalid_chars_in("clean").is_empty());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            validate(""),
            Err(SettingsError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_validate_reports_illegal_chars() {
        match validate("Invalid  Entry.x") {
            Err(SettingsError::InvalidIdentifier { id, illegal }) => {
                assert_eq!(id, "Invalid  Entry.x");
                assert_eq!(illegal, " .");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
