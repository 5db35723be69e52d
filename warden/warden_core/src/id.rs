//! Identity normalization.
//!
//! Every cache key in a world is a normalized string. Group keys are the
//! lowercased group name with color codes removed. User keys are stable keys
//! (hyphenated UUIDs); display names are translated through an
//! [`IdentityLookup`] before they ever touch a cache.
//!
//! # Examples
//!
//! ```
//! use warden_core::id::normalize;
//!
//! assert_eq!(normalize("\u{a7}cAdmin"), "admin");
//! assert_eq!(normalize(&normalize("\u{a7}cAdmin")), "admin");
//! ```

use uuid::Uuid;

use crate::error::IdentityError;
use crate::traits::IdentityLookup;

/// The escape marker that introduces a color code.
pub const COLOR_CHAR: char = '\u{00A7}';

/// Check whether `c` may follow [`COLOR_CHAR`] to form a color code.
fn is_color_code(c: char) -> bool {
    matches!(
        c.to_ascii_lowercase(),
        '0'..='9' | 'a'..='f' | 'k'..='o' | 'r'
    )
}

/// Strip every color code from `input`.
///
/// Removal is applied until no `§` + code pair remains, so `"§§aa"` strips
/// to the empty string rather than leaving a freshly formed `"§a"` behind.
pub fn strip_color(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_color_code(c) && out.ends_with(COLOR_CHAR) {
            out.pop();
            continue;
        }
        out.push(c);
    }
    out
}

/// Normalize a name into a cache key.
///
/// Lowercasing happens before stripping so that no lowercase mapping can
/// produce a new color code after the strip.
pub fn normalize(input: &str) -> String {
    strip_color(&input.to_lowercase())
}

/// Normalize an optional name. An absent name stays absent.
pub fn normalize_opt(input: Option<&str>) -> Option<String> {
    input.map(normalize)
}

/// Check whether `s` is a hyphenated UUID.
pub fn is_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::parse_str(s).is_ok()
}

/// Translate a user name into its stable key.
///
/// A name that is already stable-key shaped is returned normalized. Anything
/// else is treated as a display name and handed to `lookup`; its failure is
/// propagated instead of fabricating a key.
pub fn resolve_user_key(
    name: &str,
    lookup: &dyn IdentityLookup,
) -> Result<String, IdentityError> {
    let key = normalize(name);
    if lookup.is_stable_key_shaped(&key) {
        return Ok(key);
    }

    let uuid = lookup.resolve_stable_key(&key)?;
    Ok(uuid.hyphenated().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLookup;

    impl IdentityLookup for FixedLookup {
        fn resolve_stable_key(&self, display_name: &str) -> Result<Uuid, IdentityError> {
            match display_name {
                "alice" => Ok(Uuid::parse_str("6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10").unwrap()),
                other => Err(IdentityError::LookupFailed(other.to_string())),
            }
        }
    }

    #[test]
    fn test_strip_color() {
        assert_eq!(strip_color("\u{a7}aHello \u{a7}lWorld"), "Hello World");
        assert_eq!(strip_color("\u{a7}Rreset"), "reset");
        assert_eq!(strip_color("no codes"), "no codes");
        // Not a color code, so the marker stays.
        assert_eq!(strip_color("\u{a7}zz"), "\u{a7}zz");
        assert_eq!(strip_color("trailing\u{a7}"), "trailing\u{a7}");
    }

    #[test]
    fn test_strip_color_nested_markers() {
        assert_eq!(strip_color("\u{a7}\u{a7}aa"), "");
        assert_eq!(strip_color("x\u{a7}\u{a7}ay"), "x\u{a7}y");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\u{a7}6Moderators"), "moderators");
        assert_eq!(normalize("ADMIN"), "admin");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some("Builder")), Some("builder".to_string()));
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "Admin",
            "\u{a7}aGreen\u{a7}r",
            "\u{a7}\u{a7}AA",
            "\u{a7}\u{212a}",
            "ΣΑΣ",
            "\u{a7}",
            "mixed \u{a7}K\u{a7}kCase",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10"));
        assert!(!is_uuid("6f1c2a8e0d4b4c559a432f0f5f1e9b10"));
        assert!(!is_uuid("alice"));
    }

    #[test]
    fn test_resolve_user_key() {
        let lookup = FixedLookup;
        assert_eq!(
            resolve_user_key("\u{a7}bAlice", &lookup).unwrap(),
            "6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10"
        );
        assert_eq!(
            resolve_user_key("6F1C2A8E-0D4B-4C55-9A43-2F0F5F1E9B10", &lookup).unwrap(),
            "6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10"
        );
        assert_eq!(
            resolve_user_key("Bob", &lookup),
            Err(IdentityError::LookupFailed("bob".to_string()))
        );
    }
}
