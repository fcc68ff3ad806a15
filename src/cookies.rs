//! Cookie header translation.
//!
//! Parses the raw `Cookie` request header into a key/value mapping for the
//! query normalizer. Outbound cookie formatting is owned by the dispatcher.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Parse a raw `Cookie` header value into a key/value mapping.
///
/// Pairs are split on `;`, then on the first `=`. Pairs with no `=`, an
/// empty key, or an empty value are dropped. Both key and value are
/// percent-decoded and trimmed.
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for pair in raw.split(';') {
        let pair = pair.trim();
        let crack = match pair.find('=') {
            Some(idx) => idx,
            None => continue,
        };
        if crack == 0 || crack == pair.len() - 1 {
            continue;
        }

        let key = decode_component(&pair[..crack]);
        let value = decode_component(&pair[crack + 1..]);
        cookies.insert(key.trim().to_string(), value.trim().to_string());
    }

    cookies
}

fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_pairs() {
        let cookies = parse_cookie_header("a=1; b=2");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("a"), Some(&"1".to_string()));
        assert_eq!(cookies.get("b"), Some(&"2".to_string()));
    }

    #[test]
    fn test_malformed_pairs_dropped() {
        let cookies = parse_cookie_header("a=1; b=2; bad; =emptykey");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("a"), Some(&"1".to_string()));
        assert_eq!(cookies.get("b"), Some(&"2".to_string()));
        assert!(!cookies.contains_key("bad"));
        assert!(!cookies.contains_key(""));
    }

    #[test]
    fn test_empty_value_dropped() {
        let cookies = parse_cookie_header("a=1; empty=");
        assert_eq!(cookies.len(), 1);
        assert!(!cookies.contains_key("empty"));
    }

    #[test]
    fn test_percent_decoding() {
        let cookies = parse_cookie_header("MUSIC_U=abc%3D%3D; nick=%E6%AD%8C%E8%BF%B7");
        assert_eq!(cookies.get("MUSIC_U"), Some(&"abc==".to_string()));
        assert_eq!(cookies.get("nick"), Some(&"歌迷".to_string()));
    }

    #[test]
    fn test_value_containing_equals() {
        // Only the first '=' splits the pair
        let cookies = parse_cookie_header("token=a=b=c");
        assert_eq!(cookies.get("token"), Some(&"a=b=c".to_string()));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let cookies = parse_cookie_header("  a = 1 ;b=2");
        assert_eq!(cookies.get("a"), Some(&"1".to_string()));
        assert_eq!(cookies.get("b"), Some(&"2".to_string()));
    }

    #[test]
    fn test_empty_header() {
        assert!(parse_cookie_header("").is_empty());
    }
}
