//! Percent-encoding with the same reserved set as JavaScript's
//! `encodeURIComponent`, which is what Things and Shortcuts expect.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Builds `base?k1=v1&k2=v2` with every value percent-encoded.
/// Pairs with an empty value are skipped when `skip_empty` is set.
pub fn build_url(base: &str, params: &[(&str, &str)], skip_empty: bool) -> String {
    let query: Vec<String> = params
        .iter()
        .filter(|(_, v)| !(skip_empty && v.is_empty()))
        .map(|(k, v)| format!("{}={}", k, encode_component(v)))
        .collect();

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component_matches_js() {
        assert_eq!(encode_component("Buy milk"), "Buy%20milk");
        assert_eq!(encode_component("a&b=c/d"), "a%26b%3Dc%2Fd");
        assert_eq!(encode_component("it's (fine)!*~._-"), "it's%20(fine)!*~._-");
        assert_eq!(encode_component("\n"), "%0A");
        assert_eq!(encode_component("café"), "caf%C3%A9");
    }

    #[test]
    fn test_build_url_skips_empty() {
        let url = build_url("things:///add", &[("title", "x y"), ("list", "")], true);
        assert_eq!(url, "things:///add?title=x%20y");

        let url = build_url("things:///add", &[("title", "x"), ("list", "")], false);
        assert_eq!(url, "things:///add?title=x&list=");
    }
}
