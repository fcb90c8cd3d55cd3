//! OAuth 1.0a HMAC-SHA1 signature generation (RFC 5849 Section 3.4).

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode string per RFC 3986.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Build the normalized parameter string (RFC 5849 Section 3.4.1.3.2).
///
/// Pairs are encoded first and then sorted as whole `key=value` strings,
/// so the result does not depend on input order.
pub fn canonical_parameters<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                percent_encode(k.as_ref()),
                percent_encode(v.as_ref())
            )
        })
        .collect();
    pairs.sort_unstable();
    pairs.join("&")
}

/// Build the signing key from the consumer secret and token secret.
///
/// `token_secret` is empty before any token has been issued.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

/// Compute HMAC-SHA1 and return the base64-encoded digest.
fn hmac_sha1_base64(key: &str, data: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Computes request signatures against a fixed provider base URL.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    base_url: String,
}

impl SignatureEngine {
    /// Create an engine for the given base URL (trailing slash is ignored).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Provider base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn request_url(&self, request_path: &str) -> String {
        format!("{}/{}", self.base_url, request_path.trim_start_matches('/'))
    }

    /// Build signature base string per RFC 5849 Section 3.4.1.
    ///
    /// Format: `METHOD&encoded_url&encoded_parameters`
    pub fn base_string<K, V>(&self, method: &str, params: &[(K, V)], request_path: &str) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        format!(
            "{}&{}&{}",
            method,
            percent_encode(&self.request_url(request_path)),
            percent_encode(&canonical_parameters(params))
        )
    }

    /// Sign a request.
    ///
    /// # Arguments
    /// * `method` - Upper-case HTTP method
    /// * `params` - Every signed parameter except `oauth_signature`
    /// * `request_path` - Path relative to the base URL, without query string
    /// * `token_secret` - Token secret (empty for the request-token step)
    /// * `consumer_secret` - Consumer secret
    pub fn sign<K, V>(
        &self,
        method: &str,
        params: &[(K, V)],
        request_path: &str,
        token_secret: &str,
        consumer_secret: &str,
    ) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let base_string = self.base_string(method, params, request_path);
        hmac_sha1_base64(&signing_key(consumer_secret, token_secret), &base_string)
    }
}

#[cfg(test)]
mod tests {
    use percent_encoding::percent_decode_str;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Parameters from the provider's published signing walkthrough.
    fn published_example_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ("include_entities", "true"),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            (
                "oauth_token",
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            ),
            ("oauth_version", "1.0"),
        ]
    }

    #[test]
    fn test_oauth_encode_unreserved() {
        assert_eq!(percent_encode("abc123"), "abc123");
        assert_eq!(percent_encode("ABC"), "ABC");
        assert_eq!(percent_encode("-._~"), "-._~");
    }

    #[test]
    fn test_oauth_encode_reserved() {
        assert_eq!(percent_encode(" "), "%20");
        assert_eq!(percent_encode("&"), "%26");
        assert_eq!(percent_encode("="), "%3D");
        assert_eq!(percent_encode("/"), "%2F");
        assert_eq!(percent_encode("+"), "%2B");
        assert_eq!(percent_encode("!*'()"), "%21%2A%27%28%29");
    }

    #[test]
    fn test_oauth_encode_utf8() {
        assert_eq!(percent_encode("é"), "%C3%A9");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_oauth_encode_round_trip() {
        for input in [
            "plain",
            "Hello Ladies + Gentlemen, a signed OAuth request!",
            "http://127.0.0.1:7980/callback?x=1&y=2",
            "~-._ é☃",
        ] {
            let encoded = percent_encode(input);
            let decoded = percent_decode_str(&encoded).decode_utf8().unwrap();
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn test_canonical_sorts_by_encoded_pair() {
        // By raw key "a" < "a-b", but '-' sorts before '=' so the pair
        // "a-b=2" precedes "a=1".
        let params = [("a", "1"), ("a-b", "2")];
        assert_eq!(canonical_parameters(&params), "a-b=2&a=1");

        let params = [("a_b", "1"), ("a b", "2"), ("a-b", "3")];
        assert_eq!(canonical_parameters(&params), "a%20b=2&a-b=3&a_b=1");
    }

    #[test]
    fn test_canonical_sorts_duplicate_keys_by_value() {
        let params = [("k", "b"), ("k", "a")];
        assert_eq!(canonical_parameters(&params), "k=a&k=b");
    }

    #[test]
    fn test_signing_key_with_empty_token_secret() {
        assert_eq!(signing_key("c&s", ""), "c%26s&");
        assert_eq!(signing_key("cs", "ts"), "cs&ts");
    }

    #[test]
    fn test_base_string() {
        let engine = SignatureEngine::new("https://api.example.com/");
        let base = engine.base_string("POST", &[("oauth_nonce", "n"), ("a", "b c")], "oauth/request_token");

        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.example.com%2Foauth%2Frequest_token&a%3Db%2520c%26oauth_nonce%3Dn"
        );
    }

    #[test]
    fn test_published_signature_vector() {
        let engine = SignatureEngine::new("https://api.twitter.com");
        let signature = engine.sign(
            "POST",
            &published_example_params(),
            "1.1/statuses/update.json",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        );

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_signature_with_empty_token_secret() {
        let engine = SignatureEngine::new("https://api.twitter.com");
        let signature = engine.sign("POST", &[("a", "1")], "oauth/request_token", "", "cs");

        assert_eq!(signature, "LRtUSXCb73/P3hnl3kOYGS98x3g=");
    }

    #[test]
    fn test_signature_is_deterministic() {
        let engine = SignatureEngine::new("https://api.twitter.com");
        let params = published_example_params();
        let first = engine.sign("GET", &params, "path", "ts", "cs");
        let second = engine.sign("GET", &params, "path", "ts", "cs");

        assert_eq!(first, second);
    }

    #[test]
    fn test_signature_stable_under_reordering() {
        let engine = SignatureEngine::new("https://api.twitter.com");
        let params = published_example_params();
        let mut reversed = params.clone();
        reversed.reverse();

        assert_eq!(
            engine.sign("POST", &params, "p", "ts", "cs"),
            engine.sign("POST", &reversed, "p", "ts", "cs")
        );
    }

    #[test]
    fn test_signature_depends_on_secrets() {
        let engine = SignatureEngine::new("https://api.twitter.com");
        let params = [("a", "1")];

        assert_ne!(
            engine.sign("GET", &params, "p", "ts1", "cs"),
            engine.sign("GET", &params, "p", "ts2", "cs")
        );
    }

    #[test]
    fn test_request_url_joins_with_single_slash() {
        let engine = SignatureEngine::new("https://api.example.com/");
        assert_eq!(
            engine.request_url("/oauth/authorize"),
            "https://api.example.com/oauth/authorize"
        );
        assert_eq!(engine.base_url(), "https://api.example.com");
    }
}
