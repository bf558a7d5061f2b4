//! OAuth 1.0a request signing.
//!
//! Every user-context request carries an `Authorization: OAuth ...` header
//! whose signature is an HMAC-SHA1 over the method, the base URL and the
//! sorted, percent-encoded parameter set.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngCore;
use sha1::Sha1;

use crate::config::Credentials;
use crate::error::{TwitterError, TwitterResult};

/// Everything except the RFC 3986 unreserved set: ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// OAuth 1.0a signer for Twitter API requests.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    access_token: Option<String>,
    access_secret: Option<String>,
}

impl OAuthSigner {
    /// Create a new OAuth signer from credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            consumer_key: credentials.api_key.clone(),
            consumer_secret: credentials.api_secret.clone(),
            access_token: credentials.access_token.clone().filter(|t| !t.is_empty()),
            access_secret: credentials.access_secret.clone(),
        }
    }

    /// Generate the OAuth 1.0a Authorization header value.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `url` - Full URL without query parameters
    /// * `params` - Query parameters that take part in the signature (GET only)
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> TwitterResult<String> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| TwitterError::OAuth(format!("Failed to get timestamp: {e}")))?
            .as_secs()
            .to_string();

        self.sign_with(method, url, params, &generate_nonce(), &timestamp)
    }

    /// Sign with a caller-provided nonce and timestamp.
    pub(crate) fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: &str,
    ) -> TwitterResult<String> {
        let mut oauth_params = self.oauth_params(nonce, timestamp);

        let all_params: Vec<(String, String)> =
            oauth_params.iter().chain(params).cloned().collect();
        let base_string = signature_base_string(method, url, &all_params);

        let signature = hmac_sha1(&self.signing_key(), &base_string)?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }

    fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = &self.access_token {
            params.push(("oauth_token".to_string(), token.clone()));
        }
        params
    }

    fn signing_key(&self) -> String {
        format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(self.access_secret.as_deref().unwrap_or_default())
        )
    }
}

/// Canonical parameter string: encoded `key=value` pairs sorted by key, then
/// value, joined with `&`.
pub(crate) fn parameter_string(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(url)&enc(parameter_string)`
pub(crate) fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string(params))
    )
}

/// Percent-encode a string according to RFC 3986.
pub(crate) fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Generate a random base64 nonce.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// Compute HMAC-SHA1 and return base64-encoded result.
fn hmac_sha1(key: &str, data: &str) -> TwitterResult<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| TwitterError::OAuth(e.to_string()))?;

    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn header_field<'a>(header: &'a str, name: &str) -> Option<&'a str> {
        header
            .trim_start_matches("OAuth ")
            .split(", ")
            .find_map(|field| field.strip_prefix(&format!("{name}=\"")))
            .and_then(|rest| rest.strip_suffix('"'))
    }

    fn reference_signer() -> OAuthSigner {
        OAuthSigner::new(
            &Credentials::new("xvz1evFS4wEEPTGEFPHBog", "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw")
                .with_access_token(
                    "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
                    "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
                ),
        )
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt"), "test-value_123.txt");
        assert_eq!(percent_encode("~tilde"), "~tilde");
        assert_eq!(percent_encode("a+b"), "a%2Bb");
        assert_eq!(percent_encode("café"), "caf%C3%A9");
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_ne!(nonce1, nonce2);
        // 32 bytes of base64
        assert_eq!(nonce1.len(), 44);
        assert!(BASE64.decode(&nonce1).is_ok());
    }

    #[test]
    fn test_parameter_string_ignores_insertion_order() {
        let forward = pairs(&[("b", "1"), ("a", "2")]);
        let reverse = pairs(&[("a", "2"), ("b", "1")]);

        assert_eq!(parameter_string(&forward), "a=2&b=1");
        assert_eq!(parameter_string(&forward), parameter_string(&reverse));
    }

    #[test]
    fn test_parameter_string_sorts_bytewise() {
        let params = pairs(&[("oauth_token", "t"), ("Zeta", "z"), ("alpha", "a"), ("a", "b")]);
        assert_eq!(parameter_string(&params), "Zeta=z&a=b&alpha=a&oauth_token=t");
    }

    #[test]
    fn test_signature_base_string_layout() {
        let base = signature_base_string(
            "get",
            "https://api.twitter.com/2/tweets/search/recent",
            &pairs(&[("query", "rust lang"), ("max_results", "10")]),
        );
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.twitter.com%2F2%2Ftweets%2Fsearch%2Frecent\
             &max_results%3D10%26query%3Drust%2520lang"
        );
    }

    #[test]
    fn test_known_signature_vector() {
        let header = reference_signer()
            .sign_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &pairs(&[
                    ("include_entities", "true"),
                    ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ]),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                "1318622958",
            )
            .unwrap();

        assert_eq!(
            header_field(&header, "oauth_signature"),
            Some("hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D")
        );
    }

    #[test]
    fn test_signing_twice_changes_only_nonce() {
        let signer = reference_signer();
        let url = "https://api.twitter.com/2/users/me";

        let first = signer.sign("GET", url, &[]).unwrap();
        let second = signer.sign("GET", url, &[]).unwrap();

        assert_ne!(
            header_field(&first, "oauth_nonce"),
            header_field(&second, "oauth_nonce")
        );

        // Same inputs, same nonce and timestamp: identical header
        let a = signer.sign_with("GET", url, &[], "n", "1").unwrap();
        let b = signer.sign_with("GET", url, &[], "n", "1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_fields() {
        let header = reference_signer()
            .sign("GET", "https://api.twitter.com/2/users/me", &[])
            .unwrap();

        assert!(header.starts_with("OAuth "));
        for field in [
            "oauth_consumer_key",
            "oauth_nonce",
            "oauth_signature",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_token",
            "oauth_version",
        ] {
            assert!(header_field(&header, field).is_some(), "missing {field}");
        }
        assert_eq!(header_field(&header, "oauth_signature_method"), Some("HMAC-SHA1"));
        assert_eq!(header_field(&header, "oauth_version"), Some("1.0"));
    }

    #[test]
    fn test_app_only_credentials_omit_token() {
        let signer = OAuthSigner::new(&Credentials::new("key", "secret"));
        let header = signer.sign("GET", "https://api.twitter.com/2/users/me", &[]).unwrap();

        assert!(header_field(&header, "oauth_token").is_none());
        assert!(header_field(&header, "oauth_signature").is_some());
    }
}
