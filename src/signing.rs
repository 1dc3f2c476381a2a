// ===============================
// src/signing.rs
// ===============================
//
// Bitunix request authentication. Every call carries a random nonce, a
// millisecond timestamp and a two-stage SHA-256 signature:
//
//   digest = sha256(nonce + timestamp + api_key + query + body)
//   sign   = sha256(digest + api_secret)
//
// Query canonicalization: keys sorted lexicographically, "key=value" pairs
// concatenated with no separator and no percent-encoding. Body: empty for
// GET, otherwise the exact compact JSON transmitted, field order preserved.

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 32;

pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted.iter().map(|(k, v)| format!("{k}={v}")).collect()
}

/// Header set authenticating one request. `body_json` must be the exact
/// compact JSON that will go on the wire; it is ignored for GET.
pub fn auth_headers(
    api_key: &str,
    api_secret: &str,
    method: &str,
    params: &[(String, String)],
    body_json: Option<&str>,
) -> Vec<(&'static str, String)> {
    let nonce = nonce();
    let ts = timestamp_ms().to_string();
    sign_with(api_key, api_secret, method, &nonce, &ts, params, body_json)
}

/// Deterministic core of `auth_headers`, split out so the digest chain can
/// be pinned in tests.
fn sign_with(
    api_key: &str,
    api_secret: &str,
    method: &str,
    nonce: &str,
    timestamp: &str,
    params: &[(String, String)],
    body_json: Option<&str>,
) -> Vec<(&'static str, String)> {
    let query = canonical_query(params);
    let body = if method.eq_ignore_ascii_case("GET") {
        ""
    } else {
        body_json.unwrap_or("")
    };
    let digest = sha256_hex(&format!("{nonce}{timestamp}{api_key}{query}{body}"));
    let sign = sha256_hex(&format!("{digest}{api_secret}"));
    vec![
        ("api-key", api_key.to_string()),
        ("nonce", nonce.to_string()),
        ("timestamp", timestamp.to_string()),
        ("sign", sign),
        ("language", "en-US".to_string()),
        ("Content-Type", "application/json".to_string()),
    ]
}
