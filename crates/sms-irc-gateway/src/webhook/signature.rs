//! Provider webhook signature validation.
//!
//! The provider signs each request with HMAC-SHA1 over the callback URL
//! followed by every POST parameter, sorted by name, concatenated as
//! `name` + `value`; the base64 of the digest travels in the
//! `X-Twilio-Signature` header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::{BTreeMap, HashMap};

/// Compute the expected signature for a request.
pub fn compute(auth_token: &str, url: &str, params: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut data = String::from(url);
    for (name, value) in sorted {
        data.push_str(name);
        data.push_str(value);
    }

    let mut mac =
        Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check a request signature.
pub fn validate(
    auth_token: &str,
    url: &str,
    params: &HashMap<String, String>,
    provided: &str,
) -> bool {
    compute(auth_token, url, params) == provided
}
