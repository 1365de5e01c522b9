//! Validation code generation.

use rand::seq::SliceRandom;

/// Generate a six-digit validation code with no repeated digit.
///
/// Digits are sampled without replacement from 0-9, so a leading zero is
/// possible and significant; the code is handled as a string throughout.
pub fn generate() -> String {
    let mut digits: Vec<u8> = (0..10).collect();
    digits.shuffle(&mut rand::thread_rng());
    digits[..6].iter().map(|d| char::from(b'0' + d)).collect()
}
