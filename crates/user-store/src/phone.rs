//! Phone number normalization to E.164.

use crate::error::StoreError;

/// E.164 allows 7 to 15 digits including the country calling code.
const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// Country calling codes for the regions a deployment may call home.
fn calling_code(region: &str) -> Option<&'static str> {
    let code = match region.to_ascii_uppercase().as_str() {
        "US" | "CA" => "1",
        "GB" => "44",
        "DE" => "49",
        "FR" => "33",
        "NL" => "31",
        "SE" => "46",
        "FI" => "358",
        "AU" => "61",
        "NZ" => "64",
        "JP" => "81",
        "IN" => "91",
        "BR" => "55",
        _ => return None,
    };
    Some(code)
}

/// Normalize a raw phone number to E.164 (`+` followed by 7-15 digits).
///
/// Numbers starting with `+` are taken as fully qualified international
/// numbers. Anything else is parsed against `default_region`: the
/// region's calling code is prefixed, unless the digits are longer than a
/// national number and already begin with it.
///
/// Normalization is idempotent: an E.164 string comes back unchanged.
pub fn normalize_number(raw: &str, default_region: &str) -> Result<String, StoreError> {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if stripped.is_empty() {
        return Err(StoreError::PhoneFormat("The phone number is empty.".into()));
    }

    let (international, digits) = match stripped.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, stripped.as_str()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::PhoneFormat(
            "The phone number contains characters that are not digits.".into(),
        ));
    }

    let qualified = if international {
        digits.to_string()
    } else {
        let code = calling_code(default_region).ok_or_else(|| {
            StoreError::PhoneFormat(format!(
                "Unknown default region {default_region}; use an international +number."
            ))
        })?;
        // National numbers are at most ten digits; anything longer that
        // already starts with the calling code is fully qualified.
        if digits.len() > 10 && digits.starts_with(code) {
            digits.to_string()
        } else {
            format!("{code}{digits}")
        }
    };

    if qualified.len() < MIN_DIGITS {
        return Err(StoreError::PhoneFormat("The phone number is too short.".into()));
    }
    if qualified.len() > MAX_DIGITS {
        return Err(StoreError::PhoneFormat("The phone number is too long.".into()));
    }

    Ok(format!("+{qualified}"))
}
