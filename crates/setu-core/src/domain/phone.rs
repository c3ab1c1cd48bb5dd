//! Phone number handling for outbound SMS.
//!
//! Normalization is fail-open: a contact is never dropped because its number
//! looks odd. Whatever comes out is handed to the transport, and a bad number
//! shows up as a failed delivery in the report.

pub const DEFAULT_COUNTRY_CODE: &str = "+91";

const DOMESTIC_DIGITS: usize = 10;

/// Turn a user-entered phone string into `+<country><digits>` where possible.
///
/// Ten bare digits are treated as a domestic number and get
/// `default_country_code` prepended. Longer numbers are assumed to already
/// carry a country code (after dropping any trunk zeros). Input that fits none
/// of the rules is returned trimmed but otherwise untouched.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if digits.len() == DOMESTIC_DIGITS {
        return format!("{default_country_code}{digits}");
    }
    if digits.len() > DOMESTIC_DIGITS && digits.starts_with('0') {
        return format!("+{}", digits.trim_start_matches('0'));
    }
    if digits.len() > DOMESTIC_DIGITS {
        return format!("+{digits}");
    }

    trimmed.to_string()
}

/// Strict variant used where rejecting input is acceptable (verification codes).
pub fn dial_string(raw: &str) -> Option<String> {
    let mut out = String::new();
    let mut saw_digit = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_digit() {
            out.push(ch);
            saw_digit = true;
        } else if ch == '+' && out.is_empty() {
            out.push(ch);
        }
    }
    if !saw_digit {
        return None;
    }
    if !out.starts_with('+') {
        out.insert(0, '+');
    }
    Some(out)
}

pub fn is_valid_country_code(code: &str) -> bool {
    let Some(rest) = code.strip_prefix('+') else {
        return false;
    };
    (1..=4).contains(&rest.len()) && rest.chars().all(|ch| ch.is_ascii_digit())
}
