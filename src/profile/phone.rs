use anyhow::Result;

/// Dialing codes the call agent can reach
pub const SUPPORTED_COUNTRY_CODES: &[(&str, &str)] = &[("+91", "India"), ("+1", "United States")];

const MIN_DIGITS: usize = 6;
const MAX_DIGITS: usize = 14;

/// Combine a country code and a local number into `+<code><digits>`.
///
/// Spaces, dashes, dots and parentheses in the local part are ignored.
pub fn normalize_phone_number(country_code: &str, local: &str) -> Result<String> {
    let country_code = country_code.trim();
    if !SUPPORTED_COUNTRY_CODES
        .iter()
        .any(|(code, _)| *code == country_code)
    {
        anyhow::bail!(
            "Unsupported country code '{}'. Supported: {}",
            country_code,
            SUPPORTED_COUNTRY_CODES
                .iter()
                .map(|(code, _)| *code)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let digits: String = local
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if digits.is_empty() {
        anyhow::bail!("Phone number is empty");
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Phone number may only contain digits: '{}'", local.trim());
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        anyhow::bail!(
            "Phone number must have between {} and {} digits",
            MIN_DIGITS,
            MAX_DIGITS
        );
    }

    Ok(format!("{}{}", country_code, digits))
}

/// Split a stored number back into `(country_code, local)`.
pub fn split_phone_number(full: &str) -> Option<(&'static str, &str)> {
    SUPPORTED_COUNTRY_CODES
        .iter()
        .find_map(|(code, _)| full.strip_prefix(code).map(|local| (*code, local)))
}
