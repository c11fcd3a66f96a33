// File: convoscan-core/src/validators.rs
//! Programmatic validation for matched sensitive fragments.
//!
//! Rules flagged with `programmatic_validation` run their matches through one
//! of these checks before a fragment is reported. A fragment may carry its
//! label ("SSN: 123-45-6789"), so every validator extracts the numeric body
//! first.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;

static SSN_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{3})[-\s]?(\d{2})[-\s]?(\d{4})$").expect("SSN body regex is valid")
});

/// Validates the SSN at the end of a matched fragment against SSA structure rules.
///
/// Area `000`, `666` and `900-999`, group `00` and serial `0000` are never issued.
pub fn is_valid_ssn_programmatically(fragment: &str) -> bool {
    let Some(caps) = SSN_BODY.captures(fragment.trim_end()) else {
        return false;
    };

    let (Some(area), Some(group), Some(serial)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return false;
    };

    let Ok(area_num) = area.as_str().parse::<u16>() else { return false; };
    let Ok(group_num) = group.as_str().parse::<u8>() else { return false; };
    let Ok(serial_num) = serial.as_str().parse::<u16>() else { return false; };

    let invalid_area = area_num == 0 || area_num == 666 || area_num >= 900;
    !(invalid_area || group_num == 0 || serial_num == 0)
}

/// Validates a digit string using the Luhn (mod 10) checksum.
pub fn is_valid_luhn(num_str: &str) -> bool {
    let mut sum = 0;
    let mut alternate = false;

    for c in num_str.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Strips everything but digits from a card fragment and applies the Luhn check.
pub fn is_valid_card_number_programmatically(fragment: &str) -> bool {
    let digits: String = fragment.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    is_valid_luhn(&digits)
}

/// Dispatches a fragment to the validator registered for its rule name.
/// Rules without a dedicated validator always pass.
pub fn validate_fragment(rule_name: &str, fragment: &str) -> bool {
    match rule_name {
        "ssn_number" | "ssn_disclosure" | "ssn_provided" => is_valid_ssn_programmatically(fragment),
        "card_number" => is_valid_card_number_programmatically(fragment),
        _ => true,
    }
}
