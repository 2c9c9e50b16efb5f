use super::super::domain::{is_listed_pair, BusinessProfile};
use super::fields::Field;

/// One field's validation failure, with the message the UI renders inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: Field,
    pub message: &'static str,
}

pub(crate) const VOLUME_FORMAT_MESSAGE: &str = "Please enter a valid amount (numbers only)";
pub(crate) const SUBCATEGORY_MISMATCH_MESSAGE: &str =
    "Select a subcategory from the chosen category";

/// Validate a single field against the current form values.
///
/// Touched-ness is the wizard's concern; this is the raw rule table.
pub(crate) fn field_issue(profile: &BusinessProfile, field: Field) -> Option<FieldIssue> {
    let issue = |message| Some(FieldIssue { field, message });

    match field {
        Field::MonthlyVolume => {
            if profile.monthly_volume.trim().is_empty() {
                issue(field.required_message())
            } else if !is_valid_volume(&profile.monthly_volume) {
                issue(VOLUME_FORMAT_MESSAGE)
            } else {
                None
            }
        }
        Field::BusinessSubcategory => {
            let subcategory = profile.business_subcategory.trim();
            if subcategory.is_empty() {
                issue(field.required_message())
            } else if !is_listed_pair(profile.business_category.trim(), subcategory) {
                issue(SUBCATEGORY_MISMATCH_MESSAGE)
            } else {
                None
            }
        }
        other => {
            if other.value(profile).trim().is_empty() {
                issue(other.required_message())
            } else {
                None
            }
        }
    }
}

/// Strip all whitespace from user input so "85 000" stores as "85000".
pub fn normalize_volume(input: &str) -> String {
    input.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// An integer or a value with up to two decimal places: `^\d+(\.\d{1,2})?$`.
pub fn is_valid_volume(value: &str) -> bool {
    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (value, None),
    };

    if integer.is_empty() || !integer.bytes().all(|byte| byte.is_ascii_digit()) {
        return false;
    }

    match fraction {
        None => true,
        Some(digits) => {
            (1..=2).contains(&digits.len()) && digits.bytes().all(|byte| byte.is_ascii_digit())
        }
    }
}

/// Group the integer part with a space thousands separator for display;
/// the stored value stays unformatted. "85000" becomes "85 000".
pub fn group_thousands(value: &str) -> String {
    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (value, None),
    };

    let digits = integer.chars().count();
    let mut grouped = String::with_capacity(value.len() + digits / 3);
    for (position, ch) in integer.chars().enumerate() {
        if position > 0 && (digits - position) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => {
            grouped.push('.');
            grouped.push_str(fraction);
            grouped
        }
        None => grouped,
    }
}
