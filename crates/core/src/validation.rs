use serde::{Deserialize, Serialize};
use unicode_general_category::{GeneralCategory, get_general_category};

/// Maximum number of characters accepted in a name.
pub const MAX_NAME_CHARS: usize = 50;

/// Why a name was rejected.
///
/// Rules are checked in declaration order and the first failing rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// The name was empty or missing.
    Empty,
    /// The name has more than [`MAX_NAME_CHARS`] characters.
    TooLong,
    /// The name contains something other than letters and digits.
    NonAlphanumeric,
}

impl InvalidReason {
    /// Human-readable message returned to HTTP callers.
    pub fn message(self) -> &'static str {
        match self {
            Self::Empty => "Name cannot be empty",
            Self::TooLong => "Name cannot exceed 50 characters",
            Self::NonAlphanumeric => "Name must be alphanumeric",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of validating a user-supplied name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationResult {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Whether `c` is a letter (`L*`) or a number (`N*`) by Unicode general
/// category.
///
/// Narrower than [`char::is_alphanumeric`], which also admits combining
/// marks carrying the `Other_Alphabetic` property (Indic vowel signs,
/// U+0345).
fn is_letter_or_digit(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
            | GeneralCategory::LetterNumber
            | GeneralCategory::OtherNumber
    )
}

/// Validate a name taken from the `name` query parameter.
///
/// A missing parameter is treated exactly like an empty one. Length is
/// measured in characters, not bytes. Only letters and numbers are allowed,
/// so accented letters and non-Latin scripts pass while whitespace,
/// punctuation, symbols, and combining marks do not.
pub fn validate_name(name: Option<&str>) -> ValidationResult {
    let name = name.unwrap_or_default();

    if name.is_empty() {
        return ValidationResult::Invalid(InvalidReason::Empty);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return ValidationResult::Invalid(InvalidReason::TooLong);
    }
    if !name.chars().all(is_letter_or_digit) {
        return ValidationResult::Invalid(InvalidReason::NonAlphanumeric);
    }

    ValidationResult::Valid
}
