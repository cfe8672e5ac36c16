//! Acceptance rules for contact-form submissions.
//!
//! Two rule sets live here. [`validate_submission`] is the authoritative gate used by the
//! server before anything is persisted. [`validate_form`] mirrors the stricter checks the
//! contact form runs before sending, and only exists to give immediate per-field feedback.
//! The two share the email pattern so they never disagree on what an address looks like.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

pub const NAME_REQUIRED: &str = "Name is required and must be a non-empty string";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Email must be a valid email address";
pub const MESSAGE_REQUIRED: &str = "Message is required and must be a non-empty string";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const MESSAGE_TOO_SHORT: &str = "Message must be at least 10 characters";

const FORM_NAME_REQUIRED: &str = "Name is required";
const FORM_EMAIL_INVALID: &str = "Please enter a valid email address";
const FORM_MESSAGE_REQUIRED: &str = "Message is required";

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_MESSAGE_CHARS: usize = 10;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

/// Returns true when `email` has the shape `local@domain.tld` with no whitespace.
///
/// Deliverability is not checked.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Message,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }

    /// Maps a server error message back to the form field it describes.
    #[must_use]
    pub fn from_error_text(text: &str) -> Option<Self> {
        if text.starts_with("Name") {
            Some(Self::Name)
        } else if text.starts_with("Email") {
            Some(Self::Email)
        } else if text.starts_with("Message") {
            Some(Self::Message)
        } else {
            None
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

/// A submission as received, before any rule has been applied.
///
/// A field is `None` when it was missing or was not text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Also enforce the form's minimum lengths.
    pub strict: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Applies the server-side acceptance rules.
///
/// Every failing rule is reported, in field order (name, email, message). An empty result
/// means the candidate may be persisted.
#[must_use]
pub fn validate_submission(candidate: &Candidate<'_>, rules: ValidationRules) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match non_blank(candidate.name) {
        None => errors.push(FieldError { field: Field::Name, message: NAME_REQUIRED }),
        Some(name) if rules.strict && char_len(name) < MIN_NAME_CHARS => {
            errors.push(FieldError { field: Field::Name, message: NAME_TOO_SHORT });
        }
        Some(_) => {}
    }

    match candidate.email {
        None | Some("") => errors.push(FieldError { field: Field::Email, message: EMAIL_REQUIRED }),
        Some(email) if !is_valid_email(email) => {
            errors.push(FieldError { field: Field::Email, message: EMAIL_INVALID });
        }
        Some(_) => {}
    }

    match non_blank(candidate.message) {
        None => errors.push(FieldError { field: Field::Message, message: MESSAGE_REQUIRED }),
        Some(message) if rules.strict && char_len(message) < MIN_MESSAGE_CHARS => {
            errors.push(FieldError { field: Field::Message, message: MESSAGE_TOO_SHORT });
        }
        Some(_) => {}
    }

    errors
}

/// Applies the contact form's advisory rules, yielding at most one message per field.
#[must_use]
pub fn validate_form(candidate: &Candidate<'_>) -> BTreeMap<Field, &'static str> {
    let mut errors = BTreeMap::new();

    match non_blank(candidate.name) {
        None => {
            errors.insert(Field::Name, FORM_NAME_REQUIRED);
        }
        Some(name) if char_len(name) < MIN_NAME_CHARS => {
            errors.insert(Field::Name, NAME_TOO_SHORT);
        }
        Some(_) => {}
    }

    match (non_blank(candidate.email), candidate.email) {
        (None, _) => {
            errors.insert(Field::Email, EMAIL_REQUIRED);
        }
        // The form tests the raw input, not the trimmed value.
        (Some(_), Some(raw)) if !is_valid_email(raw) => {
            errors.insert(Field::Email, FORM_EMAIL_INVALID);
        }
        _ => {}
    }

    match non_blank(candidate.message) {
        None => {
            errors.insert(Field::Message, FORM_MESSAGE_REQUIRED);
        }
        Some(message) if char_len(message) < MIN_MESSAGE_CHARS => {
            errors.insert(Field::Message, MESSAGE_TOO_SHORT);
        }
        Some(_) => {}
    }

    errors
}
