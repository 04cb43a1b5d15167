//! Submission forms and their field rules. A form that fails validation is
//! never sent.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::Result;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_EMAIL_LEN: u64 = 100;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// At least eight characters with a lowercase letter, an uppercase letter and a digit.
pub fn validate_password(password: &str) -> std::result::Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(error("password_length", "Password must be at least 8 characters long"));
    }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        return Err(error(
            "password_strength",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ));
    }
    Ok(())
}

/// `something@domain.tld`: no whitespace, one `@`, a dot inside the domain.
pub fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    let invalid = || error("email", "Please enter a valid email address");
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err(invalid());
    }
    Ok(())
}

/// Philippine mobile number: exactly 11 digits starting with `09`.
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let digits = phone.len() == 11 && phone.chars().all(|c| c.is_ascii_digit());
    if !digits || !phone.starts_with("09") {
        return Err(error("phone", "Phone number must be 11 digits starting with 09"));
    }
    Ok(())
}

fn validate_sex(sex: &str) -> std::result::Result<(), ValidationError> {
    match sex {
        "Male" | "Female" => Ok(()),
        _ => Err(error("sex", "Gender is required")),
    }
}

/// Field name to first message, for inline display.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some((field.to_string(), message))
        })
        .collect()
}

/// Runs the form's rules; `Err(PrmsError::Validation)` blocks submission.
pub fn check<T: Validate>(form: &T) -> Result<()> {
    form.validate()?;
    Ok(())
}

/// New patient registration, as `add_patient.php` expects it.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PatientForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Surname is required"))]
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[validate(length(min = 1, message = "Date of birth is required"))]
    pub date_of_birth: String,
    #[validate(custom = "validate_sex")]
    pub sex: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_phone")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Email must be at most 100 characters"), custom = "validate_email")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub philhealth_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl PatientForm {
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.surname.as_str()),
            self.suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct DiseaseForm {
    #[validate(length(min = 1, message = "Disease name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Symptoms are required"))]
    pub symptoms: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incubation_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contagious_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(custom = "validate_password")]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UserForm {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(custom = "validate_password")]
    pub password: String,
    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Email must be at most 100 characters"), custom = "validate_email")]
    pub email: Option<String>,
}
