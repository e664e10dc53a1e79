//! Input normalisation and validation helpers shared by request handlers.

use validator::ValidationErrors;

use crate::error::CoreError;

/// Canonical form of an email address: trimmed and lower-cased.
///
/// Emails are unique case-insensitively, so every lookup and insert goes
/// through this function.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject a registration whose confirmation does not equal the password.
pub fn check_password_confirmation(password: &str, confirm: &str) -> Result<(), CoreError> {
    if password != confirm {
        return Err(CoreError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

/// Human-readable message for a validator error code.
fn msg_for_code(code: &str) -> &'static str {
    match code {
        "required" | "length" => "This field is required",
        "email" => "Invalid email",
        "range" => "Value is out of range",
        _ => "Invalid value",
    }
}

/// Flatten [`ValidationErrors`] into a single `field: message` list.
///
/// Fields are sorted by name so the output is stable across runs. An explicit
/// `message` on the validation attribute wins over the generic text.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| msg_for_code(&err.code).to_string());
                format!("{field}: {msg}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

/// Run `validator` rules on `input`, mapping failures to [`CoreError::Validation`].
pub fn validate<T: validator::Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(validation_message(&e)))
}
