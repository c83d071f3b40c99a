//! Client-side input checks run before any auth request is sent.
//!
//! The request DTOs in `types` derive `validator::Validate`; the rules the
//! built-in validators cannot express live here as custom functions.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

pub const EMAIL_MAX_LENGTH: usize = 100;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 100;
pub const RESET_CODE_LENGTH: usize = 6;

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// The first rule an input broke, with a message fit for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

/// Run `input`'s derived rules and report the first failure.
pub fn check<T: Validate>(input: &T) -> Result<(), ValidationFailure> {
    input.validate().map_err(first_failure)
}

fn first_failure(errors: ValidationErrors) -> ValidationFailure {
    let field_errors = errors.field_errors();
    // HashMap order is unstable; sort so the reported field is deterministic.
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| ValidationFailure {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid")),
            })
        })
        .unwrap_or_else(|| ValidationFailure {
            field: String::new(),
            message: "Validation failed".to_string(),
        })
}

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Non-empty, contains `@` and `.`, at most 100 characters.
pub fn email_shape(email: &str) -> Result<(), ValidationError> {
    let ok = !email.is_empty()
        && email.contains('@')
        && email.contains('.')
        && email.chars().count() <= EMAIL_MAX_LENGTH;
    if ok {
        Ok(())
    } else {
        Err(failure("email", "Please enter a valid email address."))
    }
}

/// 8–128 characters drawn from letters, digits and `@$!%*?&`, with at least
/// one of each: uppercase, lowercase, digit, symbol.
pub fn strong_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));
    let ok = (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len)
        && allowed
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    if ok {
        Ok(())
    } else {
        Err(failure(
            "password",
            "Password must be 8-128 characters and include an uppercase letter, a lowercase letter, a number, and one of @$!%*?&.",
        ))
    }
}

pub fn reset_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == RESET_CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(failure("code", "Verification code must be 6 digits."))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::types::{LoginRequest, SignupRequest, VerifyResetCodeRequest};

    #[test_case("user@example.com", true ; "plain")]
    #[test_case("", false ; "empty")]
    #[test_case("user.example.com", false ; "no at")]
    #[test_case("user@example", false ; "no dot")]
    fn email_rules(email: &str, ok: bool) {
        assert_eq!(email_shape(email).is_ok(), ok);
    }

    #[test]
    fn email_length_ceiling() {
        let local = "a".repeat(EMAIL_MAX_LENGTH - "@x.io".len());
        assert!(email_shape(&format!("{local}@x.io")).is_ok());
        assert!(email_shape(&format!("a{local}@x.io")).is_err());
    }

    #[test_case("Abc12345!", true ; "meets every rule")]
    #[test_case("Ab1!", false ; "too short")]
    #[test_case("abc12345!", false ; "no uppercase")]
    #[test_case("ABC12345!", false ; "no lowercase")]
    #[test_case("Abcdefgh!", false ; "no digit")]
    #[test_case("Abc123456", false ; "no symbol")]
    #[test_case("Abc12345#", false ; "symbol outside the set")]
    #[test_case("Abc 12345!", false ; "whitespace")]
    fn password_rules(password: &str, ok: bool) {
        assert_eq!(strong_password(password).is_ok(), ok);
    }

    #[test]
    fn password_length_ceiling() {
        let long = format!("Aa1!{}", "a".repeat(PASSWORD_MAX_LENGTH - 4));
        assert!(strong_password(&long).is_ok());
        assert!(strong_password(&format!("{long}a")).is_err());
    }

    #[test_case("123456", true ; "six digits")]
    #[test_case("12345", false ; "five digits")]
    #[test_case("12345a", false ; "letter")]
    #[test_case("1234567", false ; "seven digits")]
    fn code_rules(code: &str, ok: bool) {
        assert_eq!(reset_code(code).is_ok(), ok);
    }

    #[test]
    fn signup_reports_name_failure() {
        let req = SignupRequest {
            name: "A".to_string(),
            email: "ash@example.com".to_string(),
            password: "Abc12345!".to_string(),
        };
        let failure = check(&req).unwrap_err();
        assert_eq!(failure.field, "name");
        assert_eq!(failure.message, "Name must be 2-100 characters.");
    }

    #[test]
    fn login_only_needs_length() {
        let req = LoginRequest {
            email: "ash@example.com".to_string(),
            password: "weakpassword".to_string(),
        };
        assert!(check(&req).is_ok());

        let req = LoginRequest {
            email: "ash@example.com".to_string(),
            password: "short".to_string(),
        };
        assert_eq!(check(&req).unwrap_err().field, "password");
    }

    #[test]
    fn verify_request_checks_code() {
        let req = VerifyResetCodeRequest {
            email: "ash@example.com".to_string(),
            code: "12a456".to_string(),
        };
        assert_eq!(
            check(&req).unwrap_err().message,
            "Verification code must be 6 digits."
        );
    }
}
