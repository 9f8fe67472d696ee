//! Field rules for accounts and stores.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const NAME_MIN_CHARS: usize = 20;
pub const NAME_MAX_CHARS: usize = 60;
pub const ADDRESS_MAX_CHARS: usize = 400;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 16;
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidField(pub String);

impl InvalidField {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

pub fn validate_user_name(name: &str) -> Result<(), InvalidField> {
    if name.trim().is_empty() {
        return Err(InvalidField::new("Name is required."));
    }
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(InvalidField::new(format!(
            "Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters."
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), InvalidField> {
    if email.trim().is_empty() {
        return Err(InvalidField::new("Email is required."));
    }
    if !email_regex().is_match(email) {
        return Err(InvalidField::new("Invalid email format."));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), InvalidField> {
    if address.trim().is_empty() {
        return Err(InvalidField::new("Address is required."));
    }
    if address.chars().count() > ADDRESS_MAX_CHARS {
        return Err(InvalidField::new(format!(
            "Address must not exceed {ADDRESS_MAX_CHARS} characters."
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), InvalidField> {
    let len = password.chars().count();
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) || !has_upper || !has_special {
        return Err(InvalidField::new(format!(
            "Password must be {PASSWORD_MIN_CHARS}-{PASSWORD_MAX_CHARS} characters long, include at least one uppercase letter and one special character."
        )));
    }
    Ok(())
}

pub fn validate_store_name(name: &str) -> Result<(), InvalidField> {
    if name.trim().is_empty() {
        return Err(InvalidField::new("Store name is required."));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(InvalidField::new(format!(
            "Store name must not exceed {NAME_MAX_CHARS} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name_length_is_counted_in_chars() {
        assert!(validate_user_name(&"a".repeat(20)).is_ok());
        assert!(validate_user_name(&"a".repeat(60)).is_ok());
        assert!(validate_user_name(&"a".repeat(19)).is_err());
        assert!(validate_user_name(&"a".repeat(61)).is_err());
        assert!(validate_user_name(&"é".repeat(30)).is_ok());
        assert!(validate_user_name("                         ").is_err());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email("someone@example").is_err());
        assert!(validate_email("some one@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("Secret@12").is_ok());
        assert!(validate_password("Sh@rt1").is_err());
        assert!(validate_password("nouppercase@1").is_err());
        assert!(validate_password("NoSpecial123").is_err());
        assert!(validate_password("Waaaaaaaaaaaaay@TooLong").is_err());
    }

    #[test]
    fn address_limit() {
        assert!(validate_address("1 Main Street").is_ok());
        assert!(validate_address(&"x".repeat(400)).is_ok());
        assert!(validate_address(&"x".repeat(401)).is_err());
        assert!(validate_address("  ").is_err());
    }

    #[test]
    fn store_name_required() {
        assert!(validate_store_name("Corner Cafe").is_ok());
        assert!(validate_store_name("").is_err());
    }
}
