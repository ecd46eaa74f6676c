//! Local input validation, applied before anything reaches the network.
//!
//! These are the same shallow shape checks the sign-in form performs: they
//! reject obviously malformed input early so the identity provider and the
//! store only ever see plausible values. They are not a substitute for the
//! provider's own checks.

use thiserror::Error;

pub const PASSWORD_MIN_LEN: usize = 6;
pub const STATION_NAME_MIN_LEN: usize = 2;
pub const STATION_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("invalid email address")]
  InvalidEmail,

  #[error("password must be at least {PASSWORD_MIN_LEN} characters")]
  PasswordTooShort,

  #[error("station name must be at least {STATION_NAME_MIN_LEN} characters")]
  StationNameTooShort,

  #[error("station name too long")]
  StationNameTooLong,

  #[error("accident title must not be empty")]
  EmptyTitle,
}

/// `local@domain` with a dotted domain and no whitespace. Deliberately
/// shallow; the provider remains the authority on deliverability.
pub fn email(input: &str) -> Result<(), ValidationError> {
  let Some((local, domain)) = input.split_once('@') else {
    return Err(ValidationError::InvalidEmail);
  };

  if local.is_empty() || domain.is_empty() {
    return Err(ValidationError::InvalidEmail);
  }
  if input.chars().any(char::is_whitespace) || domain.contains('@') {
    return Err(ValidationError::InvalidEmail);
  }
  if !domain.split('.').skip(1).any(|label| !label.is_empty())
    || domain.starts_with('.')
    || domain.ends_with('.')
  {
    return Err(ValidationError::InvalidEmail);
  }

  Ok(())
}

pub fn password(input: &str) -> Result<(), ValidationError> {
  if input.chars().count() < PASSWORD_MIN_LEN {
    return Err(ValidationError::PasswordTooShort);
  }
  Ok(())
}

/// Email and password together, in form order.
pub fn credentials(email_input: &str, password_input: &str) -> Result<(), ValidationError> {
  email(email_input)?;
  password(password_input)
}

pub fn station_name(input: &str) -> Result<(), ValidationError> {
  let len = input.chars().count();
  if len < STATION_NAME_MIN_LEN {
    return Err(ValidationError::StationNameTooShort);
  }
  if len > STATION_NAME_MAX_LEN {
    return Err(ValidationError::StationNameTooLong);
  }
  Ok(())
}

pub fn accident_title(input: &str) -> Result<(), ValidationError> {
  if input.trim().is_empty() {
    return Err(ValidationError::EmptyTitle);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_plain_addresses() {
    assert!(email("station@example.com").is_ok());
    assert!(email("dispatch+north@fire.city.gov").is_ok());
  }

  #[test]
  fn rejects_malformed_addresses() {
    assert_eq!(email("no-at-sign"), Err(ValidationError::InvalidEmail));
    assert_eq!(email("@example.com"), Err(ValidationError::InvalidEmail));
    assert_eq!(email("user@"), Err(ValidationError::InvalidEmail));
    assert_eq!(email("user@nodot"), Err(ValidationError::InvalidEmail));
    assert_eq!(email("user@domain."), Err(ValidationError::InvalidEmail));
    assert_eq!(email("us er@example.com"), Err(ValidationError::InvalidEmail));
  }

  #[test]
  fn password_length_boundary() {
    assert_eq!(password("12345"), Err(ValidationError::PasswordTooShort));
    assert!(password("123456").is_ok());
  }

  #[test]
  fn station_name_bounds() {
    assert_eq!(station_name("A"), Err(ValidationError::StationNameTooShort));
    assert!(station_name("A1").is_ok());
    assert!(station_name("Fire Station #12").is_ok());
    assert!(station_name(&"x".repeat(50)).is_ok());
    assert_eq!(
      station_name(&"x".repeat(51)),
      Err(ValidationError::StationNameTooLong)
    );
  }

  #[test]
  fn title_must_have_substance() {
    assert_eq!(accident_title("   "), Err(ValidationError::EmptyTitle));
    assert!(accident_title("Vehicle Collision").is_ok());
  }
}
