use email_address::EmailAddress;
use serde::Serialize;

/// Validated email/password pair. Construction is the only way in, so a
/// value of this type never carries an empty or malformed email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Invalid email format")]
    InvalidEmailFormat,

    #[error("Password cannot be empty")]
    EmptyPassword,
}

impl Credentials {
    pub fn new(email: String, password: String) -> Result<Self, CredentialsError> {
        let email = Self::validate_email(email)?;
        let password = Self::validate_password(password)?;

        Ok(Self { email, password })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    fn validate_email(email: String) -> Result<String, CredentialsError> {
        let email = email.trim();

        if email.is_empty() {
            return Err(CredentialsError::EmptyEmail);
        }

        if !EmailAddress::is_valid(email) {
            return Err(CredentialsError::InvalidEmailFormat);
        }

        Ok(email.to_lowercase())
    }

    fn validate_password(password: String) -> Result<String, CredentialsError> {
        if password.trim().is_empty() {
            return Err(CredentialsError::EmptyPassword);
        }

        Ok(password)
    }
}
