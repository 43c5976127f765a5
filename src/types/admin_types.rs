use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::models::AdminChanges;

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct CreateAdminRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email cannot exceed 255 characters")
    )]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 100,
        message = "Password must be between 6 and 100 characters"
    ))]
    pub password: String,
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct UpdateAdminRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email cannot exceed 255 characters")
    )]
    pub email: Option<String>,

    #[validate(length(
        min = 6,
        max = 100,
        message = "Password must be between 6 and 100 characters"
    ))]
    pub password: Option<String>,
}

impl UpdateAdminRequest {
    /// Normalises the fields; the password is hashed by the caller.
    pub fn into_changes(self) -> AppResult<(AdminChanges, Option<String>)> {
        let changes = AdminChanges {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.map(|e| e.trim().to_lowercase()),
            password_hash: None,
        };

        if changes.username.is_none() && changes.email.is_none() && self.password.is_none() {
            return Err(AppError::validation("At least one field must be provided"));
        }

        Ok((changes, self.password))
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();

    let message: Option<&'static str> = if len < 3 {
        Some("Username must be at least 3 characters")
    } else if len > 50 {
        Some("Username cannot exceed 50 characters")
    } else if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some("Username can only contain letters, numbers, and underscores")
    } else {
        None
    };

    match message {
        Some(message) => {
            let mut err = ValidationError::new("username");
            err.message = Some(Cow::Borrowed(message));
            Err(err)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> CreateAdminRequest {
        CreateAdminRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn create_payload_rules() {
        assert!(create("ops_team", "ops@example.com", "secret1").validate().is_ok());
        assert!(create("ab", "ops@example.com", "secret1").validate().is_err());
        assert!(create("ops-team", "ops@example.com", "secret1").validate().is_err());
        assert!(create("ops_team", "not-an-email", "secret1").validate().is_err());
        assert!(create("ops_team", "ops@example.com", "12345").validate().is_err());
    }

    #[test]
    fn update_requires_a_field_and_normalises() {
        assert!(UpdateAdminRequest::default().into_changes().is_err());

        let request = UpdateAdminRequest {
            email: Some("  Ops@Example.COM ".into()),
            ..UpdateAdminRequest::default()
        };
        let (changes, password) = request.into_changes().unwrap();
        assert_eq!(changes.email.as_deref(), Some("ops@example.com"));
        assert!(password.is_none());
    }

    #[test]
    fn update_validates_present_fields_only() {
        let request = UpdateAdminRequest {
            username: Some("x".into()),
            ..UpdateAdminRequest::default()
        };
        assert!(request.validate().is_err());
        assert!(UpdateAdminRequest::default().validate().is_ok());
    }
}
