use crate::store::StoreError;
use argon2::password_hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("duplicate students in team request: {}", .0.join(", "))]
    DuplicateStudents(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("request {0} is not pending")]
    NotPending(String),
    #[error("team {0} has no free slot")]
    TeamFull(String),
    #[error("cannot hash password: {0}")]
    Password(#[from] password_hash::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RosterError {
    pub fn not_found(what: &'static str, key: &str) -> Self {
        Self::NotFound {
            what,
            key: key.to_owned(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_failures_keep_their_cause() {
        let e = RosterError::from(password_hash::Error::Password);
        assert!(matches!(e, RosterError::Password(password_hash::Error::Password)));
        assert!(e.to_string().starts_with("cannot hash password: "));
        assert!(std::error::Error::source(&e).is_some());
    }
}
