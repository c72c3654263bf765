//! Session state
//!
//! A device has at most one signed-in user. The account store publishes the
//! current [`SessionState`] on a watch channel so views can react to sign-in
//! and sign-out without polling.

use crate::account::User;

/// Current session of the device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is signed in
    #[default]
    Anonymous,
    /// A registered user is signed in
    Authenticated(User),
}

impl SessionState {
    /// The signed-in user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(user) => Some(user),
        }
    }

    /// Normalized email of the signed-in user
    pub fn email(&self) -> Option<&str> {
        self.user().map(|user| user.email.as_str())
    }

    /// Check if a user is signed in
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

impl From<Option<User>> for SessionState {
    fn from(user: Option<User>) -> Self {
        match user {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            name: "Alice".to_string(),
            email: "alice@test.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_default_is_anonymous() {
        let state = SessionState::default();
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
        assert!(state.email().is_none());
    }

    #[test]
    fn test_authenticated_accessors() {
        let state = SessionState::Authenticated(alice());
        assert!(state.is_authenticated());
        assert_eq!(state.email(), Some("alice@test.com"));
        assert_eq!(state.user().map(|u| u.name.as_str()), Some("Alice"));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(SessionState::from(None), SessionState::Anonymous);
        assert_eq!(SessionState::from(Some(alice())), SessionState::Authenticated(alice()));
    }
}
