//! Authentication state of a device client

use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};

/// Tokens are renewed this long before the device expires them
const EXPIRY_MARGIN_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AuthToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    LoggedOut,
    /// Token received, challenge response not yet verified
    Verifying(AuthToken),
    LoggedIn(AuthToken),
}

/// Session token and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: State,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: State::LoggedOut,
        }
    }

    /// Record the token returned by the login endpoint
    pub fn begin(&mut self, token: String, ttl_secs: u64, now: DateTime<Utc>) {
        let ttl = ttl_secs.min(u64::from(u32::MAX)) as i64;

        self.state = State::Verifying(AuthToken {
            token,
            expires_at: now + Duration::seconds(ttl - EXPIRY_MARGIN_SECS),
        });
    }

    /// Mark the pending token as verified
    pub fn confirm(&mut self) {
        self.state = match std::mem::replace(&mut self.state, State::LoggedOut) {
            State::Verifying(token) | State::LoggedIn(token) => State::LoggedIn(token),
            State::LoggedOut => State::LoggedOut,
        };
    }

    /// Drop the token
    pub fn clear(&mut self) {
        self.state = State::LoggedOut;
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, State::LoggedIn(_))
    }

    fn auth_token(&self) -> Option<&AuthToken> {
        match &self.state {
            State::Verifying(token) | State::LoggedIn(token) => Some(token),
            State::LoggedOut => None,
        }
    }

    /// Token to attach to requests, if any
    pub fn token(&self) -> Option<&str> {
        self.auth_token().map(|t| t.token.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.auth_token().map(|t| t.expires_at)
    }

    /// Raw token bytes used in real-time datagram headers
    pub fn token_bytes(&self) -> Vec<u8> {
        match self.token() {
            Some(token) => BASE64_STANDARD.decode(token).unwrap_or_else(|error| {
                warn!(%error, "session token is not valid base64");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Whether a new login is required before the next authenticated call
    pub fn needs_login(&self, now: DateTime<Utc>) -> bool {
        match &self.state {
            State::LoggedIn(token) => now > token.expires_at,
            State::Verifying(_) | State::LoggedOut => true,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let now = Utc::now();
        let mut session = Session::new();
        assert!(!session.is_logged_in());
        assert!(session.needs_login(now));
        assert_eq!(session.token(), None);

        session.begin("AAECAw==".to_owned(), 60, now);
        assert!(!session.is_logged_in());
        assert_eq!(session.token(), Some("AAECAw=="));
        assert_eq!(session.expires_at(), Some(now + Duration::seconds(55)));

        session.confirm();
        assert!(session.is_logged_in());
        assert_eq!(session.token_bytes(), vec![0, 1, 2, 3]);
        assert!(!session.needs_login(now + Duration::seconds(55)));
        assert!(session.needs_login(now + Duration::seconds(56)));

        session.clear();
        assert!(!session.is_logged_in());
        assert!(session.token_bytes().is_empty());
    }

    #[test]
    fn test_confirm_without_token() {
        let mut session = Session::new();
        session.confirm();
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_invalid_token_bytes() {
        let mut session = Session::new();
        session.begin("not base64!".to_owned(), 60, Utc::now());
        assert!(session.token_bytes().is_empty());
    }
}
