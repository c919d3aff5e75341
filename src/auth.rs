use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::ApiError;

#[derive(Debug, Clone)]
struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Bearer of the API token for one client.
///
/// Cloning shares the same credential; every `HttpApi` built from a clone
/// sees updates made through any other clone.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.store(Some(Credential {
            token: token.into(),
            expires_at: None,
        }));
    }

    pub fn set_token_with_expiry(&self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.store(Some(Credential {
            token: token.into(),
            expires_at: Some(expires_at),
        }));
    }

    pub fn invalidate(&self) {
        self.store(None);
    }

    /// The current token, unless it is blank or past its expiry.
    pub fn token(&self) -> Option<String> {
        self.token_at(Utc::now())
    }

    pub fn token_at(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let cred = guard.as_ref()?;
        if cred.token.trim().is_empty() {
            return None;
        }
        match cred.expires_at {
            Some(exp) if exp <= now => None,
            _ => Some(cred.token.clone()),
        }
    }

    fn store(&self, value: Option<Credential>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = value;
    }
}

/* -------------------------
   Server error remapping
--------------------------*/

/// Pull `"detail": "..."` out of a JSON error body.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_string)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn login_error(body: Option<&str>) -> ApiError {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return ApiError::invalid_credentials();
    };
    if contains_ci(body, "Invalid credentials") || contains_ci(body, "No active account found") {
        return ApiError::invalid_credentials();
    }
    match extract_detail(body) {
        Some(detail) => ApiError::Auth(detail),
        None => ApiError::invalid_credentials(),
    }
}

pub fn register_error(body: Option<&str>, status: u16) -> ApiError {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return ApiError::Auth(format!(
            "Registration failed (Code: {status}). Please try again."
        ));
    };
    if contains_ci(body, "already exists") {
        return ApiError::account_exists();
    }
    match extract_detail(body) {
        Some(detail) => ApiError::Auth(detail),
        None => ApiError::Auth(format!("Registration failed: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn blank_token_is_absent() {
        let session = Session::new();
        assert!(session.token().is_none());
        session.set_token("   ");
        assert!(session.token().is_none());
        session.set_token("abc");
        assert_eq!(session.token().as_deref(), Some("abc"));
    }

    #[test]
    fn clones_share_the_credential() {
        let session = Session::new();
        let other = session.clone();
        session.set_token("abc");
        assert_eq!(other.token().as_deref(), Some("abc"));
        other.invalidate();
        assert!(session.token().is_none());
    }

    #[test]
    fn expired_token_is_absent() {
        let session = Session::new();
        let now = Utc::now();
        session.set_token_with_expiry("abc", now + Duration::minutes(5));
        assert!(session.token_at(now).is_some());
        assert!(session.token_at(now + Duration::minutes(5)).is_none());
    }

    #[test]
    fn login_errors_are_remapped() {
        let generic = "Invalid phone number or password.";
        assert_eq!(login_error(None).to_string(), generic);
        assert_eq!(
            login_error(Some(r#"{"non_field_errors":["Invalid credentials"]}"#)).to_string(),
            generic
        );
        assert_eq!(
            login_error(Some(r#"{"detail":"No active account found with the given credentials"}"#))
                .to_string(),
            generic
        );
        assert_eq!(
            login_error(Some(r#"{"detail":"Account locked"}"#)).to_string(),
            "Account locked"
        );
        assert_eq!(login_error(Some("<html>oops</html>")).to_string(), generic);
    }

    #[test]
    fn register_errors_are_remapped() {
        assert_eq!(
            register_error(Some(r#"{"phone_number":["user with this phone number already exists."]}"#), 400)
                .to_string(),
            "An account with this phone number already exists."
        );
        assert_eq!(
            register_error(Some(r#"{"detail":"Passwords do not match"}"#), 400).to_string(),
            "Passwords do not match"
        );
        assert_eq!(
            register_error(None, 502).to_string(),
            "Registration failed (Code: 502). Please try again."
        );
        assert_eq!(
            register_error(Some("boom"), 500).to_string(),
            "Registration failed: boom"
        );
    }
}
