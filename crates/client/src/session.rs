//! Credential sessions and the identity-provider seam.
//!
//! The identity provider is an external collaborator. Whatever SDK sits
//! behind [`IdentityProvider`] (callback or promise based) is adapted at
//! that boundary so the rest of the client only awaits futures.
//!
//! A [`Session`] is fetched fresh for each operation and passed explicitly
//! down to the transport. Nothing caches it past a single operation.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use wayfarer_core::types::Timestamp;

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Tokens for one authenticated user.
#[derive(Clone)]
pub struct Session {
    access_token: String,
    id_token: Option<String>,
    expires_at: Option<Timestamp>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("has_id_token", &self.id_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    /// Build a session from an access token, reading `exp` when the token
    /// is a JWT. Opaque tokens get no expiry.
    pub fn from_tokens(access_token: impl Into<String>, id_token: Option<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = token_expiry(&access_token);
        Self {
            access_token,
            id_token,
            expires_at,
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// A session is usable until its expiry (if any) has passed.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && self.expires_at.map_or(true, |exp| exp > Utc::now())
    }
}

/// Read the `exp` claim without verifying the signature.
fn token_expiry(token: &str) -> Option<Timestamp> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
    Utc.timestamp_opt(data.claims.exp?, 0).single()
}

// ---------------------------------------------------------------------------
// Identity provider seam
// ---------------------------------------------------------------------------

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    /// Provider attributes such as `email` and `name`.
    pub attributes: Vec<(String, String)>,
}

impl UserProfile {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    Confirmed,
    /// A verification code was sent and must be confirmed first.
    VerificationRequired,
}

/// Operations the client needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, ClientError>;

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), ClientError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;

    /// The signed-in user, or `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<UserProfile>, ClientError>;

    /// The current session, or `None` when nobody is signed in.
    async fn session(&self) -> Result<Option<Session>, ClientError>;
}

/// Fetch a usable session or fail with [`ClientError::Auth`].
pub async fn require_session(identity: &dyn IdentityProvider) -> Result<Session, ClientError> {
    match identity.session().await? {
        Some(session) if session.is_valid() => Ok(session),
        Some(_) => Err(ClientError::Auth("session has expired".into())),
        None => Err(ClientError::Auth("no active session".into())),
    }
}

/// Fetch a session if one is usable, treating every failure as anonymous.
pub async fn optional_session(identity: &dyn IdentityProvider) -> Option<Session> {
    match identity.session().await {
        Ok(Some(session)) if session.is_valid() => Some(session),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed, continuing anonymously");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// StaticTokenProvider
// ---------------------------------------------------------------------------

/// Identity provider backed by a pre-issued bearer token.
///
/// Used by the CLI and for local development. Interactive sign-in and
/// sign-up belong to the hosted identity service and are rejected here.
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<SignUpOutcome, ClientError> {
        Err(ClientError::Auth(
            "sign-up is not available with a static token".into(),
        ))
    }

    async fn confirm_sign_up(&self, _: &str, _: &str) -> Result<(), ClientError> {
        Err(ClientError::Auth(
            "sign-up confirmation is not available with a static token".into(),
        ))
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<Session, ClientError> {
        Err(ClientError::Auth(
            "interactive sign-in is not available with a static token".into(),
        ))
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        *self.token.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.token.read().await.as_ref().map(|_| UserProfile {
            username: "token".into(),
            attributes: Vec::new(),
        }))
    }

    async fn session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self
            .token
            .read()
            .await
            .as_ref()
            .map(|t| Session::from_tokens(t.clone(), None)))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use jsonwebtoken::{EncodingKey, Header};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Claims {
        sub: &'static str,
        exp: i64,
    }

    fn jwt_expiring_at(exp: i64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &Claims { sub: "user-1", exp },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn reads_expiry_from_jwt() {
        let exp = Utc::now().timestamp() + 3600;
        let session = Session::from_tokens(jwt_expiring_at(exp), None);
        assert_eq!(session.expires_at().map(|t| t.timestamp()), Some(exp));
        assert!(session.is_valid());
    }

    #[test]
    fn expired_jwt_is_invalid() {
        let session = Session::from_tokens(jwt_expiring_at(Utc::now().timestamp() - 60), None);
        assert!(!session.is_valid());
    }

    #[test]
    fn opaque_token_never_expires() {
        let session = Session::from_tokens("opaque-token", None);
        assert_eq!(session.expires_at(), None);
        assert!(session.is_valid());
        assert_eq!(session.bearer(), "Bearer opaque-token");
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session::from_tokens("super-secret", None);
        assert!(!format!("{session:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn static_provider_session_lifecycle() {
        let provider = StaticTokenProvider::new(Some("tok".into()));
        let session = require_session(&provider).await.unwrap();
        assert_eq!(session.access_token(), "tok");

        provider.sign_out().await.unwrap();
        assert_matches!(require_session(&provider).await, Err(ClientError::Auth(_)));
        assert!(optional_session(&provider).await.is_none());
        assert!(provider.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_provider_rejects_interactive_sign_in() {
        let provider = StaticTokenProvider::new(None);
        assert_matches!(provider.sign_in("a@b.c", "pw").await, Err(ClientError::Auth(_)));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let token = jwt_expiring_at(Utc::now().timestamp() - 5);
        let provider = StaticTokenProvider::new(Some(token));
        let err = require_session(&provider).await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }
}
