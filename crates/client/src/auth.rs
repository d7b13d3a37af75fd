//! Sign-in state for the app shell.
//!
//! [`AuthService`] keeps the current user, forwards account actions to the
//! [`IdentityProvider`], and tells the user how each action went. Every
//! action reports success as a `bool`; failures are notified, never
//! propagated.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::notify::Notifier;
use crate::session::{IdentityProvider, SignUpOutcome, UserProfile};

pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    notifier: Notifier,
    user: RwLock<Option<UserProfile>>,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, notifier: Notifier) -> Self {
        Self {
            identity,
            notifier,
            user: RwLock::new(None),
        }
    }

    /// The user as of the last refresh or sign-in.
    pub async fn user(&self) -> Option<UserProfile> {
        self.user.read().await.clone()
    }

    /// Reload the current user from the provider. Lookup errors mean
    /// nobody is signed in.
    pub async fn refresh(&self) -> Option<UserProfile> {
        let user = match self.identity.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "No current user");
                None
            }
        };
        *self.user.write().await = user.clone();
        user
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> bool {
        match self.identity.sign_up(email, password, name).await {
            Ok(SignUpOutcome::Confirmed) => {
                self.notifier.success("Sign up successful!");
                true
            }
            Ok(SignUpOutcome::VerificationRequired) => {
                self.notifier.success("Verification code sent to your email");
                true
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                false
            }
        }
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> bool {
        match self.identity.confirm_sign_up(email, code).await {
            Ok(()) => {
                self.notifier.success("Email verified successfully");
                true
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                false
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> bool {
        match self.identity.sign_in(email, password).await {
            Ok(_session) => {
                self.refresh().await;
                self.notifier.success("Signed in successfully");
                true
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                false
            }
        }
    }

    pub async fn sign_out(&self) -> bool {
        match self.identity.sign_out().await {
            Ok(()) => {
                *self.user.write().await = None;
                self.notifier.success("Signed out successfully");
                true
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                false
            }
        }
    }
}
