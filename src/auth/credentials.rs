//! Email/password sign-in.
//!
//! A matching password is not enough: accounts whose email was never verified
//! get a fresh verification link mailed to them and the sign-in is refused.

use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, PublicUser},
        errors::AuthError,
        password::verify_password,
        repo::UserStore,
        repo_types::User,
        verification::VerificationKeys,
    },
    config::AppConfig,
    email::{templates, EmailMessage, Mailer},
    state::AppState,
};

#[derive(Clone)]
pub struct CredentialsProvider {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl FromRef<AppState> for CredentialsProvider {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            mailer: state.mailer.clone(),
            config: state.config.clone(),
        }
    }
}

impl CredentialsProvider {
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn authorize(&self, credentials: CredentialsRequest) -> Result<PublicUser, AuthError> {
        let credentials = credentials.validate()?;

        let user = self
            .users
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| {
                warn!("sign-in for unknown email");
                AuthError::UserNotFound
            })?;

        let Some(hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "sign-in for account without password");
            return Err(AuthError::PasswordNotSet);
        };

        if !verify_password(&credentials.password, hash)? {
            warn!(user_id = %user.id, "sign-in with invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified() {
            let email_sent = self.send_verification(&user).await?;
            return Err(AuthError::EmailNotVerified { email_sent });
        }

        info!(user_id = %user.id, "user signed in");
        Ok(PublicUser::from(user))
    }

    /// Issue a new token for `user` and mail the link.
    /// Returns whether the provider accepted the email; delivery failures are only logged.
    async fn send_verification(&self, user: &User) -> Result<bool, AuthError> {
        let secret = self
            .config
            .auth_secret
            .as_deref()
            .ok_or(AuthError::MissingSecret)?;

        let issued = VerificationKeys::from_secret(secret).mint(user.id)?;
        self.users
            .set_verification_token(user.id, &issued.token, issued.expires_at)
            .await?;

        let link = self.config.verification_link(&issued.token);
        let message = EmailMessage {
            from: self.config.email.from.clone(),
            to: vec![user.email.clone()],
            subject: templates::VERIFICATION_SUBJECT.into(),
            html: templates::verification_email(&user.name, &link),
        };

        match self.mailer.send(&message).await {
            Ok(receipt) => {
                info!(user_id = %user.id, email_id = %receipt.id, "verification email sent");
                Ok(true)
            }
            Err(e) => {
                error!(user_id = %user.id, error = ?e, "verification email failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, FakeMailer, InMemoryUserStore};

    const PASSWORD: &str = "password123";

    fn provider(users: &Arc<InMemoryUserStore>, mailer: &Arc<FakeMailer>) -> CredentialsProvider {
        CredentialsProvider::from_ref(&AppState::fake_with(users.clone(), mailer.clone()))
    }

    fn creds(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let err = provider(&users, &mailer)
            .authorize(creds("nobody@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
        assert_eq!(err.cause(), "User not found");
    }

    #[tokio::test]
    async fn account_without_password_points_to_google() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let mut user = seed_user(&users, "ada@example.com", PASSWORD, true);
        user.password_hash = None;
        users.replace(user);

        let err = provider(&users, &mailer)
            .authorize(creds("ada@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordNotSet));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        seed_user(&users, "ada@example.com", PASSWORD, false);

        let err = provider(&users, &mailer)
            .authorize(creds("ada@example.com", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(mailer.sent().len(), 0);
    }

    #[tokio::test]
    async fn verified_user_is_returned() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let seeded = seed_user(&users, "ada@example.com", PASSWORD, true);

        let user = provider(&users, &mailer)
            .authorize(creds("  ADA@example.com ", PASSWORD))
            .await
            .expect("verified user signs in");
        assert_eq!(user.id, seeded.id);
        assert!(user.email_verified.is_some());
        assert_eq!(mailer.sent().len(), 0);
    }

    #[tokio::test]
    async fn unverified_user_gets_one_token_and_one_email() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let seeded = seed_user(&users, "ada@example.com", PASSWORD, false);

        let err = provider(&users, &mailer)
            .authorize(creds("ada@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified { email_sent: true }));
        assert_eq!(err.cause(), "Check your email to verify first");

        assert_eq!(users.token_writes(), 1);
        let stored = users.get(seeded.id).unwrap();
        let token = stored.verification_token.expect("token stored");
        assert!(stored.verification_token_expires_at.is_some());

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ada@example.com".to_string()]);
        assert!(sent[0]
            .html
            .contains(&format!("http://localhost:3000/verify-email/{}", token)));
    }

    #[tokio::test]
    async fn second_attempt_supersedes_token() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let seeded = seed_user(&users, "ada@example.com", PASSWORD, false);
        let p = provider(&users, &mailer);

        let _ = p.authorize(creds("ada@example.com", PASSWORD)).await;
        let first = users.get(seeded.id).unwrap().verification_token;
        let _ = p.authorize(creds("ada@example.com", PASSWORD)).await;
        let second = users.get(seeded.id).unwrap().verification_token;

        assert_eq!(users.token_writes(), 2);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn failed_send_still_rejects() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::failing());
        seed_user(&users, "ada@example.com", PASSWORD, false);

        let err = provider(&users, &mailer)
            .authorize(creds("ada@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified { email_sent: false }));
        assert_eq!(err.cause(), "Email not verified: ");
        assert_eq!(mailer.attempts(), 1);
        assert_eq!(users.token_writes(), 1);
    }

    #[tokio::test]
    async fn missing_secret_rejects_before_writing() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        seed_user(&users, "ada@example.com", PASSWORD, false);

        let mut state = AppState::fake_with(users.clone(), mailer.clone());
        let mut config = (*state.config).clone();
        config.auth_secret = None;
        state.config = Arc::new(config);

        let err = CredentialsProvider::from_ref(&state)
            .authorize(creds("ada@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingSecret));
        assert_eq!(users.token_writes(), 0);
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn malformed_input_is_rejected_before_lookup() {
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(FakeMailer::default());
        let err = provider(&users, &mailer)
            .authorize(creds("not-an-email", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
