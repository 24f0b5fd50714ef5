//! In-memory stand-ins for the database and the email provider.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        password::hash_password,
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
    email::{EmailMessage, Mailer, SendReceipt},
};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    token_writes: Mutex<usize>,
}

impl InMemoryUserStore {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn replace(&self, user: User) {
        let mut users = self.users.lock().unwrap();
        if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
            *slot = user;
        }
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn token_writes(&self) -> usize {
        *self.token_writes.lock().unwrap()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.get(id))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: Some(new_user.password_hash),
            image: None,
            email_verified: None,
            verification_token: None,
            verification_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("no user {}", id))?;
        user.verification_token = Some(token.to_string());
        user.verification_token_expires_at = Some(expires_at);
        *self.token_writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: Uuid,
        verified_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("no user {}", id))?;
        user.email_verified = Some(verified_at);
        user.verification_token = None;
        user.verification_token_expires_at = None;
        Ok(())
    }
}

/// Records every message; optionally fails each send.
#[derive(Default)]
pub struct FakeMailer {
    fail: bool,
    attempts: Mutex<usize>,
    sent: Mutex<Vec<EmailMessage>>,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendReceipt> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            anyhow::bail!("provider unavailable");
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(SendReceipt {
            id: Uuid::new_v4().to_string(),
        })
    }
}

/// Insert a user with a real bcrypt hash of `password`.
pub fn seed_user(store: &InMemoryUserStore, email: &str, password: &str, verified: bool) -> User {
    let user = User {
        id: Uuid::new_v4(),
        name: "Ada".into(),
        email: email.into(),
        password_hash: Some(hash_password(password).expect("hash")),
        image: None,
        email_verified: verified.then(OffsetDateTime::now_utc),
        verification_token: None,
        verification_token_expires_at: None,
        created_at: OffsetDateTime::now_utc(),
    };
    store.insert(user.clone());
    user
}
