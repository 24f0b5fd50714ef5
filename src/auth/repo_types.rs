use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,                                         // lowercased, unique
    pub password_hash: Option<String>,                         // None for Google-only accounts
    pub image: Option<String>,
    pub email_verified: Option<OffsetDateTime>,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.email_verified.is_some()
    }
}

/// Fields required to insert a user from the signup form.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
