use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the credential store.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,              // unique, lowercased
    pub username: String,
    pub password_hash: String,      // Argon2 PHC string
    pub created_at: OffsetDateTime,
}

/// Fields required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}
