use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, LoginResponse, RegisterRequest},
    error::AuthError,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    /// Verified against on unknown emails so both login failures cost one argon2 check.
    static ref DUMMY_HASH: Option<String> = hash_password("unused-login-padding").ok();
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_email(value: Option<String>) -> Option<String> {
    present(value).map(|e| e.trim().to_lowercase())
}

/// Store a new user with a salted password hash.
pub async fn register(store: &dyn UserStore, req: RegisterRequest) -> Result<User, AuthError> {
    let (Some(username), Some(password)) = (present(req.username), present(req.password)) else {
        return Err(AuthError::MissingCredentials);
    };
    let email = normalize_email(req.email).ok_or(AuthError::MissingEmail)?;
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::InvalidEmail);
    }

    if store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::DuplicateUser);
    }

    let password_hash = hash_password(&password)?;
    let user = store
        .create(NewUser {
            email,
            username,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => AuthError::DuplicateUser,
            other => AuthError::Store(other),
        })?;

    info!(
        user_id = %user.id,
        email = %user.email,
        created_at = %user.created_at,
        "user registered"
    );
    Ok(user)
}

/// Check credentials and issue a bearer token.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AuthError> {
    let (Some(email), Some(password)) = (normalize_email(req.email), present(req.password)) else {
        return Err(AuthError::MissingCredentials);
    };

    let Some(user) = store.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&password, hash);
        }
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let access_token = keys.sign(&user.email)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(LoginResponse {
        access_token,
        user_name: user.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::MemoryUserStore, config::JwtConfig};

    /// Lookups always miss, so only the insert can notice a taken email.
    #[derive(Default)]
    struct RacingStore(MemoryUserStore);

    #[async_trait::async_trait]
    impl UserStore for RacingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
            self.0.create(new_user).await
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 15,
        })
    }

    fn registration(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn credentials(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = MemoryUserStore::default();
        let user = register(&store, registration("a", "A@X.com ", "p"))
            .await
            .expect("register");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.username, "a");
        assert_ne!(user.password_hash, "p");
        assert!(verify_password("p", &user.password_hash).expect("verify"));
    }

    #[tokio::test]
    async fn second_registration_with_same_email_is_duplicate() {
        let store = MemoryUserStore::default();
        register(&store, registration("a", "a@x.com", "p"))
            .await
            .expect("first registration");
        let err = register(&store, registration("b", "a@x.com", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUser));
    }

    #[tokio::test]
    async fn insert_conflict_after_missed_lookup_is_duplicate() {
        let store = RacingStore::default();
        register(&store, registration("a", "a@x.com", "p"))
            .await
            .expect("first registration");
        let err = register(&store, registration("b", "a@x.com", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUser));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn register_requires_username_and_password() {
        let store = MemoryUserStore::default();
        let err = register(
            &store,
            RegisterRequest {
                username: None,
                email: Some("a@x.com".into()),
                password: Some("p".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));

        let err = register(&store, registration("a", "a@x.com", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn register_requires_well_formed_email() {
        let store = MemoryUserStore::default();
        let err = register(
            &store,
            RegisterRequest {
                username: Some("a".into()),
                email: None,
                password: Some("p".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::MissingEmail));

        let err = register(&store, registration("a", "not-an-email", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn login_issues_token_for_registered_user() {
        let store = MemoryUserStore::default();
        let keys = keys();
        register(&store, registration("a", "a@x.com", "p"))
            .await
            .expect("register");

        let res = login(&store, &keys, credentials("a@x.com", "p"))
            .await
            .expect("login");
        assert_eq!(res.user_name, "a");
        let claims = keys.verify(&res.access_token).expect("token verifies");
        assert_eq!(claims.sub, "a@x.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let store = MemoryUserStore::default();
        let keys = keys();
        register(&store, registration("a", "a@x.com", "p"))
            .await
            .expect("register");

        let wrong_password = login(&store, &keys, credentials("a@x.com", "nope"))
            .await
            .unwrap_err();
        let unknown_email = login(&store, &keys, credentials("ghost@x.com", "p"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn unknown_email_padding_hash_is_verifiable() {
        let hash = DUMMY_HASH.as_deref().expect("padding hash built");
        assert!(!verify_password("p", hash).expect("padding hash parses"));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = MemoryUserStore::default();
        let err = login(&store, &keys(), LoginRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }
}
