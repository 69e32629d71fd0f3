use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Role;

#[derive(Debug, Default, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Checks `password` against the stored argon2 hash.
    /// An unparsable stored hash never verifies.
    pub fn verify_password(&self, password: &str) -> bool {
        match PasswordHash::new(&self.hashed_password) {
            Ok(hash) => Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Hashes a plaintext password with argon2 and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            hashed_password: hash_password(password).unwrap(),
            role: Role::User,
            ..Default::default()
        }
    }

    #[test]
    fn verifies_correct_password_only() {
        let user = user_with_password("hunter2");
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("hunter3"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn plaintext_stored_password_never_verifies() {
        let user = User {
            hashed_password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!user.verify_password("hunter2"));
    }
}
