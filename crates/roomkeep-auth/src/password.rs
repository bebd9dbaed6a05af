//! Password verification using Argon2id, plus the length policy.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Compare `password` (with the optional pepper prefix) to a stored PHC
/// string. A mismatch is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let stored = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("stored hash unreadable: {e}")))?;
    let material = format!("{}{password}", pepper.unwrap_or_default());

    match Argon2::default().verify_password(material.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verifying password: {e}"))),
    }
}

/// Reject passwords shorter than `min` characters.
pub fn check_policy(password: &str, min: usize) -> Result<(), AuthError> {
    if password.chars().count() < min {
        return Err(AuthError::WeakPassword { min });
    }
    Ok(())
}
