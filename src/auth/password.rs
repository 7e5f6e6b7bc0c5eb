use crate::error::AppError;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Stored in place of a hash for users created while authentication is disabled.
/// Never verifies, since it is not a valid bcrypt string.
pub const PLACEHOLDER_HASH: &str = "!";

/// Hashes a password for storage.
///
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected instead of being
/// silently truncated by bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::validation(format!(
            "Password too long for bcrypt (max {} bytes)",
            MAX_PASSWORD_BYTES
        )));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    bcrypt::hash(password, cost).map_err(|e| AppError::InternalError(e.to_string()))
}

/// Checks `plain` against a stored hash. Any failure counts as a mismatch.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    if plain.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    bcrypt::verify(plain, hashed).unwrap_or(false)
}
