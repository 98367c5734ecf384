//! Port for one-way password hashing.
use crate::domain::Password;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// Hashes and verifies passwords.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string with a fresh salt.
    fn hash(&self, password: &Password) -> Result<String, PasswordHashError>;

    /// Check a presented password against a stored hash.
    fn verify(&self, password: &Password, hash: &str) -> Result<bool, PasswordHashError>;
}
