//! Random tokens for share links, login links and sessions.

use rand::RngExt;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

/// Length of the public share token on `/s/{token}`.
pub const SECRET_TOKEN_LEN: usize = 10;

/// Length of login-link and session tokens.
pub const AUTH_TOKEN_LEN: usize = 32;

/// Generate a URL-safe alphanumeric token of `len` characters.
pub fn generate(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Token for a new entry's share link.
pub fn secret_token() -> String {
    generate(SECRET_TOKEN_LEN)
}

/// SHA-256 hex digest; auth tokens are only stored in this form.
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn secret_token_shape() {
        let token = secret_token();
        assert_eq!(token.len(), SECRET_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000).map(|_| secret_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn digest_is_stable_hex() {
        let a = digest("abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, digest("abc"));
        assert_ne!(a, digest("abd"));
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
