//! Credential handling for metric-relay.
//!
//! Auth tokens for the metrics receiver are held in [`SecureString`], which
//! masks itself in `Debug` output and zeroes its memory when dropped.

use zeroize::ZeroizeOnDrop;

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_masks_debug() {
        let secure = SecureString::new("hunter2-token");
        let debug = format!("{secure:?}");
        assert_eq!(debug, "SecureString(***)");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_secure_string_expose() {
        let secure = SecureString::new("abc");
        assert_eq!(secure.expose(), "abc");
        assert!(!secure.is_empty());
        assert!(SecureString::new("").is_empty());
    }
}
