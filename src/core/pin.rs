//! Security PIN verification
//!
//! The stock verifier only checks the PIN's shape (exactly four characters).
//! It is not a secret check; a hashing verifier can replace it through
//! `TransferEngine::with_pin_verifier`.

use crate::core::traits::PinVerifier;
use crate::types::User;

/// Accepts any PIN of the configured length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPinCheck {
    length: usize,
}

impl FormatPinCheck {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for FormatPinCheck {
    fn default() -> Self {
        Self::new(4)
    }
}

impl PinVerifier for FormatPinCheck {
    fn verify(&self, _user: &User, pin: &str) -> bool {
        pin.chars().count() == self.length
    }
}
