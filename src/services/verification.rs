// SPDX-License-Identifier: MIT

//! One-time email verification codes.
//!
//! Codes are held in an in-memory table keyed by email: this is a
//! single-process deployment, and a lost code simply means the user
//! requests a new one. A successful verification opens a short window
//! during which registration for that email is allowed.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

const CODE_TTL_MINUTES: i64 = 10;
const VERIFIED_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Outcome of a code check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matched and was consumed
    Valid,
    /// No pending code, or the pending code expired
    Expired,
    /// Code did not match (the pending code stays usable)
    Mismatch,
}

/// In-memory store for pending verification codes.
pub struct VerificationService {
    codes: DashMap<String, PendingCode>,
    verified: DashMap<String, DateTime<Utc>>,
    rng: SystemRandom,
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationService {
    pub fn new() -> Self {
        Self {
            codes: DashMap::new(),
            verified: DashMap::new(),
            rng: SystemRandom::new(),
        }
    }

    /// Issue a fresh 6-digit code for an email, replacing any pending one.
    pub fn issue_code(&self, email: &str) -> String {
        let code = self.random_code();
        self.codes.insert(
            email.to_lowercase(),
            PendingCode {
                code: code.clone(),
                expires_at: Utc::now() + Duration::minutes(CODE_TTL_MINUTES),
            },
        );
        code
    }

    /// Check a submitted code. A correct code is consumed and the email is
    /// marked verified for a short registration window.
    pub fn check_code(&self, email: &str, submitted: &str) -> CodeCheck {
        let email = email.to_lowercase();

        let Some(pending) = self.codes.get(&email).map(|p| p.clone()) else {
            return CodeCheck::Expired;
        };

        if pending.expires_at <= Utc::now() {
            self.codes.remove(&email);
            return CodeCheck::Expired;
        }

        let matches: bool = pending
            .code
            .as_bytes()
            .ct_eq(submitted.as_bytes())
            .into();
        if !matches {
            return CodeCheck::Mismatch;
        }

        self.codes.remove(&email);
        self.verified
            .insert(email, Utc::now() + Duration::minutes(VERIFIED_WINDOW_MINUTES));
        CodeCheck::Valid
    }

    /// Consume the verified flag for an email, if still within the window.
    pub fn take_verified(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        match self.verified.remove(&email) {
            Some((_, expires_at)) => expires_at > Utc::now(),
            None => false,
        }
    }

    fn random_code(&self) -> String {
        let mut buf = [0u8; 4];
        // SystemRandom::fill only fails if the OS RNG is broken; fall back
        // to a time-derived value rather than panicking in a request path.
        if self.rng.fill(&mut buf).is_err() {
            let nanos = Utc::now().timestamp_subsec_nanos();
            buf = nanos.to_be_bytes();
        }
        let n = u32::from_be_bytes(buf) % 900_000 + 100_000;
        n.to_string()
    }
}
