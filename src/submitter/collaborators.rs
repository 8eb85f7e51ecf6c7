//! Collaborator capabilities
//!
//! Validation, minting and encryption are black boxes to the store. Each is
//! a trait with one production-shaped implementation and one deterministic
//! double for tests.

use rand::{Rng, RngCore};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::observability::{log_event_with_fields, Event};

/// Highest score the sampled validator reports.
pub const SCORE_CEILING: f64 = 0.9199 + 1e-7;

/// Scores an opaque proof. Contract: a finite value in `[0, 1]`.
pub trait Validator: Send + Sync {
    fn validate(&self, input: &Value) -> f64;
}

/// Produces an opaque token for a validated task.
pub trait Minter: Send + Sync {
    fn mint(&self, pillar: &str, derived_id: &str, score: f64) -> String;
}

/// Encrypts a response body.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8>;
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Estimates a score by Bernoulli sampling, with the success probability
/// seeded from a digest of the proof. Approximate and non-deterministic.
#[derive(Debug, Clone)]
pub struct SampledValidator {
    shots: u32,
    ceiling: f64,
}

impl SampledValidator {
    pub fn new(shots: u32) -> Self {
        Self {
            shots: shots.max(1),
            ceiling: SCORE_CEILING,
        }
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling.clamp(0.0, 1.0);
        self
    }

    fn probability(input: &Value) -> f64 {
        let canonical = serde_json::to_vec(input).unwrap_or_default();
        let digest = sha256(&[&canonical]);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head) as f64 / u64::MAX as f64
    }
}

impl Default for SampledValidator {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Validator for SampledValidator {
    fn validate(&self, input: &Value) -> f64 {
        let p = Self::probability(input);
        let mut rng = rand::thread_rng();
        let hits = (0..self.shots).filter(|_| rng.gen_bool(p)).count();
        (hits as f64 / self.shots as f64).min(self.ceiling)
    }
}

/// Always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedValidator(pub f64);

impl Validator for FixedValidator {
    fn validate(&self, _input: &Value) -> f64 {
        self.0
    }
}

/// Derives a transaction-hash shaped token from the inputs and mint time.
#[derive(Debug, Clone)]
pub struct LedgerMinter {
    chain: String,
}

impl LedgerMinter {
    pub fn new(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }
}

impl Default for LedgerMinter {
    fn default() -> Self {
        Self::new("pol")
    }
}

impl Minter for LedgerMinter {
    fn mint(&self, pillar: &str, derived_id: &str, score: f64) -> String {
        let minted_at = chrono::Utc::now().timestamp_millis();
        let digest = sha256(&[
            pillar.as_bytes(),
            derived_id.as_bytes(),
            &score.to_le_bytes(),
            &minted_at.to_le_bytes(),
        ]);
        let token = format!("0x{}", to_hex(&digest));

        log_event_with_fields(
            Event::TokenMinted,
            &[("chain", &self.chain), ("pillar", pillar), ("token", &token)],
        );
        token
    }
}

/// Returns `<prefix><pillar>` so tests can predict the token.
#[derive(Debug, Clone)]
pub struct FixedMinter {
    prefix: String,
}

impl FixedMinter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Minter for FixedMinter {
    fn mint(&self, pillar: &str, _derived_id: &str, _score: f64) -> String {
        format!("{}{}", self.prefix, pillar)
    }
}

const NONCE_LEN: usize = 16;

/// Stream cipher over a SHA-256 keystream with a random per-process key.
/// Output is `nonce || ciphertext`.
pub struct KeystreamEncryptor {
    key: [u8; 32],
}

impl KeystreamEncryptor {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_key(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn apply_keystream(&self, nonce: &[u8], data: &mut [u8]) {
        for (counter, chunk) in data.chunks_mut(32).enumerate() {
            let block = sha256(&[&self.key, nonce, &(counter as u64).to_le_bytes()]);
            for (byte, k) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= k;
            }
        }
    }

    /// Inverse of `encrypt`. `None` if the input is shorter than a nonce.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return None;
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        let mut plain = body.to_vec();
        self.apply_keystream(nonce, &mut plain);
        Some(plain)
    }
}

impl std::fmt::Debug for KeystreamEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystreamEncryptor").finish_non_exhaustive()
    }
}

impl Encryptor for KeystreamEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut body = plaintext.to_vec();
        self.apply_keystream(&nonce, &mut body);

        let mut out = Vec::with_capacity(NONCE_LEN + body.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&body);
        out
    }
}

/// Returns the plaintext unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEncryptor;

impl Encryptor for IdentityEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sampled_score_in_range_and_capped() {
        let validator = SampledValidator::new(200);
        for proof in [json!({"data": "complexity.lean4"}), json!(null), json!([1, 2, 3])] {
            let score = validator.validate(&proof);
            assert!((0.0..=SCORE_CEILING).contains(&score));
        }

        let capped = SampledValidator::new(50).with_ceiling(0.0);
        assert_eq!(capped.validate(&json!({"x": 1})), 0.0);
    }

    #[test]
    fn test_probability_is_stable_per_input() {
        let a = SampledValidator::probability(&json!({"b": 1, "a": 2}));
        let b = SampledValidator::probability(&json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn test_ledger_token_shape() {
        let token = LedgerMinter::default().mint("P vs NP", "ipfs://dna_P vs NP", 0.5);
        assert!(token.starts_with("0x"));
        assert_eq!(token.len(), 2 + 64);
        assert!(token[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fixed_doubles() {
        assert_eq!(FixedValidator(0.25).validate(&json!({})), 0.25);
        assert_eq!(FixedMinter::new("0xtest_").mint("hodge", "", 0.0), "0xtest_hodge");
        assert_eq!(IdentityEncryptor.encrypt(b"abc"), b"abc".to_vec());
    }

    #[test]
    fn test_keystream_roundtrip_and_nonce() {
        let enc = KeystreamEncryptor::from_key([7u8; 32]);
        let message = b"Time is us. A message longer than one keystream block of 32 bytes.";

        let c1 = enc.encrypt(message);
        let c2 = enc.encrypt(message);

        assert_ne!(c1, c2);
        assert_ne!(&c1[NONCE_LEN..], &message[..]);
        assert_eq!(enc.decrypt(&c1).unwrap(), message.to_vec());
        assert_eq!(enc.decrypt(&c2).unwrap(), message.to_vec());
        assert!(enc.decrypt(&[0u8; 3]).is_none());
    }
}
