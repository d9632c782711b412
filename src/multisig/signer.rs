//! Signer
//!
//! Holds one resolved Ed25519 key pair and produces detached signatures over
//! 32-byte digests. The secret half zeroizes on drop and is never serialized.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey};

use crate::crypto::{Ed25519Curve, EllipticCurve};
use crate::error::{CosignError, CosignResult};

/// Length of every digest this crate signs (a cell representation hash
/// or a raw transaction hash)
pub const DIGEST_LEN: usize = 32;

/// Anything able to produce participant signatures
pub trait Signer {
    fn public_key(&self) -> [u8; 32];

    /// Sign a 32-byte digest
    fn sign(&self, digest: &[u8]) -> CosignResult<[u8; 64]>;
}

/// Resolved Ed25519 key pair
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: [u8; 32],
}

impl KeyPair {
    /// Build from the first 32 bytes of a seed
    pub fn from_seed(seed: &[u8]) -> CosignResult<Self> {
        let (secret, public_key) = Ed25519Curve::generate_keypair(seed)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
            public_key,
        })
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> [u8; 32] {
        self.public_key
    }

    fn sign(&self, digest: &[u8]) -> CosignResult<[u8; 64]> {
        check_digest(digest)?;
        Ok(self.signing_key.sign(digest).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

/// Verify a participant signature over a 32-byte digest
pub fn verify(public_key: &[u8; 32], digest: &[u8], signature: &[u8; 64]) -> CosignResult<bool> {
    check_digest(digest)?;
    Ok(Ed25519Curve::verify(public_key, digest, signature)?)
}

fn check_digest(digest: &[u8]) -> CosignResult<()> {
    if digest.len() != DIGEST_LEN {
        return Err(CosignError::invalid_digest_length(DIGEST_LEN, digest.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn keypair() -> KeyPair {
        KeyPair::from_seed(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = keypair();
        let digest = [0xAAu8; 32];
        let sig = kp.sign(&digest).unwrap();
        assert!(verify(&kp.public_key(), &digest, &sig).unwrap());
        assert!(!verify(&kp.public_key(), &[0xABu8; 32], &sig).unwrap());
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let digest = [1u8; 32];
        assert_eq!(keypair().sign(&digest).unwrap(), keypair().sign(&digest).unwrap());
    }

    #[test]
    fn test_rejects_wrong_digest_length() {
        let kp = keypair();
        let err = kp.sign(&[0u8; 31]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDigestLength);
        assert!(kp.sign(&[]).is_err());
        assert!(kp.sign(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keypair());
        assert!(rendered.contains("REDACTED"));
        assert!(rendered.contains(&keypair().public_key_hex()));
    }

    #[test]
    fn test_rfc8032_test_1() {
        // RFC 8032 7.1 TEST 1 secret key
        let secret = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60").unwrap();
        let kp = KeyPair::from_seed(&secret).unwrap();
        assert_eq!(
            kp.public_key_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }
}
