//! Ed25519 Curve Implementation
//!
//! Used by TON wallets for every signature.
//!
//! Features:
//! - EdDSA signing and verification (RFC 8032)
//! - SLIP-0010 key derivation (hardened only)

use super::{CurveError, DerivedKey, EllipticCurve, KeyDerivation};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use zeroize::Zeroizing;

type HmacSha512 = Hmac<sha2::Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Ed25519 curve implementation
pub struct Ed25519Curve;

impl EllipticCurve for Ed25519Curve {
    type PrivateKey = Zeroizing<[u8; 32]>;
    type PublicKey = [u8; 32];
    type Signature = [u8; 64];

    fn generate_keypair(seed: &[u8]) -> Result<(Self::PrivateKey, Self::PublicKey), CurveError> {
        if seed.len() < 32 {
            return Err(CurveError::InvalidSeed(format!(
                "Seed must be at least 32 bytes, got {}",
                seed.len()
            )));
        }

        let mut sk_bytes = Zeroizing::new([0u8; 32]);
        sk_bytes.copy_from_slice(&seed[..32]);

        let signing_key = SigningKey::from_bytes(&sk_bytes);
        let public_key = signing_key.verifying_key().to_bytes();

        Ok((sk_bytes, public_key))
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let signing_key = signing_key_from_slice(private_key)?;
        Ok(signing_key.verifying_key().to_bytes())
    }

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError> {
        let signing_key = signing_key_from_slice(private_key)?;
        Ok(signing_key.sign(message).to_bytes())
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        let pk_bytes: [u8; 32] = public_key.try_into().map_err(|_| {
            CurveError::InvalidPublicKey(format!(
                "Public key must be 32 bytes, got {}",
                public_key.len()
            ))
        })?;
        let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
            CurveError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            ))
        })?;

        let verifying_key = VerifyingKey::from_bytes(&pk_bytes)
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?;
        let sig = Signature::from_bytes(&sig_bytes);

        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

impl KeyDerivation for Ed25519Curve {
    fn master_key(seed: &[u8]) -> Result<DerivedKey, CurveError> {
        let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
            .map_err(|e| CurveError::DerivationFailed(e.to_string()))?;
        mac.update(seed);
        Ok(split_hmac(&mac.finalize().into_bytes()))
    }

    fn derive_child(parent: &DerivedKey, index: u32, hardened: bool) -> Result<DerivedKey, CurveError> {
        // Ed25519 only supports hardened derivation (SLIP-0010)
        if !hardened {
            return Err(CurveError::DerivationFailed(
                "Ed25519 only supports hardened derivation".into(),
            ));
        }
        if index >= HARDENED_OFFSET {
            return Err(CurveError::DerivationFailed(format!(
                "Index {} exceeds hardened range",
                index
            )));
        }

        let mut mac = HmacSha512::new_from_slice(&parent.chain_code[..])
            .map_err(|e| CurveError::DerivationFailed(e.to_string()))?;

        // SLIP-0010: 0x00 || private_key || index
        mac.update(&[0x00]);
        mac.update(&parent.private_key[..]);
        mac.update(&(index | HARDENED_OFFSET).to_be_bytes());

        Ok(split_hmac(&mac.finalize().into_bytes()))
    }
}

fn split_hmac(output: &[u8]) -> DerivedKey {
    let mut private_key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    private_key.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..64]);
    DerivedKey {
        private_key,
        chain_code,
    }
}

fn signing_key_from_slice(private_key: &[u8]) -> Result<SigningKey, CurveError> {
    let sk_bytes: Zeroizing<[u8; 32]> =
        Zeroizing::new(private_key.try_into().map_err(|_| {
            CurveError::InvalidPrivateKey(format!(
                "Private key must be 32 bytes, got {}",
                private_key.len()
            ))
        })?);
    Ok(SigningKey::from_bytes(&sk_bytes))
}
