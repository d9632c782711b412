//! Elliptic Curve Traits
//!
//! Defines the common interface for curve implementations.

use zeroize::Zeroizing;

use super::CurveError;
use crate::wallet::DerivationPath;

/// Core trait for elliptic curve operations
pub trait EllipticCurve {
    /// The private key type
    type PrivateKey: AsRef<[u8]>;
    /// The public key type
    type PublicKey: AsRef<[u8]>;
    /// The signature type
    type Signature: AsRef<[u8]>;

    /// Generate a keypair from a 32-byte seed
    fn generate_keypair(seed: &[u8]) -> Result<(Self::PrivateKey, Self::PublicKey), CurveError>;

    /// Derive the public key from a private key
    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError>;

    /// Sign a message with a private key
    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError>;

    /// Verify a signature
    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError>;
}

/// Private key material produced by path derivation
pub struct DerivedKey {
    pub private_key: Zeroizing<[u8; 32]>,
    pub chain_code: Zeroizing<[u8; 32]>,
}

/// Extended trait for curves that support hierarchical derivation
pub trait KeyDerivation: EllipticCurve {
    /// Derive the master key from a seed
    fn master_key(seed: &[u8]) -> Result<DerivedKey, CurveError>;

    /// Derive one child from its parent
    fn derive_child(parent: &DerivedKey, index: u32, hardened: bool) -> Result<DerivedKey, CurveError>;

    /// Derive along a full path (e.g. "m/44'/607'/0'")
    fn derive_path(seed: &[u8], path: &DerivationPath) -> Result<DerivedKey, CurveError> {
        let mut key = Self::master_key(seed)?;
        for component in &path.components {
            key = Self::derive_child(&key, component.index, component.hardened)?;
        }
        Ok(key)
    }
}
