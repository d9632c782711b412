//! Key Resolution Service
//!
//! Turns a recovery phrase into the key pair that controls a participant's
//! wallet. Indexed schemes scan account indices until the derived wallet
//! address matches the address the participant declared.

use rayon::prelude::*;
use zeroize::Zeroizing;

use super::derivation_path::DerivationPath;
use super::mnemonic::RecoveryPhrase;
use super::scheme::{DerivationScheme, SeedKind};
use crate::config::{CosignSettings, SearchSettings};
use crate::crypto::{Ed25519Curve, KeyDerivation};
use crate::error::{CosignError, CosignResult};
use crate::multisig::{KeyPair, Signer};
use crate::ton::{TonAddress, WalletDeriver};
use crate::{log_debug, log_info};

/// A key pair together with where it was found
#[derive(Debug)]
pub struct ResolvedKey {
    pub keypair: KeyPair,
    pub address: TonAddress,
    /// Account index, `None` for schemes without a path
    pub account_index: Option<u32>,
}

/// Resolves participant keys under the configured search bounds
#[derive(Debug, Clone)]
pub struct KeyResolver {
    search: SearchSettings,
    deriver: WalletDeriver,
    workchain: i32,
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            deriver: WalletDeriver::default(),
            workchain: crate::ton::BASE_WORKCHAIN,
        }
    }
}

impl KeyResolver {
    pub fn new(settings: &CosignSettings) -> CosignResult<Self> {
        Ok(Self {
            search: settings.search.clone(),
            deriver: settings.wallet_deriver()?,
            workchain: settings.workchain,
        })
    }

    /// Resolve the key pair for `phrase` under `scheme`.
    ///
    /// - `Standard` derives its single key and skips the address check
    /// - With `account_index`, only that index is derived and `target`,
    ///   if given, is checked against it
    /// - Otherwise indices are scanned until the address matches `target`
    pub fn resolve(
        &self,
        phrase: &RecoveryPhrase,
        scheme: DerivationScheme,
        account_index: Option<u32>,
        target: Option<&TonAddress>,
    ) -> CosignResult<ResolvedKey> {
        let profile = scheme.profile();

        let seed = match profile.seed {
            SeedKind::TonNative => {
                let seed = phrase.ton_seed()?;
                let keypair = KeyPair::from_seed(&seed[..32])?;
                let address = self.address_of(&keypair, scheme)?;
                log_debug!("resolver", "Derived standard wallet key", address = address);
                return Ok(ResolvedKey {
                    keypair,
                    address,
                    account_index: None,
                });
            }
            SeedKind::Bip39 => phrase.bip39_seed()?,
        };

        if let Some(index) = account_index {
            let resolved = self.derive_at(&seed, scheme, index)?;
            if let Some(target) = target {
                if !resolved.address.same_account(target) {
                    return Err(CosignError::key_not_found(target).with_details(format!(
                        "account index {} derives {}",
                        index, resolved.address
                    )));
                }
            }
            return Ok(resolved);
        }

        let target = target.ok_or_else(|| {
            CosignError::invalid_address(format!(
                "A declared address is required to search {} keys",
                scheme
            ))
        })?;

        let range = self.search.range();
        log_info!(
            "resolver",
            "Searching account indices",
            scheme = scheme,
            target = target,
            start = range.start,
            end = range.end,
            parallel = self.search.parallel
        );

        let found = if self.search.parallel {
            self.search_parallel(&seed, scheme, target)?
        } else {
            self.search_sequential(&seed, scheme, target)?
        };

        match found {
            Some(resolved) => {
                log_info!(
                    "resolver",
                    "Found matching key",
                    scheme = scheme,
                    account_index = resolved.account_index.unwrap_or_default()
                );
                Ok(resolved)
            }
            None => Err(CosignError::key_not_found(target).with_details(format!(
                "searched {} indices from {}",
                range.len(),
                range.start
            ))),
        }
    }

    /// Derive the key and wallet address at one account index
    pub fn derive_at(
        &self,
        seed: &Zeroizing<[u8; 64]>,
        scheme: DerivationScheme,
        index: u32,
    ) -> CosignResult<ResolvedKey> {
        let path = scheme.path(index).ok_or_else(|| {
            CosignError::invalid_input(format!("{} keys have no account index", scheme))
        })?;
        let keypair = keypair_at(&seed[..], &path)?;
        let address = self.address_of(&keypair, scheme)?;
        Ok(ResolvedKey {
            keypair,
            address,
            account_index: Some(index),
        })
    }

    /// Wallet address for `keypair` under `scheme`'s contract version
    pub fn address_of(&self, keypair: &KeyPair, scheme: DerivationScheme) -> CosignResult<TonAddress> {
        self.deriver
            .derive_address(&keypair.public_key(), scheme.profile().version, self.workchain)
    }

    fn search_sequential(
        &self,
        seed: &Zeroizing<[u8; 64]>,
        scheme: DerivationScheme,
        target: &TonAddress,
    ) -> CosignResult<Option<ResolvedKey>> {
        for index in self.search.range() {
            let resolved = self.derive_at(seed, scheme, index)?;
            if resolved.address.same_account(target) {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    fn search_parallel(
        &self,
        seed: &Zeroizing<[u8; 64]>,
        scheme: DerivationScheme,
        target: &TonAddress,
    ) -> CosignResult<Option<ResolvedKey>> {
        let scan = || {
            self.search
                .range()
                .into_par_iter()
                .find_map_first(|index| match self.derive_at(seed, scheme, index) {
                    Ok(resolved) if resolved.address.same_account(target) => Some(Ok(resolved)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
                .transpose()
        };

        if self.search.threads == 0 {
            return scan();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.search.threads)
            .build()
            .map_err(|e| CosignError::internal(format!("Cannot start search pool: {}", e)))?;
        pool.install(scan)
    }
}

fn keypair_at(seed: &[u8], path: &DerivationPath) -> CosignResult<KeyPair> {
    let derived = Ed25519Curve::derive_path(seed, path)?;
    KeyPair::from_seed(&derived.private_key[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn phrase() -> RecoveryPhrase {
        RecoveryPhrase::new(ABANDON).unwrap()
    }

    fn resolver(max_index: u32, parallel: bool) -> KeyResolver {
        let mut settings = CosignSettings::default();
        settings.search.max_index = max_index;
        settings.search.parallel = parallel;
        KeyResolver::new(&settings).unwrap()
    }

    fn expected_address(scheme: DerivationScheme, index: u32) -> TonAddress {
        let r = KeyResolver::default();
        r.resolve(&phrase(), scheme, Some(index), None).unwrap().address
    }

    #[test]
    fn test_standard_key_vector() {
        let resolved = KeyResolver::default()
            .resolve(&phrase(), DerivationScheme::Standard, None, None)
            .unwrap();
        assert_eq!(
            resolved.keypair.public_key_hex(),
            "af19469000fc85b42ef8800249debdaf430dc91da21f45a7da137f51062cdc91"
        );
        assert!(resolved.account_index.is_none());
    }

    #[test]
    fn test_ledger_and_multichain_vectors() {
        let r = KeyResolver::default();
        let ledger = r.resolve(&phrase(), DerivationScheme::Ledger, Some(1), None).unwrap();
        assert_eq!(
            ledger.keypair.public_key_hex(),
            "0420c9a5d43e9a1bc0bbe0ebc27bf722cb97968c429dac8d5ee49a3fe7e68f1e"
        );
        let multi = r.resolve(&phrase(), DerivationScheme::MultiChain, Some(2), None).unwrap();
        assert_eq!(
            multi.keypair.public_key_hex(),
            "f4048c346dc4efbd6cabf8aae7248b8a82cef35c558bbdb14fc65899f8a574ca"
        );
    }

    #[test]
    fn test_search_finds_lowest_matching_index() {
        let target = expected_address(DerivationScheme::Ledger, 2);
        let resolved = resolver(10, false)
            .resolve(&phrase(), DerivationScheme::Ledger, None, Some(&target))
            .unwrap();
        assert_eq!(resolved.account_index, Some(2));
        assert!(resolved.address.same_account(&target));
    }

    #[test]
    fn test_parallel_search_matches_sequential() {
        let target = expected_address(DerivationScheme::MultiChain, 3);
        let sequential = resolver(8, false)
            .resolve(&phrase(), DerivationScheme::MultiChain, None, Some(&target))
            .unwrap();
        let parallel = resolver(8, true)
            .resolve(&phrase(), DerivationScheme::MultiChain, None, Some(&target))
            .unwrap();
        assert_eq!(sequential.account_index, parallel.account_index);
        assert_eq!(sequential.keypair.public_key(), parallel.keypair.public_key());
    }

    #[test]
    fn test_search_exhaustion_is_key_not_found() {
        let target = expected_address(DerivationScheme::Ledger, 5);
        let err = resolver(5, false)
            .resolve(&phrase(), DerivationScheme::Ledger, None, Some(&target))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::KeyNotFound);
    }

    #[test]
    fn test_explicit_index_checks_target() {
        let target = expected_address(DerivationScheme::Ledger, 0);
        let r = KeyResolver::default();
        assert!(r.resolve(&phrase(), DerivationScheme::Ledger, Some(0), Some(&target)).is_ok());
        let err = r
            .resolve(&phrase(), DerivationScheme::Ledger, Some(1), Some(&target))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::KeyNotFound);
    }

    #[test]
    fn test_search_requires_target() {
        let err = KeyResolver::default()
            .resolve(&phrase(), DerivationScheme::Ledger, None, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddressFormat);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = KeyResolver::default();
        let a = r.resolve(&phrase(), DerivationScheme::Ledger, Some(4), None).unwrap();
        let b = r.resolve(&phrase(), DerivationScheme::Ledger, Some(4), None).unwrap();
        assert_eq!(a.keypair.public_key(), b.keypair.public_key());
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn test_schemes_use_their_contract_version() {
        let r = KeyResolver::default();
        let ledger = r.resolve(&phrase(), DerivationScheme::Ledger, Some(0), None).unwrap();
        let deriver = WalletDeriver::default();
        let v4 = deriver
            .derive_address(&ledger.keypair.public_key(), crate::ton::WalletVersion::V4R2, 0)
            .unwrap();
        assert_eq!(ledger.address, v4);
    }
}
