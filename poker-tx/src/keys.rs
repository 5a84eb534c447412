//! Seed phrase handling, BIP-32 derivation and bech32 account identifiers.

use std::fmt;

use bech32::{ToBase32, Variant};
use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, PublicKey, Scalar};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use snafu::ResultExt;

use crate::config::{DerivationPath, HARDENED};
use crate::error::*;

/// HMAC-SHA512 as used by BIP-32.
type HmacSha512 = Hmac<Sha512>;

/// HMAC key of the BIP-32 master node.
const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

/// A validated BIP-39 English mnemonic.
///
/// The words never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedPhrase(Mnemonic);

impl SeedPhrase {
    /// Parses and checksums a mnemonic. Surrounding and repeated whitespace is
    /// ignored; nothing else is corrected.
    pub fn parse(phrase: &str) -> Result<Self> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .context(InvalidSeedPhraseSnafu)?;
        Ok(Self(mnemonic))
    }

    /// Number of words in the phrase.
    pub fn word_count(&self) -> usize {
        self.0.word_count()
    }

    /// The 64-byte BIP-39 seed with an empty passphrase.
    fn to_seed(&self) -> [u8; 64] {
        self.0.to_seed_normalized("")
    }
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedPhrase(<{} words redacted>)", self.word_count())
    }
}

/// load a seed phrase from a file, trimming surrounding whitespace
pub async fn load_seed_phrase(file_path: &str) -> Result<SeedPhrase> {
    let contents = tokio::fs::read_to_string(file_path)
        .await
        .context(SeedFileReadSnafu {
            path: file_path.to_string(),
        })?;

    SeedPhrase::parse(contents.trim())
}

/// A secp256k1 signing keypair.
///
/// The private scalar is zeroized when the keypair is dropped.
#[derive(Clone)]
pub struct Keypair {
    /// Secret half.
    signing_key: SigningKey,
    /// SEC1 compressed public key.
    public_key: [u8; 33],
}

impl Keypair {
    /// Wraps a signing key, caching its compressed public key.
    pub fn from_signing_key(signing_key: SigningKey) -> Result<Self> {
        let encoded = signing_key.verifying_key().to_encoded_point(true);
        let public_key = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::KeyDerivation {
                reason: format!(
                    "compressed public key has {} bytes, expected 33",
                    encoded.len()
                ),
            })?;
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// The compressed public key bytes.
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    /// Key used for ECDSA signing.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Key used for ECDSA verification.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

/// A bech32 account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId {
    /// Rendered address, e.g. `b52...`.
    address: String,
    /// `RIPEMD160(SHA256(pubkey))`.
    hash: [u8; 20],
}

impl AccountId {
    /// Computes the account identifier of a compressed public key.
    pub fn from_public_key(public_key: &[u8], prefix: &str) -> Result<Self> {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&Ripemd160::digest(Sha256::digest(public_key)));
        let address = bech32::encode(prefix, hash.to_base32(), Variant::Bech32).context(
            AddressEncodingSnafu {
                prefix: prefix.to_string(),
            },
        )?;
        Ok(Self { address, hash })
    }

    /// The bech32 string.
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// The raw 20-byte hash.
    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Derives the keypair at `path` from `seed_phrase` and renders its address
/// with `prefix`. Deterministic and free of I/O.
pub fn derive(
    seed_phrase: &SeedPhrase,
    path: &DerivationPath,
    prefix: &str,
) -> Result<(Keypair, AccountId)> {
    let seed = seed_phrase.to_seed();

    let (mut key, mut chain_code) = split_node(&hmac_sha512(MASTER_KEY_SALT, &seed)?, None)?;
    for index in path.indices() {
        let mut data = Vec::with_capacity(37);
        if index & HARDENED != 0 {
            data.push(0);
            data.extend_from_slice(&key.to_repr());
        } else {
            let public = PublicKey::from_secret_scalar(&key).to_encoded_point(true);
            data.extend_from_slice(public.as_bytes());
        }
        data.extend_from_slice(&index.to_be_bytes());

        (key, chain_code) = split_node(&hmac_sha512(&chain_code, &data)?, Some(&key))?;
    }

    let keypair = Keypair::from_signing_key(SigningKey::from(key))?;
    let account = AccountId::from_public_key(keypair.public_key(), prefix)?;
    Ok((keypair, account))
}

/// One HMAC-SHA512 invocation.
fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|e| Error::KeyDerivation {
        reason: e.to_string(),
    })?;
    mac.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}

/// Splits an HMAC output into `(IL + parent) mod n` and the chain code,
/// rejecting `IL >= n` and a zero child.
fn split_node(
    output: &[u8; 64],
    parent: Option<&NonZeroScalar>,
) -> Result<(NonZeroScalar, [u8; 32])> {
    let (il, ir) = output.split_at(32);

    let tweak: Option<Scalar> = Scalar::from_repr(FieldBytes::clone_from_slice(il)).into();
    let tweak = tweak.ok_or_else(|| Error::KeyDerivation {
        reason: "derived tweak is not below the curve order".to_string(),
    })?;

    let child = match parent {
        Some(parent) => tweak + parent.as_ref(),
        None => tweak,
    };
    let child: Option<NonZeroScalar> = NonZeroScalar::new(child).into();
    let child = child.ok_or_else(|| Error::KeyDerivation {
        reason: "derived key is zero".to_string(),
    })?;

    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(ir);
    Ok((child, chain_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn we_can_derive_the_reference_cosmos_account() {
        let seed = SeedPhrase::parse(ABANDON).unwrap();
        let (keypair, account) = derive(&seed, &DerivationPath::cosmos(), "cosmos").unwrap();

        assert_eq!(
            hex::encode(keypair.public_key()),
            "024f4e2ad99c34d60b9ba6283c9431a8418af8673212961f97a77b6377fcd05b62"
        );
        assert_eq!(
            hex::encode(keypair.signing_key().to_bytes()),
            "c4a48e2fce1481cd3294b4490f6678090ea98d3d0e5cd984558ab0968741b104"
        );
        assert_eq!(
            account.as_str(),
            "cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4"
        );
        assert_eq!(
            hex::encode(account.hash()),
            "28ff5c6d57d8cfd492b6fb42614536ed648e01fd"
        );
    }

    #[test]
    fn we_can_render_the_same_key_with_the_pokerchain_prefix() {
        let seed = SeedPhrase::parse(ABANDON).unwrap();
        let (_, account) = derive(&seed, &DerivationPath::cosmos(), "b52").unwrap();
        assert_eq!(account.to_string(), "b5219rl4cm2hmr8afy4kldpxz3fka4jguq0avffg09");
    }

    #[test]
    fn derivation_is_deterministic() {
        let seed = SeedPhrase::parse(ABANDON).unwrap();
        let (a, id_a) = derive(&seed, &DerivationPath::cosmos(), "b52").unwrap();
        let (b, id_b) = derive(&seed, &DerivationPath::cosmos(), "b52").unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn a_different_path_gives_a_different_account() {
        let seed = SeedPhrase::parse(ABANDON).unwrap();
        let other = DerivationPath {
            address_index: 1,
            ..DerivationPath::cosmos()
        };
        let (_, first) = derive(&seed, &DerivationPath::cosmos(), "b52").unwrap();
        let (_, second) = derive(&seed, &other, "b52").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn we_can_parse_phrases_with_irregular_whitespace() {
        let messy = format!("  {}\n", ABANDON.replace(' ', "   "));
        assert_eq!(
            SeedPhrase::parse(&messy).unwrap(),
            SeedPhrase::parse(ABANDON).unwrap()
        );
    }

    #[test]
    fn we_cannot_parse_a_phrase_with_a_bad_checksum() {
        let bad = ABANDON.replace("about", "abandon");
        assert!(matches!(
            SeedPhrase::parse(&bad),
            Err(Error::InvalidSeedPhrase { .. })
        ));
    }

    #[test]
    fn we_cannot_parse_unknown_words() {
        let bad = ABANDON.replace("about", "notaword");
        assert!(matches!(
            SeedPhrase::parse(&bad),
            Err(Error::InvalidSeedPhrase { .. })
        ));
    }

    #[test]
    fn debug_output_never_contains_the_words() {
        let seed = SeedPhrase::parse(ABANDON).unwrap();
        let rendered = format!("{seed:?}");
        assert!(!rendered.contains("abandon"));
        assert!(rendered.contains("12 words"));
    }

    #[test]
    fn we_cannot_encode_an_address_with_an_empty_prefix() {
        assert!(matches!(
            AccountId::from_public_key(&[2u8; 33], ""),
            Err(Error::AddressEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn we_can_load_a_seed_phrase_from_a_file() {
        let path = std::env::temp_dir().join(format!("poker-tx-seed-{}", std::process::id()));
        tokio::fs::write(&path, format!("{ABANDON}\n")).await.unwrap();

        let seed = load_seed_phrase(path.to_str().unwrap()).await.unwrap();
        assert_eq!(seed, SeedPhrase::parse(ABANDON).unwrap());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn we_cannot_load_a_missing_seed_file() {
        let result = load_seed_phrase("/definitely/not/here/seed.txt").await;
        assert!(matches!(result, Err(Error::SeedFileRead { .. })));
    }
}
