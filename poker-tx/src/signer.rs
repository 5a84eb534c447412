//! Signing of assembled transactions under SIGN_MODE_DIRECT.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, VerifyingKey};
use prost::Message;
use sha2::{Digest, Sha256};
use snafu::ResultExt;

use crate::assembler::UnsignedTransaction;
use crate::error::*;
use crate::keys::Keypair;
use crate::proto::{
    Any, AuthInfo, ModeInfo, ModeInfoSingle, PubKey, SignDoc, SignerInfo, TxRaw,
    SECP256K1_PUBKEY_TYPE_URL, SIGN_MODE_DIRECT,
};

/// Replay protection and identity bound into a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// Chain the transaction is valid on.
    pub chain_id: String,
    /// Ledger-assigned account number.
    pub account_number: u64,
    /// Next expected sequence of the account.
    pub sequence: u64,
    /// Compressed public key of the signer.
    pub public_key: [u8; 33],
}

impl UnsignedTransaction {
    /// Binds the transaction to `context`, encoding the auth info with its
    /// public key and sequence under `SIGN_MODE_DIRECT`.
    pub fn attach(self, context: SigningContext) -> ReadyToSign {
        let public_key = Any {
            type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
            value: PubKey {
                key: context.public_key.to_vec(),
            }
            .encode_to_vec(),
        };

        let auth_info = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(public_key),
                mode_info: Some(ModeInfo {
                    single: Some(ModeInfoSingle {
                        mode: SIGN_MODE_DIRECT,
                    }),
                }),
                sequence: context.sequence,
            }],
            fee: Some(self.fee().clone()),
        };

        ReadyToSign {
            auth_info_bytes: auth_info.encode_to_vec(),
            unsigned: self,
            context,
        }
    }
}

/// A transaction with its auth info fixed, waiting for a signature.
#[derive(Debug, Clone)]
pub struct ReadyToSign {
    /// The transaction being signed.
    unsigned: UnsignedTransaction,
    /// Context the auth info was built from.
    context: SigningContext,
    /// Canonical auth info.
    auth_info_bytes: Vec<u8>,
}

impl ReadyToSign {
    /// The signing context.
    pub fn context(&self) -> &SigningContext {
        &self.context
    }

    /// Canonical auth info.
    pub fn auth_info_bytes(&self) -> &[u8] {
        &self.auth_info_bytes
    }

    /// Encoded `SignDoc`, the preimage of the signature hash.
    pub fn sign_doc_bytes(&self) -> Vec<u8> {
        sign_doc_bytes(
            self.unsigned.body_bytes(),
            &self.auth_info_bytes,
            &self.context,
        )
    }

    /// Signs with `keypair`.
    ///
    /// Refuses to sign when the keypair is not the one named in the context or
    /// when the auth info carries a different sequence than the context.
    pub fn sign(self, keypair: &Keypair) -> Result<SignedTransaction> {
        if keypair.public_key() != &self.context.public_key {
            return LocalRejectionSnafu {
                reason: RejectReason::PublicKeyMismatch,
            }
            .fail();
        }

        let embedded = signer_sequence(&self.auth_info_bytes)?;
        if embedded != self.context.sequence {
            return LocalRejectionSnafu {
                reason: RejectReason::SequenceMismatch {
                    embedded,
                    context: self.context.sequence,
                },
            }
            .fail();
        }

        // SHA-256 prehash, RFC 6979 nonce, low-S normalized.
        let signature: Signature = keypair
            .signing_key()
            .try_sign(&self.sign_doc_bytes())
            .context(SigningSnafu)?;

        Ok(SignedTransaction {
            body_bytes: self.unsigned.body_bytes().to_vec(),
            auth_info_bytes: self.auth_info_bytes,
            signature: signature.to_bytes().to_vec(),
        })
    }
}

/// A signed transaction in `TxRaw` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Canonical body.
    body_bytes: Vec<u8>,
    /// Canonical auth info.
    auth_info_bytes: Vec<u8>,
    /// Compact `r || s`.
    signature: Vec<u8>,
}

impl SignedTransaction {
    /// Decodes a `TxRaw` carrying exactly one 64-byte signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = TxRaw::decode(bytes).map_err(|e| Error::EncodingError {
            reason: format!("invalid TxRaw: {e}"),
        })?;
        let [signature]: [Vec<u8>; 1] =
            raw.signatures
                .try_into()
                .map_err(|sigs: Vec<Vec<u8>>| Error::EncodingError {
                    reason: format!("expected one signature, found {}", sigs.len()),
                })?;
        if signature.len() != 64 {
            return Err(Error::EncodingError {
                reason: format!("signature has {} bytes, expected 64", signature.len()),
            });
        }
        Ok(Self {
            body_bytes: raw.body_bytes,
            auth_info_bytes: raw.auth_info_bytes,
            signature,
        })
    }

    /// Wire bytes handed to the broadcast endpoint.
    pub fn to_bytes(&self) -> Vec<u8> {
        TxRaw {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            signatures: vec![self.signature.clone()],
        }
        .encode_to_vec()
    }

    /// Uppercase hex SHA-256 of the wire bytes, as the ledger reports it.
    pub fn hash(&self) -> String {
        hex::encode_upper(Sha256::digest(self.to_bytes()))
    }

    /// Canonical body.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    /// Canonical auth info.
    pub fn auth_info_bytes(&self) -> &[u8] {
        &self.auth_info_bytes
    }

    /// The 64-byte compact signature.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Sequence declared by the single signer.
    pub fn sequence(&self) -> Result<u64> {
        signer_sequence(&self.auth_info_bytes)
    }

    /// Compressed public key declared by the single signer.
    pub fn public_key(&self) -> Result<Vec<u8>> {
        let signer = single_signer(&self.auth_info_bytes)?;
        let any = signer.public_key.ok_or_else(|| Error::EncodingError {
            reason: "signer info has no public key".to_string(),
        })?;
        if any.type_url != SECP256K1_PUBKEY_TYPE_URL {
            return Err(Error::EncodingError {
                reason: format!("unsupported public key type '{}'", any.type_url),
            });
        }
        let key = PubKey::decode(any.value.as_slice()).map_err(|e| Error::EncodingError {
            reason: format!("invalid public key: {e}"),
        })?;
        Ok(key.key)
    }
}

/// Checks that `tx` carries a valid signature for `context`.
///
/// The public key and sequence embedded in the auth info must match the
/// context, and the signature must cover the body, the auth info, the chain id
/// and the account number.
pub fn verify(tx: &SignedTransaction, context: &SigningContext) -> bool {
    match (tx.public_key(), tx.sequence()) {
        (Ok(key), Ok(sequence))
            if key.as_slice() == context.public_key.as_slice() && sequence == context.sequence => {}
        _ => return false,
    }

    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&context.public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&tx.signature) else {
        return false;
    };

    let doc = sign_doc_bytes(&tx.body_bytes, &tx.auth_info_bytes, context);
    verifying_key.verify(&doc, &signature).is_ok()
}

/// Encodes the `SignDoc` for the given parts.
fn sign_doc_bytes(body_bytes: &[u8], auth_info_bytes: &[u8], context: &SigningContext) -> Vec<u8> {
    SignDoc {
        body_bytes: body_bytes.to_vec(),
        auth_info_bytes: auth_info_bytes.to_vec(),
        chain_id: context.chain_id.clone(),
        account_number: context.account_number,
    }
    .encode_to_vec()
}

/// The only signer info in an encoded auth info.
fn single_signer(auth_info_bytes: &[u8]) -> Result<SignerInfo> {
    let auth_info = AuthInfo::decode(auth_info_bytes).map_err(|e| Error::EncodingError {
        reason: format!("invalid auth info: {e}"),
    })?;
    let mut signers = auth_info.signer_infos.into_iter();
    match (signers.next(), signers.next()) {
        (Some(signer), None) => Ok(signer),
        _ => Err(Error::EncodingError {
            reason: "auth info must declare exactly one signer".to_string(),
        }),
    }
}

/// Sequence of the only signer in an encoded auth info.
fn signer_sequence(auth_info_bytes: &[u8]) -> Result<u64> {
    Ok(single_signer(auth_info_bytes)?.sequence)
}
