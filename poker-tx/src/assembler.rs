//! Assembly of unsigned transactions.

use prost::Message;

use crate::config::Fee;
use crate::error::{Error, Result};
use crate::messages::TypeRegistry;
use crate::proto::{self, Any, TxBody};

/// One or more payloads plus fee and gas limit, with the body already in its
/// canonical byte form.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    /// Decoded body.
    body: TxBody,
    /// `body` in canonical encoding.
    body_bytes: Vec<u8>,
    /// Fee and gas limit.
    fee: proto::Fee,
}

impl UnsignedTransaction {
    /// Wraps `messages` into a transaction body.
    ///
    /// Every message must carry a type URL known to `registry`, and at least one
    /// message is required.
    pub fn assemble(
        messages: Vec<Any>,
        fee: &Fee,
        gas_limit: u64,
        memo: &str,
        registry: &TypeRegistry,
    ) -> Result<Self> {
        if messages.is_empty() {
            return Err(Error::EncodingError {
                reason: "a transaction needs at least one message".to_string(),
            });
        }
        if let Some(unknown) = messages.iter().find(|m| !registry.contains(&m.type_url)) {
            return Err(Error::EncodingError {
                reason: format!("unregistered message type '{}'", unknown.type_url),
            });
        }

        let body = TxBody {
            messages,
            memo: memo.to_string(),
            timeout_height: 0,
        };
        let body_bytes = body.encode_to_vec();

        Ok(Self {
            body,
            body_bytes,
            fee: proto::Fee {
                amount: vec![proto::Coin {
                    denom: fee.denom.clone(),
                    amount: fee.amount.to_string(),
                }],
                gas_limit,
                payer: String::new(),
                granter: String::new(),
            },
        })
    }

    /// Canonical encoding of the transaction body.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    /// The payloads in order.
    pub fn messages(&self) -> &[Any] {
        &self.body.messages
    }

    /// The memo.
    pub fn memo(&self) -> &str {
        &self.body.memo
    }

    /// The fee as it will appear in the auth info.
    pub fn fee(&self) -> &proto::Fee {
        &self.fee
    }

    /// Gas ceiling.
    pub fn gas_limit(&self) -> u64 {
        self.fee.gas_limit
    }
}

/// Decodes canonical body bytes.
pub fn decode_body(bytes: &[u8]) -> Result<TxBody> {
    TxBody::decode(bytes).map_err(|e| Error::EncodingError {
        reason: format!("invalid transaction body: {e}"),
    })
}
