//! gRPC access to the ledger node.

use async_trait::async_trait;
use log::{debug, info};
use prost::Message;
use serde::Serialize;
use snafu::ResultExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::http::Uri;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Request, Status};

use crate::config::NetworkConfig;
use crate::error::*;
use crate::keys::AccountId;
use crate::proto::{
    Any, BaseAccount, BroadcastTxRequest, BroadcastTxResponse, QueryAccountRequest,
    QueryAccountResponse, QueryAllBalancesRequest, QueryAllBalancesResponse, QueryGameRequest,
    QueryGameResponse, QueryLegalActionsRequest, QueryLegalActionsResponse, VestingAccount,
    BROADCAST_MODE_SYNC,
};

/// `cosmos.auth.v1beta1.Query/Account`
pub const ACCOUNT_METHOD: &str = "/cosmos.auth.v1beta1.Query/Account";
/// `cosmos.tx.v1beta1.Service/BroadcastTx`
pub const BROADCAST_TX_METHOD: &str = "/cosmos.tx.v1beta1.Service/BroadcastTx";
/// `pokerchain.poker.v1.Query/LegalActions`
pub const LEGAL_ACTIONS_METHOD: &str = "/pokerchain.poker.v1.Query/LegalActions";
/// `cosmos.bank.v1beta1.Query/AllBalances`
pub const ALL_BALANCES_METHOD: &str = "/cosmos.bank.v1beta1.Query/AllBalances";
/// `pokerchain.poker.v1.Query/Game`
pub const GAME_METHOD: &str = "/pokerchain.poker.v1.Query/Game";

/// Type URL of a plain account.
const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// Vesting account kinds wrapping a `BaseVestingAccount`.
const VESTING_ACCOUNT_TYPE_URLS: [&str; 4] = [
    "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
    "/cosmos.vesting.v1beta1.DelayedVestingAccount",
    "/cosmos.vesting.v1beta1.PeriodicVestingAccount",
    "/cosmos.vesting.v1beta1.PermanentLockedAccount",
];

/// Account number and sequence as currently recorded by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    /// Ledger-assigned account number.
    pub account_number: u64,
    /// Next sequence the ledger expects.
    pub sequence: u64,
}

/// Amount held in one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Token denomination.
    pub denom: String,
    /// Decimal integer amount, as reported.
    pub amount: String,
}

/// What the node answered to a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// ABCI result code, zero on success.
    pub code: u32,
    /// Module namespace of `code`.
    pub codespace: String,
    /// Uppercase hex transaction hash.
    pub tx_hash: String,
    /// Raw diagnostic log.
    pub raw_log: String,
    /// Gas requested.
    pub gas_wanted: i64,
    /// Gas consumed.
    pub gas_used: i64,
    /// Block height, zero for sync broadcasts.
    pub height: i64,
}

/// The remote calls the pipeline depends on.
///
/// Each call issues exactly one request; implementations never retry.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Account number and sequence of `address`.
    async fn account(&self, address: &AccountId) -> Result<AccountState>;

    /// Submits encoded transaction bytes in sync mode.
    async fn broadcast(&self, tx_bytes: Vec<u8>) -> Result<SubmissionResult>;

    /// JSON document of the actions `player` may take at `table_id`.
    async fn legal_actions(&self, table_id: &str, player: &AccountId) -> Result<String>;

    /// Every balance held by `address`; empty for an unfunded account.
    async fn balances(&self, address: &AccountId) -> Result<Vec<Balance>>;

    /// JSON document with the metadata and public state of `table_id`.
    async fn game(&self, table_id: &str) -> Result<String>;
}

/// [`LedgerClient`] speaking gRPC to a pokerchain node.
#[derive(Debug, Clone)]
pub struct GrpcLedgerClient {
    /// Established channel.
    channel: Channel,
    /// Endpoint for diagnostics.
    endpoint: String,
}

impl GrpcLedgerClient {
    /// Connects to the node named in `config`. TLS is used for `https` endpoints.
    ///
    /// Fails immediately with [`Error::TransportError`] when the node cannot be reached.
    pub async fn connect(config: &NetworkConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        let uri: Uri = endpoint.parse().context(InvalidEndpointSnafu {
            endpoint: endpoint.clone(),
        })?;

        let mut builder = Endpoint::from(uri)
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout);
        if config.uses_tls() {
            builder = builder
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .context(TransportSnafu {
                    endpoint: endpoint.clone(),
                })?;
        }

        info!("🔌 Connecting to {endpoint}");
        let channel = builder.connect().await.context(TransportSnafu {
            endpoint: endpoint.clone(),
        })?;
        info!("✅ Connected to {endpoint}");

        Ok(Self { channel, endpoint })
    }

    /// The endpoint this client is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues one unary call.
    async fn unary<Req, Resp>(&self, method: &'static str, request: Req) -> Result<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("service was not ready: {e}")))
            .context(RpcFailedSnafu { method })?;

        debug!("calling {method}");
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(Request::new(request), PathAndQuery::from_static(method), codec)
            .await
            .context(RpcFailedSnafu { method })?;

        Ok(response.into_inner())
    }
}

#[async_trait]
impl LedgerClient for GrpcLedgerClient {
    async fn account(&self, address: &AccountId) -> Result<AccountState> {
        let request = QueryAccountRequest {
            address: address.to_string(),
        };
        let response: QueryAccountResponse = match self.unary(ACCOUNT_METHOD, request).await {
            Err(Error::RpcFailed { source, .. }) if source.code() == Code::NotFound => {
                return AccountNotFoundSnafu {
                    address: address.to_string(),
                }
                .fail();
            }
            other => other?,
        };

        let any = response.account.ok_or_else(|| Error::AccountNotFound {
            address: address.to_string(),
        })?;
        decode_account(&any)
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>) -> Result<SubmissionResult> {
        let request = BroadcastTxRequest {
            tx_bytes,
            mode: BROADCAST_MODE_SYNC,
        };
        let response: BroadcastTxResponse = self.unary(BROADCAST_TX_METHOD, request).await?;
        let tx = response
            .tx_response
            .ok_or_else(|| Error::MalformedResponse {
                method: BROADCAST_TX_METHOD,
                reason: "missing tx_response".to_string(),
            })?;

        Ok(SubmissionResult {
            code: tx.code,
            codespace: tx.codespace,
            tx_hash: tx.txhash,
            raw_log: tx.raw_log,
            gas_wanted: tx.gas_wanted,
            gas_used: tx.gas_used,
            height: tx.height,
        })
    }

    async fn legal_actions(&self, table_id: &str, player: &AccountId) -> Result<String> {
        let request = QueryLegalActionsRequest {
            game_id: table_id.to_string(),
            player_address: player.to_string(),
        };
        let response: QueryLegalActionsResponse =
            self.unary(LEGAL_ACTIONS_METHOD, request).await?;
        Ok(response.actions)
    }

    async fn balances(&self, address: &AccountId) -> Result<Vec<Balance>> {
        let request = QueryAllBalancesRequest {
            address: address.to_string(),
        };
        let response: QueryAllBalancesResponse = self.unary(ALL_BALANCES_METHOD, request).await?;
        Ok(response
            .balances
            .into_iter()
            .map(|coin| Balance {
                denom: coin.denom,
                amount: coin.amount,
            })
            .collect())
    }

    async fn game(&self, table_id: &str) -> Result<String> {
        let request = QueryGameRequest {
            game_id: table_id.to_string(),
        };
        match self.unary::<_, QueryGameResponse>(GAME_METHOD, request).await {
            Ok(response) => Ok(response.game),
            Err(Error::RpcFailed { source, .. }) if source.code() == Code::NotFound => {
                TableNotFoundSnafu { table_id }.fail()
            }
            Err(err) => Err(err),
        }
    }
}

/// Reads account number and sequence from a plain or vesting account.
///
/// Other account kinds (module accounts, for instance) cannot sign and are
/// reported as [`Error::MalformedResponse`].
pub fn decode_account(any: &Any) -> Result<AccountState> {
    let malformed = |reason: String| Error::MalformedResponse {
        method: ACCOUNT_METHOD,
        reason,
    };

    let account = if any.type_url == BASE_ACCOUNT_TYPE_URL {
        BaseAccount::decode(any.value.as_slice()).map_err(|e| malformed(e.to_string()))?
    } else if VESTING_ACCOUNT_TYPE_URLS.contains(&any.type_url.as_str()) {
        VestingAccount::decode(any.value.as_slice())
            .map_err(|e| malformed(e.to_string()))?
            .base_vesting_account
            .and_then(|vesting| vesting.base_account)
            .ok_or_else(|| malformed(format!("{} without a base account", any.type_url)))?
    } else {
        return Err(malformed(format!(
            "unsupported account type '{}'",
            any.type_url
        )));
    };

    Ok(AccountState {
        account_number: account.account_number,
        sequence: account.sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::BaseVestingAccount;

    fn base_account() -> BaseAccount {
        BaseAccount {
            address: "b5219rl4cm2hmr8afy4kldpxz3fka4jguq0avffg09".to_string(),
            pub_key: None,
            account_number: 7,
            sequence: 42,
        }
    }

    #[test]
    fn we_can_decode_a_base_account() {
        let any = Any {
            type_url: BASE_ACCOUNT_TYPE_URL.to_string(),
            value: base_account().encode_to_vec(),
        };
        assert_eq!(
            decode_account(&any).unwrap(),
            AccountState {
                account_number: 7,
                sequence: 42,
            }
        );
    }

    #[test]
    fn we_can_decode_a_vesting_account() {
        let vesting = VestingAccount {
            base_vesting_account: Some(BaseVestingAccount {
                base_account: Some(base_account()),
            }),
        };
        let any = Any {
            type_url: "/cosmos.vesting.v1beta1.ContinuousVestingAccount".to_string(),
            value: vesting.encode_to_vec(),
        };
        let state = decode_account(&any).unwrap();
        assert_eq!(state.account_number, 7);
        assert_eq!(state.sequence, 42);
    }

    #[test]
    fn we_cannot_decode_a_module_account() {
        let any = Any {
            type_url: "/cosmos.auth.v1beta1.ModuleAccount".to_string(),
            value: Vec::new(),
        };
        assert!(matches!(
            decode_account(&any),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn we_cannot_decode_a_vesting_account_without_its_base() {
        let any = Any {
            type_url: "/cosmos.vesting.v1beta1.DelayedVestingAccount".to_string(),
            value: VestingAccount::default().encode_to_vec(),
        };
        assert!(matches!(
            decode_account(&any),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn we_cannot_connect_to_a_closed_port() {
        let config = NetworkConfig {
            grpc_url: "http://127.0.0.1:1".parse().unwrap(),
            ..NetworkConfig::localnet()
        };

        let result = GrpcLedgerClient::connect(&config).await;
        match result {
            Err(error @ Error::TransportError { .. }) => {
                assert_eq!(error.stage(), Stage::Connect)
            }
            other => panic!("expected TransportError, got {other:?}"),
        }
    }
}
