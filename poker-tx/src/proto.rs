//! Protobuf wire types for the subset of the Cosmos SDK and pokerchain APIs in use.
//!
//! Only the fields this crate reads or writes are declared; prost skips the rest
//! when decoding.
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

/// Type URL of a secp256k1 public key.
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
/// Type URL of the create-game message.
pub const MSG_CREATE_GAME_TYPE_URL: &str = "/pokerchain.poker.v1.MsgCreateGame";
/// Type URL of the join-game message.
pub const MSG_JOIN_GAME_TYPE_URL: &str = "/pokerchain.poker.v1.MsgJoinGame";
/// Type URL of the leave-game message.
pub const MSG_LEAVE_GAME_TYPE_URL: &str = "/pokerchain.poker.v1.MsgLeaveGame";
/// Type URL of the perform-action message.
pub const MSG_PERFORM_ACTION_TYPE_URL: &str = "/pokerchain.poker.v1.MsgPerformAction";

/// `SIGN_MODE_DIRECT`.
pub const SIGN_MODE_DIRECT: i32 = 1;
/// `BROADCAST_MODE_SYNC`.
pub const BROADCAST_MODE_SYNC: i32 = 2;

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    /// Registered message type.
    #[prost(string, tag = "1")]
    pub type_url: String,
    /// Encoded message.
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `cosmos.base.v1beta1.Coin`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    /// Decimal integer string.
    #[prost(string, tag = "2")]
    pub amount: String,
}

/// `cosmos.crypto.secp256k1.PubKey`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PubKey {
    /// SEC1 compressed point.
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

/// `cosmos.tx.v1beta1.TxBody`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

/// `cosmos.tx.v1beta1.ModeInfo.Single`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfoSingle {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

/// `cosmos.tx.v1beta1.ModeInfo`, restricted to the `single` arm of its oneof.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfo {
    #[prost(message, optional, tag = "1")]
    pub single: Option<ModeInfoSingle>,
}

/// `cosmos.tx.v1beta1.SignerInfo`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// `cosmos.tx.v1beta1.Fee`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// `cosmos.tx.v1beta1.AuthInfo`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

/// `cosmos.tx.v1beta1.SignDoc`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

/// `cosmos.tx.v1beta1.TxRaw`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// `cosmos.tx.v1beta1.BroadcastTxRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BroadcastTxRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub tx_bytes: Vec<u8>,
    #[prost(int32, tag = "2")]
    pub mode: i32,
}

/// `cosmos.tx.v1beta1.BroadcastTxResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BroadcastTxResponse {
    #[prost(message, optional, tag = "1")]
    pub tx_response: Option<TxResponse>,
}

/// `cosmos.base.abci.v1beta1.TxResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxResponse {
    #[prost(int64, tag = "1")]
    pub height: i64,
    #[prost(string, tag = "2")]
    pub txhash: String,
    #[prost(string, tag = "3")]
    pub codespace: String,
    #[prost(uint32, tag = "4")]
    pub code: u32,
    #[prost(string, tag = "5")]
    pub data: String,
    #[prost(string, tag = "6")]
    pub raw_log: String,
    #[prost(string, tag = "8")]
    pub info: String,
    #[prost(int64, tag = "9")]
    pub gas_wanted: i64,
    #[prost(int64, tag = "10")]
    pub gas_used: i64,
    #[prost(string, tag = "12")]
    pub timestamp: String,
}

/// `cosmos.auth.v1beta1.QueryAccountRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAccountRequest {
    #[prost(string, tag = "1")]
    pub address: String,
}

/// `cosmos.auth.v1beta1.QueryAccountResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAccountResponse {
    #[prost(message, optional, tag = "1")]
    pub account: Option<Any>,
}

/// `cosmos.auth.v1beta1.BaseAccount`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BaseAccount {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(message, optional, tag = "2")]
    pub pub_key: Option<Any>,
    #[prost(uint64, tag = "3")]
    pub account_number: u64,
    #[prost(uint64, tag = "4")]
    pub sequence: u64,
}

/// `pokerchain.poker.v1.MsgCreateGame`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgCreateGame {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(uint64, tag = "2")]
    pub min_buy_in: u64,
    #[prost(uint64, tag = "3")]
    pub max_buy_in: u64,
    #[prost(int64, tag = "4")]
    pub min_players: i64,
    #[prost(int64, tag = "5")]
    pub max_players: i64,
    #[prost(uint64, tag = "6")]
    pub small_blind: u64,
    #[prost(uint64, tag = "7")]
    pub big_blind: u64,
    /// Seconds a player may take to act.
    #[prost(int64, tag = "8")]
    pub timeout: i64,
    #[prost(string, tag = "9")]
    pub game_type: String,
}

/// `pokerchain.poker.v1.MsgJoinGame`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgJoinGame {
    #[prost(string, tag = "1")]
    pub player: String,
    #[prost(string, tag = "2")]
    pub game_id: String,
    #[prost(uint64, tag = "3")]
    pub seat: u64,
    #[prost(uint64, tag = "4")]
    pub buy_in_amount: u64,
}

/// `pokerchain.poker.v1.MsgLeaveGame`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgLeaveGame {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(string, tag = "2")]
    pub game_id: String,
}

/// `pokerchain.poker.v1.MsgPerformAction`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgPerformAction {
    #[prost(string, tag = "1")]
    pub player: String,
    #[prost(string, tag = "2")]
    pub game_id: String,
    #[prost(string, tag = "3")]
    pub action: String,
    #[prost(uint64, tag = "4")]
    pub amount: u64,
}

/// `pokerchain.poker.v1.QueryLegalActionsRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryLegalActionsRequest {
    #[prost(string, tag = "1")]
    pub game_id: String,
    #[prost(string, tag = "2")]
    pub player_address: String,
}

/// `pokerchain.poker.v1.QueryLegalActionsResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryLegalActionsResponse {
    /// JSON document listing the permitted actions.
    #[prost(string, tag = "1")]
    pub actions: String,
}

/// `cosmos.bank.v1beta1.QueryAllBalancesRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAllBalancesRequest {
    #[prost(string, tag = "1")]
    pub address: String,
}

/// `cosmos.bank.v1beta1.QueryAllBalancesResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAllBalancesResponse {
    #[prost(message, repeated, tag = "1")]
    pub balances: Vec<Coin>,
}

/// `pokerchain.poker.v1.QueryGameRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryGameRequest {
    #[prost(string, tag = "1")]
    pub game_id: String,
}

/// `pokerchain.poker.v1.QueryGameResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryGameResponse {
    /// JSON document with the table metadata and its public state.
    #[prost(string, tag = "1")]
    pub game: String,
}

/// `cosmos.vesting.v1beta1.BaseVestingAccount`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BaseVestingAccount {
    #[prost(message, optional, tag = "1")]
    pub base_account: Option<BaseAccount>,
}

/// Continuous, delayed, periodic and permanent-locked vesting accounts all
/// carry their `BaseVestingAccount` in field 1.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VestingAccount {
    #[prost(message, optional, tag = "1")]
    pub base_vesting_account: Option<BaseVestingAccount>,
}
