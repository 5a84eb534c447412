//! Validated table actions and their protobuf rendering.

use std::fmt;
use std::str::FromStr;

use prost::Message;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::keys::AccountId;
use crate::proto::{self, Any};

/// Most seats any table supports.
pub const MAX_SEATS: u64 = 9;
/// Fewest players a table may be configured for.
pub const MIN_PLAYERS: i64 = 2;

/// Parameters of a new table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTableParams {
    /// Smallest buy-in accepted at the table.
    pub min_buy_in: u64,
    /// Largest buy-in accepted at the table.
    pub max_buy_in: u64,
    /// Players needed before a hand starts.
    pub min_players: i64,
    /// Seats at the table.
    pub max_players: i64,
    /// Small blind.
    pub small_blind: u64,
    /// Big blind.
    pub big_blind: u64,
    /// Seconds a player may take to act.
    pub timeout: i64,
    /// Game variant, e.g. `texas-holdem`.
    pub game_type: String,
}

/// A move made at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "amount", rename_all = "lowercase")]
pub enum PlayerAction {
    /// Give up the hand.
    Fold,
    /// Pass without betting.
    Check,
    /// Match the current bet.
    Call,
    /// Open the betting.
    Bet(u64),
    /// Increase the current bet.
    Raise(u64),
}

impl PlayerAction {
    /// Builds an action from its wire name and an amount. Fold, check and call
    /// ignore the amount; bet and raise require a positive one.
    pub fn new(name: &str, amount: Option<u64>) -> Result<Self> {
        let action = match name.trim().to_ascii_lowercase().as_str() {
            "fold" => PlayerAction::Fold,
            "check" => PlayerAction::Check,
            "call" => PlayerAction::Call,
            "bet" => PlayerAction::Bet(amount.unwrap_or(0)),
            "raise" => PlayerAction::Raise(amount.unwrap_or(0)),
            other => {
                return Err(Error::InvalidParameters {
                    field: "action",
                    reason: format!(
                        "unknown action '{other}', expected one of fold, check, call, bet, raise"
                    ),
                })
            }
        };
        action.validate()?;
        Ok(action)
    }

    /// Name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Fold => "fold",
            PlayerAction::Check => "check",
            PlayerAction::Call => "call",
            PlayerAction::Bet(_) => "bet",
            PlayerAction::Raise(_) => "raise",
        }
    }

    /// Chips committed by the action; zero for fold, check and call.
    pub fn amount(&self) -> u64 {
        match self {
            PlayerAction::Bet(amount) | PlayerAction::Raise(amount) => *amount,
            _ => 0,
        }
    }

    /// Bet and raise must commit chips.
    fn validate(&self) -> Result<()> {
        match self {
            PlayerAction::Bet(0) | PlayerAction::Raise(0) => Err(Error::InvalidParameters {
                field: "amount",
                reason: format!("{} requires a positive amount", self.name()),
            }),
            _ => Ok(()),
        }
    }
}

impl FromStr for PlayerAction {
    type Err = Error;

    /// Parses `fold`, `check`, `call`, `bet:<amount>` or `raise:<amount>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, amount)) => {
                let amount = amount.parse().map_err(|_| Error::InvalidParameters {
                    field: "amount",
                    reason: format!("'{amount}' is not a valid amount"),
                })?;
                PlayerAction::new(name, Some(amount))
            }
            None => PlayerAction::new(s, None),
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::Bet(amount) | PlayerAction::Raise(amount) => {
                write!(f, "{} {amount}", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// An action payload to be bound to a signer.
///
/// The constructors enforce the structural rules of each variant. Values built
/// directly are checked by [`TableAction::validate`], which the pipeline runs
/// before anything is signed. Nothing here touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableAction {
    /// Open a new table.
    CreateTable(CreateTableParams),
    /// Take a seat.
    JoinTable {
        /// Table identifier.
        table_id: String,
        /// One-based seat number.
        seat: u64,
        /// Chips brought to the table.
        buy_in: u64,
    },
    /// Leave a table.
    LeaveTable {
        /// Table identifier.
        table_id: String,
    },
    /// Act in the current hand.
    PerformAction {
        /// Table identifier.
        table_id: String,
        /// The move.
        action: PlayerAction,
    },
}

impl TableAction {
    /// Validates table parameters.
    pub fn create_table(params: CreateTableParams) -> Result<Self> {
        validate_create_params(&params)?;
        Ok(TableAction::CreateTable(params))
    }

    /// Validates a seat request against a table with `capacity` seats.
    ///
    /// `capacity` defaults to [`MAX_SEATS`] when the table size is unknown.
    pub fn join_table(
        table_id: &str,
        seat: u64,
        buy_in: u64,
        capacity: Option<u64>,
    ) -> Result<Self> {
        let table_id = validate_table_id(table_id)?;

        let capacity = capacity.unwrap_or(MAX_SEATS);
        if capacity == 0 || capacity > MAX_SEATS {
            return Err(Error::InvalidParameters {
                field: "capacity",
                reason: format!("table capacity must be between 1 and {MAX_SEATS}"),
            });
        }
        validate_seat(seat, buy_in, capacity)?;

        Ok(TableAction::JoinTable {
            table_id,
            seat,
            buy_in,
        })
    }

    /// Validates a leave request.
    pub fn leave_table(table_id: &str) -> Result<Self> {
        Ok(TableAction::LeaveTable {
            table_id: validate_table_id(table_id)?,
        })
    }

    /// Validates a move in the current hand.
    pub fn perform_action(table_id: &str, action: PlayerAction) -> Result<Self> {
        action.validate()?;
        Ok(TableAction::PerformAction {
            table_id: validate_table_id(table_id)?,
            action,
        })
    }

    /// Re-checks the rules the constructors enforce.
    ///
    /// Seats are checked against [`MAX_SEATS`] since the capacity given to
    /// [`TableAction::join_table`] is not kept.
    pub fn validate(&self) -> Result<()> {
        match self {
            TableAction::CreateTable(params) => validate_create_params(params),
            TableAction::JoinTable {
                table_id,
                seat,
                buy_in,
            } => {
                validate_table_id(table_id)?;
                validate_seat(*seat, *buy_in, MAX_SEATS)
            }
            TableAction::LeaveTable { table_id } => validate_table_id(table_id).map(|_| ()),
            TableAction::PerformAction { table_id, action } => {
                action.validate()?;
                validate_table_id(table_id).map(|_| ())
            }
        }
    }

    /// The registered type URL this action is rendered under.
    pub fn type_url(&self) -> &'static str {
        match self {
            TableAction::CreateTable(_) => proto::MSG_CREATE_GAME_TYPE_URL,
            TableAction::JoinTable { .. } => proto::MSG_JOIN_GAME_TYPE_URL,
            TableAction::LeaveTable { .. } => proto::MSG_LEAVE_GAME_TYPE_URL,
            TableAction::PerformAction { .. } => proto::MSG_PERFORM_ACTION_TYPE_URL,
        }
    }

    /// Short name for logs.
    pub fn describe(&self) -> String {
        match self {
            TableAction::CreateTable(p) => format!(
                "create table ({} {}/{} blinds, {}-{} players)",
                p.game_type, p.small_blind, p.big_blind, p.min_players, p.max_players
            ),
            TableAction::JoinTable {
                table_id, seat, ..
            } => format!("join table {table_id} at seat {seat}"),
            TableAction::LeaveTable { table_id } => format!("leave table {table_id}"),
            TableAction::PerformAction { table_id, action } => {
                format!("{action} at table {table_id}")
            }
        }
    }

    /// Renders the payload with `signer` as its creator or player.
    pub fn to_any(&self, signer: &AccountId) -> Any {
        let signer = signer.to_string();
        let value = match self {
            TableAction::CreateTable(p) => proto::MsgCreateGame {
                creator: signer,
                min_buy_in: p.min_buy_in,
                max_buy_in: p.max_buy_in,
                min_players: p.min_players,
                max_players: p.max_players,
                small_blind: p.small_blind,
                big_blind: p.big_blind,
                timeout: p.timeout,
                game_type: p.game_type.clone(),
            }
            .encode_to_vec(),
            TableAction::JoinTable {
                table_id,
                seat,
                buy_in,
            } => proto::MsgJoinGame {
                player: signer,
                game_id: table_id.clone(),
                seat: *seat,
                buy_in_amount: *buy_in,
            }
            .encode_to_vec(),
            TableAction::LeaveTable { table_id } => proto::MsgLeaveGame {
                creator: signer,
                game_id: table_id.clone(),
            }
            .encode_to_vec(),
            TableAction::PerformAction { table_id, action } => proto::MsgPerformAction {
                player: signer,
                game_id: table_id.clone(),
                action: action.name().to_string(),
                amount: action.amount(),
            }
            .encode_to_vec(),
        };

        Any {
            type_url: self.type_url().to_string(),
            value,
        }
    }
}

/// Bounds shared by every table configuration.
fn validate_create_params(params: &CreateTableParams) -> Result<()> {
    let invalid = |field, reason: &str| {
        Err(Error::InvalidParameters {
            field,
            reason: reason.to_string(),
        })
    };

    if params.min_players < MIN_PLAYERS {
        return invalid("min_players", "at least 2 players are required");
    }
    if params.max_players > MAX_SEATS as i64 {
        return invalid("max_players", "a table has at most 9 seats");
    }
    if params.min_players > params.max_players {
        return invalid("min_players", "must not exceed max_players");
    }
    if params.min_buy_in == 0 {
        return invalid("min_buy_in", "must be positive");
    }
    if params.min_buy_in > params.max_buy_in {
        return invalid("min_buy_in", "must not exceed max_buy_in");
    }
    if params.small_blind == 0 {
        return invalid("small_blind", "must be positive");
    }
    if params.small_blind > params.big_blind {
        return invalid("small_blind", "must not exceed big_blind");
    }
    if params.timeout <= 0 {
        return invalid("timeout", "must be positive");
    }
    if params.game_type.trim().is_empty() {
        return invalid("game_type", "must not be empty");
    }
    Ok(())
}

/// Seats are one-based; a buy-in brings chips.
fn validate_seat(seat: u64, buy_in: u64, capacity: u64) -> Result<()> {
    if seat == 0 || seat > capacity {
        return Err(Error::InvalidParameters {
            field: "seat",
            reason: format!("seat {seat} is outside 1..={capacity}"),
        });
    }
    if buy_in == 0 {
        return Err(Error::InvalidParameters {
            field: "buy_in",
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

/// Checks a table id and returns it owned.
///
/// Table ids are opaque strings; a `0x` prefix announces a hex id.
pub fn validate_table_id(table_id: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidParameters {
        field: "table_id",
        reason: reason.to_string(),
    };

    if table_id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if table_id.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if let Some(hex_part) = table_id.strip_prefix("0x") {
        if hex_part.is_empty() || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("0x-prefixed ids must be hexadecimal"));
        }
    }
    Ok(table_id.to_string())
}

/// The set of type URLs the assembler accepts.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Registered type URLs.
    type_urls: Vec<String>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            type_urls: Vec::new(),
        }
    }

    /// The pokerchain message types.
    pub fn pokerchain() -> Self {
        let mut registry = Self::new();
        for type_url in [
            proto::MSG_CREATE_GAME_TYPE_URL,
            proto::MSG_JOIN_GAME_TYPE_URL,
            proto::MSG_LEAVE_GAME_TYPE_URL,
            proto::MSG_PERFORM_ACTION_TYPE_URL,
        ] {
            registry.register(type_url);
        }
        registry
    }

    /// Adds a type URL.
    pub fn register(&mut self, type_url: impl Into<String>) {
        let type_url = type_url.into();
        if !self.contains(&type_url) {
            self.type_urls.push(type_url);
        }
    }

    /// Whether `type_url` is registered.
    pub fn contains(&self, type_url: &str) -> bool {
        self.type_urls.iter().any(|t| t == type_url)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::pokerchain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_table() -> CreateTableParams {
        CreateTableParams {
            min_buy_in: 100_000_000,
            max_buy_in: 1_000_000_000,
            min_players: 2,
            max_players: 9,
            small_blind: 500_000,
            big_blind: 1_000_000,
            timeout: 60,
            game_type: "nlhe".to_string(),
        }
    }

    fn signer() -> AccountId {
        AccountId::from_public_key(&[2u8; 33], "b52").unwrap()
    }

    fn field_of(result: Result<TableAction>) -> &'static str {
        match result {
            Err(Error::InvalidParameters { field, .. }) => field,
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn hand_built_actions_are_checked_by_validate() {
        let built = [
            TableAction::create_table(reference_table()).unwrap(),
            TableAction::join_table("0xabc", 9, 1_000, None).unwrap(),
            TableAction::leave_table("0xabc").unwrap(),
            TableAction::perform_action("0xabc", PlayerAction::Raise(5)).unwrap(),
        ];
        assert!(built.iter().all(|action| action.validate().is_ok()));

        let field = |action: TableAction| field_of(action.validate().map(|_| action));
        assert_eq!(
            field(TableAction::JoinTable {
                table_id: String::new(),
                seat: 0,
                buy_in: 0,
            }),
            "table_id"
        );
        assert_eq!(
            field(TableAction::JoinTable {
                table_id: "0xabc".to_string(),
                seat: 10,
                buy_in: 1,
            }),
            "seat"
        );
        assert_eq!(
            field(TableAction::CreateTable(CreateTableParams {
                small_blind: 0,
                ..reference_table()
            })),
            "small_blind"
        );
        assert_eq!(
            field(TableAction::PerformAction {
                table_id: "0xabc".to_string(),
                action: PlayerAction::Bet(0),
            }),
            "amount"
        );
        assert_eq!(
            field(TableAction::LeaveTable {
                table_id: "0xzz".to_string(),
            }),
            "table_id"
        );
    }

    #[test]
    fn we_can_build_the_reference_table() {
        let action = TableAction::create_table(reference_table()).unwrap();
        let any = action.to_any(&signer());
        assert_eq!(any.type_url, "/pokerchain.poker.v1.MsgCreateGame");

        let decoded = proto::MsgCreateGame::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded.creator, signer().to_string());
        assert_eq!(decoded.min_buy_in, 100_000_000);
        assert_eq!(decoded.max_players, 9);
        assert_eq!(decoded.game_type, "nlhe");
    }

    #[test]
    fn building_the_same_payload_twice_is_byte_identical() {
        let first = TableAction::create_table(reference_table()).unwrap();
        let second = TableAction::create_table(reference_table()).unwrap();
        assert_eq!(first.to_any(&signer()), second.to_any(&signer()));
    }

    #[test]
    fn we_cannot_create_tables_that_break_the_rules() {
        let cases: Vec<(CreateTableParams, &str)> = vec![
            (
                CreateTableParams {
                    min_players: 1,
                    ..reference_table()
                },
                "min_players",
            ),
            (
                CreateTableParams {
                    max_players: 10,
                    ..reference_table()
                },
                "max_players",
            ),
            (
                CreateTableParams {
                    min_players: 6,
                    max_players: 4,
                    ..reference_table()
                },
                "min_players",
            ),
            (
                CreateTableParams {
                    min_buy_in: 0,
                    ..reference_table()
                },
                "min_buy_in",
            ),
            (
                CreateTableParams {
                    min_buy_in: 2_000_000_000,
                    ..reference_table()
                },
                "min_buy_in",
            ),
            (
                CreateTableParams {
                    small_blind: 0,
                    ..reference_table()
                },
                "small_blind",
            ),
            (
                CreateTableParams {
                    small_blind: 2_000_000,
                    ..reference_table()
                },
                "small_blind",
            ),
            (
                CreateTableParams {
                    timeout: 0,
                    ..reference_table()
                },
                "timeout",
            ),
            (
                CreateTableParams {
                    game_type: "  ".to_string(),
                    ..reference_table()
                },
                "game_type",
            ),
        ];

        for (params, field) in cases {
            assert_eq!(field_of(TableAction::create_table(params)), field);
        }
    }

    #[test]
    fn we_cannot_join_outside_the_table_seats() {
        assert_eq!(field_of(TableAction::join_table("0xabc", 0, 1000, None)), "seat");
        assert_eq!(field_of(TableAction::join_table("0xabc", 10, 1000, None)), "seat");
        assert_eq!(
            field_of(TableAction::join_table("0xabc", 7, 1000, Some(6))),
            "seat"
        );
        assert_eq!(
            field_of(TableAction::join_table("0xabc", 1, 1000, Some(10))),
            "capacity"
        );
    }

    #[test]
    fn we_can_join_any_seat_from_one_to_capacity() {
        for seat in 1..=MAX_SEATS {
            assert!(TableAction::join_table("0xabc", seat, 1000, None).is_ok());
        }
    }

    #[test]
    fn we_cannot_join_with_a_bad_table_id_or_empty_buy_in() {
        assert_eq!(field_of(TableAction::join_table("", 1, 1000, None)), "table_id");
        assert_eq!(
            field_of(TableAction::join_table("game 1", 1, 1000, None)),
            "table_id"
        );
        assert_eq!(
            field_of(TableAction::join_table("0xnothex", 1, 1000, None)),
            "table_id"
        );
        assert_eq!(field_of(TableAction::join_table("0xabc", 1, 0, None)), "buy_in");
    }

    #[test]
    fn join_payload_carries_the_player_and_seat() {
        let action = TableAction::join_table("0xdeadbeef", 3, 500, None).unwrap();
        let any = action.to_any(&signer());
        assert_eq!(any.type_url, "/pokerchain.poker.v1.MsgJoinGame");

        let decoded = proto::MsgJoinGame::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded.player, signer().to_string());
        assert_eq!(decoded.game_id, "0xdeadbeef");
        assert_eq!(decoded.seat, 3);
        assert_eq!(decoded.buy_in_amount, 500);
    }

    #[test]
    fn we_can_parse_player_actions() {
        assert_eq!("fold".parse::<PlayerAction>().unwrap(), PlayerAction::Fold);
        assert_eq!("CALL".parse::<PlayerAction>().unwrap(), PlayerAction::Call);
        assert_eq!(
            "raise:300".parse::<PlayerAction>().unwrap(),
            PlayerAction::Raise(300)
        );
        assert_eq!(PlayerAction::new("check", Some(50)).unwrap().amount(), 0);
    }

    #[test]
    fn we_cannot_bet_or_raise_nothing() {
        assert!(matches!(
            PlayerAction::new("bet", None),
            Err(Error::InvalidParameters { field: "amount", .. })
        ));
        assert!(matches!(
            "raise:0".parse::<PlayerAction>(),
            Err(Error::InvalidParameters { field: "amount", .. })
        ));
        assert!(matches!(
            "allin".parse::<PlayerAction>(),
            Err(Error::InvalidParameters { field: "action", .. })
        ));
        assert_eq!(
            field_of(TableAction::perform_action("0xabc", PlayerAction::Bet(0))),
            "amount"
        );
    }

    #[test]
    fn action_payload_carries_name_and_amount() {
        let action = TableAction::perform_action("0xabc", PlayerAction::Bet(250)).unwrap();
        let decoded =
            proto::MsgPerformAction::decode(action.to_any(&signer()).value.as_slice()).unwrap();
        assert_eq!(decoded.action, "bet");
        assert_eq!(decoded.amount, 250);
    }

    #[test]
    fn registry_knows_every_table_action() {
        let registry = TypeRegistry::pokerchain();
        let actions = [
            TableAction::create_table(reference_table()).unwrap(),
            TableAction::join_table("0xabc", 1, 10, None).unwrap(),
            TableAction::leave_table("0xabc").unwrap(),
            TableAction::perform_action("0xabc", PlayerAction::Fold).unwrap(),
        ];
        for action in actions {
            assert!(registry.contains(action.type_url()));
        }
        assert!(!registry.contains("/cosmos.bank.v1beta1.MsgSend"));
    }
}
