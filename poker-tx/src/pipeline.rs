//! Transaction pipeline shared by every table action.

use std::future::Future;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::assembler::UnsignedTransaction;
use crate::config::NetworkConfig;
use crate::error::*;
use crate::keys::{derive, AccountId, Keypair, SeedPhrase};
use crate::messages::{validate_table_id, TableAction, TypeRegistry};
use crate::outcome::{interpret, Accepted};
use crate::signer::SigningContext;
use crate::transport::{Balance, LedgerClient};

/// Derives a signer once and pushes table actions through lookup, assembly,
/// signing, broadcast and interpretation.
///
/// Every step runs once per submission. The two remote calls are bounded by
/// the configured timeout and abort when the cancellation token fires; nothing
/// is retried and no account state is cached between submissions.
pub struct TxPipeline<L> {
    /// Ledger access.
    client: L,
    /// Target network.
    config: NetworkConfig,
    /// Signing keys derived from the seed phrase.
    keypair: Keypair,
    /// Address of `keypair`.
    account: AccountId,
    /// Message types the assembler accepts.
    registry: TypeRegistry,
    /// Aborts pending remote calls.
    cancel: CancellationToken,
}

impl<L: LedgerClient> TxPipeline<L> {
    /// Creates a pipeline signing with the key derived from `seed_phrase`.
    ///
    /// # Arguments
    ///
    /// * `client` - Ledger access used for the account lookup and broadcast.
    /// * `config` - Network the transactions are built for.
    /// * `seed_phrase` - Mnemonic the signing key is derived from.
    pub fn new(client: L, config: NetworkConfig, seed_phrase: &SeedPhrase) -> Result<Self> {
        let (keypair, account) = derive(
            seed_phrase,
            &config.derivation_path,
            &config.address_prefix,
        )?;
        info!("🔑 Signing as {account}");

        Ok(Self {
            client,
            config,
            keypair,
            account,
            registry: TypeRegistry::pokerchain(),
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the set of accepted message types.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Address of the signer.
    pub fn account_id(&self) -> &AccountId {
        &self.account
    }

    /// Target network.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Ledger access.
    pub fn client(&self) -> &L {
        &self.client
    }

    /// Token that cancels pending remote calls of this pipeline.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submits a single action.
    pub async fn submit(&self, action: &TableAction) -> Result<Accepted> {
        self.submit_all(std::slice::from_ref(action)).await
    }

    /// Submits `actions` as one transaction.
    ///
    /// # Returns
    ///
    /// The accepted transaction, or the first error of any stage. A ledger
    /// rejection surfaces as [`Error::RejectedByLedger`] with the remote log verbatim.
    pub async fn submit_all(&self, actions: &[TableAction]) -> Result<Accepted> {
        for action in actions {
            action.validate()?;
            info!("🃏 Preparing {}", action.describe());
        }

        let state = self
            .guarded(Stage::AccountLookup, self.client.account(&self.account))
            .await?;
        info!(
            "📒 Account {} has number {} and sequence {}",
            self.account, state.account_number, state.sequence
        );

        let messages = actions
            .iter()
            .map(|action| action.to_any(&self.account))
            .collect();
        let unsigned = UnsignedTransaction::assemble(
            messages,
            &self.config.fee,
            self.config.gas_limit,
            &self.config.memo,
            &self.registry,
        )?;

        let signed = unsigned
            .attach(SigningContext {
                chain_id: self.config.chain_id.clone(),
                account_number: state.account_number,
                sequence: state.sequence,
                public_key: *self.keypair.public_key(),
            })
            .sign(&self.keypair)?;
        let local_hash = signed.hash();

        info!("📡 Broadcasting transaction {local_hash}");
        let result = self
            .guarded(Stage::Broadcast, self.client.broadcast(signed.to_bytes()))
            .await?;

        if !result.tx_hash.is_empty() && !result.tx_hash.eq_ignore_ascii_case(&local_hash) {
            warn!(
                "⚠️ Node reported hash {} but the local hash is {local_hash}",
                result.tx_hash
            );
        }

        match interpret(result) {
            Ok(accepted) => {
                info!("✅ Transaction accepted: {}", accepted.tx_hash);
                Ok(accepted)
            }
            Err(err) => {
                error!("❌ {err}");
                Err(err)
            }
        }
    }

    /// Legal actions of the signer at `table_id`, as the JSON document the
    /// ledger returns.
    pub async fn legal_actions(&self, table_id: &str) -> Result<String> {
        let table_id = validate_table_id(table_id)?;
        self.guarded(
            Stage::Query,
            self.client.legal_actions(&table_id, &self.account),
        )
        .await
    }

    /// Balances held by the signing account.
    pub async fn balances(&self) -> Result<Vec<Balance>> {
        self.guarded(Stage::Query, self.client.balances(&self.account))
            .await
    }

    /// Metadata and public state of `table_id`, as the JSON document the
    /// ledger returns.
    pub async fn game(&self, table_id: &str) -> Result<String> {
        let table_id = validate_table_id(table_id)?;
        self.guarded(Stage::Query, self.client.game(&table_id)).await
    }

    /// Awaits one remote call under the timeout and the cancellation token.
    async fn guarded<T>(&self, stage: Stage, call: impl Future<Output = Result<T>>) -> Result<T> {
        let after = self.config.request_timeout;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!("🛑 Cancelled during {stage}");
                CancelledSnafu { stage }.fail()
            }
            outcome = tokio::time::timeout(after, call) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    if stage == Stage::Broadcast {
                        warn!("⚠️ Broadcast timed out; the transaction may still be included");
                    }
                    TimeoutSnafu { stage, after }.fail()
                }
            },
        }
    }
}
