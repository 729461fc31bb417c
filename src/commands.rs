//! Commands invoked by the frontend.
//!
//! Each command locks the app state on a blocking thread, mutates it, bumps
//! the revision and broadcasts the new snapshot. Chain calls go through
//! [`SeerNode`](seer_sdk::SeerNode) outside the lock. Errors cross the
//! boundary as plain strings.

use tokio::sync::broadcast;

use seer_sdk::{
    Address, Chain, ChainBackend, ContractAddresses, DraftUpdate, FieldErrors, MarketInfo,
    MarketType, OutcomeId, Submission, TransactionBackend, market_view,
};

use crate::state::{AppState, AppStateManager, StateError, TxKind};
use crate::{App, emit_state};

fn parse_address(what: &str, s: &str) -> Result<Address, String> {
    seer_sdk::parse_address(s).map_err(|e| format!("invalid {what}: {e}"))
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .messages()
        .into_iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bump the revision and broadcast the snapshot.
fn commit(mgr: &mut AppStateManager, events: &broadcast::Sender<AppState>) -> AppState {
    mgr.bump_revision();
    let state = mgr.snapshot();
    emit_state(events, &state);
    state
}

fn ensure_wizard_idle(mgr: &AppStateManager) -> Result<(), String> {
    match mgr.wizard() {
        Some(w) if w.is_pending() => Err("A market submission is in progress".to_string()),
        _ => Ok(()),
    }
}

impl<B> App<B>
where
    B: ChainBackend + TransactionBackend + Send + Sync + 'static,
{
    // ── Internal: locked state helpers ──────────────────────────────────

    async fn with_manager<F, R>(&self, what: &'static str, f: F) -> Result<R, String>
    where
        F: FnOnce(&mut AppStateManager) -> Result<R, String> + Send + 'static,
        R: Send + 'static,
    {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || {
            let mut mgr = manager.lock().map_err(|_| "state lock failed".to_string())?;
            f(&mut mgr)
        })
        .await
        .map_err(|e| format!("{what} task failed: {e}"))?
    }

    /// Run `f` and, if it succeeds, commit and return the new snapshot.
    async fn update<F>(&self, what: &'static str, f: F) -> Result<AppState, String>
    where
        F: FnOnce(&mut AppStateManager) -> Result<(), String> + Send + 'static,
    {
        let events = self.events.clone();
        self.with_manager(what, move |mgr| {
            f(mgr)?;
            Ok(commit(mgr, &events))
        })
        .await
    }

    // ── App state & chain ───────────────────────────────────────────────

    pub async fn get_app_state(&self) -> Result<AppState, String> {
        self.with_manager("state", |mgr| Ok(mgr.snapshot())).await
    }

    pub async fn is_first_launch(&self) -> Result<bool, String> {
        self.with_manager("first_launch", |mgr| Ok(mgr.is_first_launch()))
            .await
    }

    /// Switch chain and persist it. `contracts` overrides the chain's default
    /// address book. Refused while a split is in flight.
    pub async fn set_chain(
        &self,
        chain: Chain,
        contracts: Option<ContractAddresses>,
    ) -> Result<AppState, String> {
        let node = self.node.clone();
        self.update("set_chain", move |mgr| {
            let config = mgr.set_chain(chain, contracts).map_err(|e| match e {
                StateError::Io(_) | StateError::Json(_) => {
                    format!("failed to save chain config: {e}")
                }
                other => other.to_string(),
            })?;
            node.set_contracts(config.contracts)
                .map_err(|e| e.to_string())?;
            log::info!("chain set to {chain}");
            Ok(())
        })
        .await
    }

    // ── Market wizard ───────────────────────────────────────────────────

    pub async fn start_market_wizard(&self, market_type: MarketType) -> Result<AppState, String> {
        self.update("start_market_wizard", move |mgr| {
            ensure_wizard_idle(mgr)?;
            mgr.start_wizard(market_type);
            Ok(())
        })
        .await
    }

    pub async fn update_draft(&self, update: DraftUpdate) -> Result<AppState, String> {
        self.update("update_draft", move |mgr| {
            mgr.wizard_mut()?.apply(update).map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn add_outcome(&self) -> Result<AppState, String> {
        self.update("add_outcome", |mgr| {
            mgr.wizard_mut()?
                .add_outcome()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn remove_outcome(&self, id: OutcomeId) -> Result<AppState, String> {
        self.update("remove_outcome", move |mgr| {
            mgr.wizard_mut()?.remove_outcome(id).map_err(|e| e.to_string())
        })
        .await
    }

    /// Blocked moves are not errors: the snapshot carries the step's errors.
    pub async fn go_to_next_step(&self) -> Result<AppState, String> {
        self.update("go_to_next_step", |mgr| {
            mgr.wizard_mut()?
                .go_to_next_step()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn go_to_prev_step(&self) -> Result<AppState, String> {
        self.update("go_to_prev_step", |mgr| {
            mgr.wizard_mut()?
                .go_to_prev_step()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
    }

    /// Hand the completed draft to the transaction layer. On failure the draft
    /// stays on the confirm step, untouched.
    pub async fn submit_market(&self) -> Result<AppState, String> {
        let events = self.events.clone();
        let request = self
            .with_manager("submit_market", move |mgr| {
                match mgr.wizard_mut()?.begin_submission().map_err(|e| e.to_string())? {
                    Submission::Ready(request) => {
                        commit(mgr, &events);
                        Ok(request)
                    }
                    Submission::Blocked(errors) => {
                        Err(format!("Market draft is incomplete: {}", describe(&errors)))
                    }
                }
            })
            .await?;

        let result = self.node.create_market(request).await;

        let events = self.events.clone();
        self.with_manager("submit_market", move |mgr| {
            let wizard = mgr.wizard_mut()?;
            let outcome = match result {
                Ok(tx) => {
                    wizard.complete_submission();
                    mgr.record_tx(TxKind::CreateMarket, tx);
                    Ok(())
                }
                Err(e) => {
                    wizard.fail_submission();
                    Err(format!("market creation failed: {e}"))
                }
            };
            let state = commit(mgr, &events);
            outcome.map(|_| state)
        })
        .await
    }

    pub async fn abandon_wizard(&self) -> Result<AppState, String> {
        self.update("abandon_wizard", |mgr| {
            ensure_wizard_idle(mgr)?;
            mgr.wizard_mut()?.abandon().map_err(|e| e.to_string())
        })
        .await
    }

    // ── Markets ─────────────────────────────────────────────────────────

    /// The MarketView descriptor in JSON-ABI form.
    pub fn market_view_abi_json(&self) -> Result<serde_json::Value, String> {
        market_view::abi_json().map_err(|e| e.to_string())
    }

    pub async fn get_market(&self, market_id: &str) -> Result<MarketInfo, String> {
        let market_id = parse_address("market id", market_id)?;
        self.node
            .get_market(market_id)
            .await
            .map_err(|e| format!("failed to load market {market_id:?}: {e}"))
    }

    pub async fn get_markets(&self, count: u64) -> Result<Vec<MarketInfo>, String> {
        self.node
            .get_markets(count)
            .await
            .map_err(|e| format!("failed to load markets: {e}"))
    }

    // ── Split position ──────────────────────────────────────────────────

    /// Open the split form for one market. A balance that cannot be fetched
    /// is left unloaded; submitting then fails until it is refreshed. Refused
    /// while the current split is in flight.
    pub async fn load_split_form(&self, market_id: &str, account: &str) -> Result<AppState, String> {
        let market_id = parse_address("market id", market_id)?;
        let account = parse_address("account", account)?;

        self.with_manager("load_split_form", |mgr| match mgr.split() {
            Some(s) if s.form.is_pending() => Err("A split is in progress".to_string()),
            _ => Ok(()),
        })
        .await?;

        let market = self
            .node
            .get_market(market_id)
            .await
            .map_err(|e| format!("failed to load market {market_id:?}: {e}"))?;
        let balance = self
            .node
            .collateral_balance(account)
            .await
            .inspect_err(|e| log::warn!("collateral balance for {account:?} unavailable: {e}"))
            .ok();

        // The session may have started a split while the chain was read.
        self.update("load_split_form", move |mgr| {
            mgr.open_split(market, account, balance)
                .map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn set_split_amount(&self, amount: String) -> Result<AppState, String> {
        self.update("set_split_amount", move |mgr| {
            mgr.split_mut()?
                .form
                .set_amount(amount)
                .map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn refresh_split_balance(&self) -> Result<AppState, String> {
        let account = self
            .with_manager("refresh_split_balance", |mgr| {
                Ok(mgr.split_mut()?.context.account)
            })
            .await?;
        let balance = self
            .node
            .collateral_balance(account)
            .await
            .map_err(|e| format!("failed to fetch balance: {e}"))?;
        self.update("refresh_split_balance", move |mgr| {
            mgr.split_mut()?.balance = Some(balance);
            Ok(())
        })
        .await
    }

    /// Split the entered amount of collateral into outcome tokens. The amount
    /// is cleared only once the transaction was sent.
    pub async fn submit_split(&self) -> Result<AppState, String> {
        let events = self.events.clone();
        let request = self
            .with_manager("submit_split", move |mgr| {
                let session = mgr.split_mut()?;
                let balance = session
                    .balance
                    .ok_or_else(|| "Collateral balance not loaded".to_string())?;
                let request = session
                    .form
                    .begin_submission(&session.context, balance)
                    .map_err(|e| e.to_string())?
                    .map_err(|errors| format!("Invalid split: {}", describe(&errors)))?;
                commit(mgr, &events);
                Ok(request)
            })
            .await?;

        let account = request.account;
        let result = self.node.split_position(request).await;
        let balance = match &result {
            Ok(_) => self
                .node
                .collateral_balance(account)
                .await
                .inspect_err(|e| log::warn!("balance refresh after split failed: {e}"))
                .ok(),
            Err(_) => None,
        };

        let events = self.events.clone();
        self.with_manager("submit_split", move |mgr| {
            // A sent transaction is recorded even without a session to update.
            match mgr.split_mut() {
                Ok(session) => {
                    session.form.finish_submission(result.is_ok());
                    if balance.is_some() {
                        session.balance = balance;
                    }
                }
                Err(e) => log::warn!("split finished without a session: {e}"),
            }
            let outcome = match result {
                Ok(tx) => {
                    mgr.record_tx(TxKind::SplitPosition, tx);
                    Ok(())
                }
                Err(e) => Err(format!("split failed: {e}")),
            };
            let state = commit(mgr, &events);
            outcome.map(|_| state)
        })
        .await
    }
}
