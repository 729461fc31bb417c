use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use seer_sdk::wizard::WizardView;
use seer_sdk::{
    Address, Chain, ContractAddresses, FieldErrors, MarketInfo, MarketType, SplitContext,
    SplitForm, H256, U256, Wizard, format_units,
};

const CONFIG_FILE: &str = "chain_config.json";

/// How many sent transactions the snapshot keeps.
const MAX_TRANSACTIONS: usize = 20;

// ============================================================================
// Persisted chain config
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain: Chain,
    #[serde(flatten)]
    pub contracts: ContractAddresses,
}

impl ChainConfig {
    pub fn for_chain(chain: Chain) -> Self {
        Self {
            chain,
            contracts: chain.default_addresses(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::for_chain(Chain::Gnosis)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("A split is in progress")]
    SplitPending,
    #[error(transparent)]
    Sdk(#[from] seer_sdk::Error),
}

// ============================================================================
// Snapshot (sent to frontend)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    CreateMarket,
    SplitPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub kind: TxKind,
    pub hash: H256,
    pub sent_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub chain: Chain,
    pub chain_id: u64,
    pub is_testnet: bool,
    pub contracts: ContractAddresses,
    pub missing_contracts: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitView {
    pub market: MarketInfo,
    pub context: SplitContext,
    pub amount: String,
    pub pending: bool,
    pub balance: Option<U256>,
    pub balance_formatted: Option<String>,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub revision: u64,
    pub chain_status: ChainStatus,
    pub wizard: Option<WizardView>,
    pub split: Option<SplitView>,
    pub transactions: Vec<TxRecord>,
}

// ============================================================================
// App state manager
// ============================================================================

/// Split form bound to one market and account.
pub struct SplitSession {
    pub market: MarketInfo,
    pub context: SplitContext,
    pub form: SplitForm,
    /// Collateral balance fetched before validation; `None` until loaded.
    pub balance: Option<U256>,
}

impl SplitSession {
    fn view(&self) -> SplitView {
        let decimals = self.context.collateral_decimals;
        let errors = match self.balance {
            Some(balance) if !self.form.amount().trim().is_empty() => {
                self.form.validate(balance, decimals)
            }
            _ => FieldErrors::new(),
        };
        SplitView {
            market: self.market.clone(),
            context: self.context,
            amount: self.form.amount().to_string(),
            pending: self.form.is_pending(),
            balance: self.balance,
            balance_formatted: self.balance.map(|b| format_units(b, decimals)),
            errors,
        }
    }
}

pub struct AppStateManager {
    app_data_dir: PathBuf,
    config: ChainConfig,
    wizard: Option<Wizard>,
    split: Option<SplitSession>,
    transactions: Vec<TxRecord>,
    revision: u64,
}

impl AppStateManager {
    /// Load the saved chain config; a missing or unreadable file falls back to
    /// the Gnosis defaults.
    pub fn new(app_data_dir: PathBuf) -> Self {
        let config = Self::load_config(&app_data_dir).unwrap_or_default();
        Self {
            app_data_dir,
            config,
            wizard: None,
            split: None,
            transactions: Vec::new(),
            revision: 0,
        }
    }

    pub fn is_first_launch(&self) -> bool {
        !self.app_data_dir.join(CONFIG_FILE).exists()
    }

    pub fn config(&self) -> ChainConfig {
        self.config
    }

    fn split_pending(&self) -> bool {
        self.split.as_ref().is_some_and(|s| s.form.is_pending())
    }

    /// Switch chain. Contract overrides replace the chain defaults. Refused
    /// while a split is in flight.
    pub fn set_chain(
        &mut self,
        chain: Chain,
        contracts: Option<ContractAddresses>,
    ) -> Result<ChainConfig, StateError> {
        if self.split_pending() {
            return Err(StateError::SplitPending);
        }
        let config = ChainConfig {
            chain,
            contracts: contracts.unwrap_or_else(|| chain.default_addresses()),
        };
        self.save_config(&config)?;
        if config != self.config {
            // A split session is bound to the old chain's contracts.
            self.split = None;
        }
        self.config = config;
        Ok(config)
    }

    // --- Wizard ---

    /// Open a fresh wizard, replacing any previous session.
    pub fn start_wizard(&mut self, market_type: MarketType) {
        self.wizard = Some(Wizard::new(market_type));
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Result<&mut Wizard, String> {
        self.wizard
            .as_mut()
            .ok_or_else(|| "No market wizard is open".to_string())
    }

    // --- Split ---

    /// Bind a fresh split form to `market`, replacing the current one unless
    /// it is in flight.
    pub fn open_split(
        &mut self,
        market: MarketInfo,
        account: Address,
        balance: Option<U256>,
    ) -> Result<(), StateError> {
        if self.split_pending() {
            return Err(StateError::SplitPending);
        }
        let context = SplitContext::for_market(account, &market, &self.config.contracts)?;
        self.split = Some(SplitSession {
            market,
            context,
            form: SplitForm::new(),
            balance,
        });
        Ok(())
    }

    pub fn split(&self) -> Option<&SplitSession> {
        self.split.as_ref()
    }

    pub fn split_mut(&mut self) -> Result<&mut SplitSession, String> {
        self.split
            .as_mut()
            .ok_or_else(|| "No split form is open".to_string())
    }

    // --- Transactions ---

    pub fn record_tx(&mut self, kind: TxKind, hash: H256) {
        self.transactions.insert(
            0,
            TxRecord {
                kind,
                hash,
                sent_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.transactions.truncate(MAX_TRANSACTIONS);
    }

    pub fn transactions(&self) -> &[TxRecord] {
        &self.transactions
    }

    // --- Snapshot ---

    pub fn chain_status(&self) -> ChainStatus {
        let chain = self.config.chain;
        ChainStatus {
            chain,
            chain_id: chain.chain_id(),
            is_testnet: chain.is_testnet(),
            contracts: self.config.contracts,
            missing_contracts: self.config.contracts.missing(),
        }
    }

    pub fn snapshot(&self) -> AppState {
        AppState {
            revision: self.revision,
            chain_status: self.chain_status(),
            wizard: self.wizard.as_ref().map(Wizard::view),
            split: self.split.as_ref().map(SplitSession::view),
            transactions: self.transactions.clone(),
        }
    }

    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    // --- Persistence helpers ---

    fn load_config(dir: &Path) -> Option<ChainConfig> {
        let path = dir.join(CONFIG_FILE);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
                None
            }
        }
    }

    fn save_config(&self, config: &ChainConfig) -> Result<(), StateError> {
        fs::create_dir_all(&self.app_data_dir)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(self.app_data_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
