//! Async coordinator over the blocking chain backend.
//!
//! All public methods take `&self`. Backend calls are dispatched through
//! `tokio::task::spawn_blocking` so callers stay in async land.

use std::sync::{Arc, Mutex};

use crate::chain::{ChainBackend, TransactionBackend};
use crate::error::{Error, NodeError};
use crate::market::MarketInfo;
use crate::market_view;
use crate::network::ContractAddresses;
use crate::primitives::{Address, H256, U256};
use crate::split::SplitRequest;
use crate::wizard::CreateMarketRequest;

pub struct SeerNode<B> {
    backend: Arc<B>,
    contracts: Arc<Mutex<ContractAddresses>>,
}

impl<B> Clone for SeerNode<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            contracts: self.contracts.clone(),
        }
    }
}

// ── Construction ────────────────────────────────────────────────────────────

impl<B> SeerNode<B>
where
    B: ChainBackend + TransactionBackend + Send + Sync + 'static,
{
    pub fn new(backend: B, contracts: ContractAddresses) -> Self {
        Self::with_backend(Arc::new(backend), contracts)
    }

    /// Share an existing backend (e.g. one also held by a test).
    pub fn with_backend(backend: Arc<B>, contracts: ContractAddresses) -> Self {
        Self {
            backend,
            contracts: Arc::new(Mutex::new(contracts)),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn contracts(&self) -> Result<ContractAddresses, NodeError> {
        self.contracts
            .lock()
            .map(|c| *c)
            .map_err(|_| NodeError::MutexPoisoned)
    }

    pub fn set_contracts(&self, contracts: ContractAddresses) -> Result<(), NodeError> {
        let mut guard = self.contracts.lock().map_err(|_| NodeError::MutexPoisoned)?;
        *guard = contracts;
        Ok(())
    }

    // ── Internal: spawn_blocking helper ─────────────────────────────────

    async fn run<F, R>(&self, f: F) -> Result<R, NodeError>
    where
        F: FnOnce(&B, ContractAddresses) -> Result<R, Error> + Send + 'static,
        R: Send + 'static,
    {
        let contracts = self.contracts()?;
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || f(backend.as_ref(), contracts).map_err(NodeError::Sdk))
            .await
            .map_err(|e| NodeError::Task(e.to_string()))?
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub async fn get_market(&self, market_id: Address) -> Result<MarketInfo, NodeError> {
        self.run(move |backend, contracts| {
            let market_view = require(contracts.market_view, "marketView")?;
            let data = market_view::encode_get_market(
                require(contracts.conditional_tokens, "conditionalTokens")?,
                require(contracts.realitio, "realitio")?,
                market_id,
            )?;
            log::debug!("getMarket {market_id:?} via {market_view:?}");
            market_view::decode_get_market(&backend.call(market_view, &data)?)
        })
        .await
    }

    pub async fn get_markets(&self, count: u64) -> Result<Vec<MarketInfo>, NodeError> {
        self.run(move |backend, contracts| {
            let market_view = require(contracts.market_view, "marketView")?;
            let data = market_view::encode_get_markets(
                count,
                require(contracts.market_factory, "marketFactory")?,
            )?;
            log::debug!("getMarkets({count}) via {market_view:?}");
            market_view::decode_get_markets(&backend.call(market_view, &data)?)
        })
        .await
    }

    /// Collateral balance of `owner` in base units.
    pub async fn collateral_balance(&self, owner: Address) -> Result<U256, NodeError> {
        self.run(move |backend, contracts| {
            let token = require(contracts.collateral_token, "collateralToken")?;
            backend.erc20_balance(owner, token)
        })
        .await
    }

    // ── Writes ──────────────────────────────────────────────────────────

    pub async fn split_position(&self, request: SplitRequest) -> Result<H256, NodeError> {
        self.run(move |backend, _| {
            let call_data = request.split_position_call_data()?;
            let tx = backend.split_position(&request, &call_data).inspect_err(|e| {
                log::warn!("splitPosition for {:?} failed: {e}", request.condition_id);
            })?;
            log::info!("splitPosition sent: {tx:?}");
            Ok(tx)
        })
        .await
    }

    pub async fn create_market(&self, request: CreateMarketRequest) -> Result<H256, NodeError> {
        self.run(move |backend, contracts| {
            require(contracts.market_factory, "marketFactory")?;
            let tx = backend.create_market(&request).inspect_err(|e| {
                log::warn!("createMarket {:?} failed: {e}", request.market_name);
            })?;
            log::info!("market created: {tx:?}");
            Ok(tx)
        })
        .await
    }
}

fn require(address: Address, name: &'static str) -> Result<Address, Error> {
    if address.is_zero() {
        Err(Error::MissingContract(name))
    } else {
        Ok(address)
    }
}
