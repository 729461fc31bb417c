//! In-memory chain backend and fixtures for tests.
//!
//! `MockChain` answers `eth_call`s from a table of canned responses keyed by
//! `(to, call data)` and records every transaction it is asked to send, so
//! tests can drive `SeerNode` end to end without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::abi::{self, Token};
use crate::chain::{ChainBackend, TransactionBackend, balance_of_function};
use crate::error::{Error, Result};
use crate::market::{MarketInfo, QuestionInfo};
use crate::market_view;
use crate::network::ContractAddresses;
use crate::primitives::{Address, H256, U256};
use crate::split::SplitRequest;
use crate::wizard::CreateMarketRequest;

/// A transaction handed to [`MockChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentTx {
    Split {
        request: SplitRequest,
        call_data: Vec<u8>,
    },
    CreateMarket(CreateMarketRequest),
}

#[derive(Default)]
pub struct MockChain {
    responses: Mutex<HashMap<(Address, Vec<u8>), Vec<u8>>>,
    sent: Mutex<Vec<SentTx>>,
    fail_transactions: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `call(to, data)` with `output`.
    pub fn respond(&self, to: Address, data: Vec<u8>, output: Vec<u8>) {
        lock(&self.responses).insert((to, data), output);
    }

    /// Serve `market` from `getMarket` on the configured MarketView.
    pub fn add_market(&self, contracts: &ContractAddresses, market: &MarketInfo) -> Result<()> {
        let data = market_view::encode_get_market(
            contracts.conditional_tokens,
            contracts.realitio,
            market.id,
        )?;
        self.respond(
            contracts.market_view,
            data,
            market_view::encode_market_return(market),
        );
        Ok(())
    }

    /// Serve `markets` from `getMarkets(count)` on the configured MarketView.
    pub fn set_markets(
        &self,
        contracts: &ContractAddresses,
        count: u64,
        markets: &[MarketInfo],
    ) -> Result<()> {
        let data = market_view::encode_get_markets(count, contracts.market_factory)?;
        self.respond(
            contracts.market_view,
            data,
            market_view::encode_markets_return(markets),
        );
        Ok(())
    }

    /// Serve `balanceOf(owner)` on `token`.
    pub fn set_balance(&self, owner: Address, token: Address, balance: U256) -> Result<()> {
        let data = abi::encode_call(balance_of_function(), &[Token::Address(owner)])?;
        self.respond(token, data, ethabi::encode(&[Token::Uint(balance)]));
        Ok(())
    }

    /// Make every subsequent transaction fail.
    pub fn fail_transactions(&self, fail: bool) {
        self.fail_transactions.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentTx> {
        lock(&self.sent).clone()
    }

    fn send(&self, tx: SentTx) -> Result<H256> {
        if self.fail_transactions.load(Ordering::SeqCst) {
            return Err(Error::Transaction("rejected by mock".to_string()));
        }
        let mut sent = lock(&self.sent);
        sent.push(tx);
        Ok(H256::from_low_u64_be(sent.len() as u64))
    }
}

impl ChainBackend for MockChain {
    fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        lock(&self.responses)
            .get(&(to, data.to_vec()))
            .cloned()
            .ok_or_else(|| Error::Backend(format!("execution reverted: no response for {to:?}")))
    }
}

impl TransactionBackend for MockChain {
    fn split_position(&self, request: &SplitRequest, call_data: &[u8]) -> Result<H256> {
        self.send(SentTx::Split {
            request: request.clone(),
            call_data: call_data.to_vec(),
        })
    }

    fn create_market(&self, request: &CreateMarketRequest) -> Result<H256> {
        self.send(SentTx::CreateMarket(request.clone()))
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────────

/// Address book with every contract set to a distinct non-zero address.
pub fn sample_contracts() -> ContractAddresses {
    ContractAddresses {
        market_view: Address::repeat_byte(0xa1),
        market_factory: Address::repeat_byte(0xa2),
        conditional_tokens: Address::repeat_byte(0xa3),
        realitio: Address::repeat_byte(0xa4),
        collateral_token: Address::repeat_byte(0xa5),
        collateral_decimals: 18,
    }
}

/// A Yes/No market whose question opened at t=1000 and is still unanswered.
pub fn sample_market() -> MarketInfo {
    MarketInfo {
        id: Address::repeat_byte(0x01),
        market_name: "Will X happen?".to_string(),
        outcomes: vec!["Yes".to_string(), "No".to_string()],
        condition_id: H256::repeat_byte(0xc0),
        question_id: H256::repeat_byte(0x90),
        template_id: U256::from(2u64),
        encoded_question: "Will X happen?\u{241f}\"Yes\",\"No\"\u{241f}politics\u{241f}en_US"
            .to_string(),
        oracle: Address::repeat_byte(0x0a),
        pools: vec![Address::repeat_byte(0x50)],
        question: QuestionInfo {
            content_hash: H256::repeat_byte(0x33),
            arbitrator: Address::repeat_byte(0xab),
            opening_ts: 1_000,
            timeout: 86_400,
            finalize_ts: 0,
            is_pending_arbitration: false,
            bounty: U256::zero(),
            best_answer: H256::zero(),
            history_hash: H256::zero(),
            bond: U256::zero(),
            min_bond: U256::from(10u64),
        },
    }
}
