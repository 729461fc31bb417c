use std::sync::OnceLock;

use crate::abi::{self, FromToken, Function, ParamType, StateMutability, Token};
use crate::error::{Error, Result};
use crate::primitives::{Address, H256, U256};
use crate::split::SplitRequest;
use crate::wizard::CreateMarketRequest;

/// Read access to an EVM chain.
pub trait ChainBackend {
    /// `eth_call` against the latest block; returns the raw return data.
    fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>>;

    /// ERC-20 `balanceOf(owner)` in base units.
    fn erc20_balance(&self, owner: Address, token: Address) -> Result<U256> {
        let function = balance_of_function();
        let data = abi::encode_call(function, &[Token::Address(owner)])?;
        let out = self.call(token, &data)?;
        let balance = abi::decode_output(function, &out)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::AbiDecode("balanceOf returned nothing".to_string()))?;
        U256::from_token(balance)
    }
}

/// Signs and sends transactions on behalf of the connected account.
pub trait TransactionBackend {
    /// Send `ConditionalTokens.splitPosition`; returns the transaction hash.
    fn split_position(&self, request: &SplitRequest, call_data: &[u8]) -> Result<H256>;

    /// Create the market through the market factory; returns the transaction hash.
    fn create_market(&self, request: &CreateMarketRequest) -> Result<H256>;
}

pub fn balance_of_function() -> &'static Function {
    static FUNCTION: OnceLock<Function> = OnceLock::new();
    FUNCTION.get_or_init(|| {
        abi::function(
            "balanceOf",
            vec![abi::param("account", ParamType::Address, Some("address"))],
            vec![abi::param("", ParamType::Uint(256), Some("uint256"))],
            StateMutability::View,
        )
    })
}
