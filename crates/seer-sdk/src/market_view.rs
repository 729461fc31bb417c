//! Descriptor for the read-only MarketView helper contract.
//!
//! The JSON-ABI document below is the deployed contract's interface and a
//! binary-compatibility boundary: parameter order and widths (`uint32`
//! timestamps, `uint256` amounts, `bytes32` hashes) must match it exactly.

use std::sync::OnceLock;

use crate::abi::{self, Contract, FromToken, Function, Token};
use crate::error::{Error, Result};
use crate::market::MarketInfo;
use crate::primitives::{Address, U256};

pub const GET_MARKET: &str = "getMarket";
pub const GET_MARKETS: &str = "getMarkets";

const ABI_JSON: &str = include_str!("market_view_abi.json");

/// Both MarketView functions, loaded once.
pub fn abi() -> Result<&'static Contract> {
    static ABI: OnceLock<std::result::Result<Contract, String>> = OnceLock::new();
    ABI.get_or_init(|| Contract::load(ABI_JSON.as_bytes()).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| Error::AbiDecode(format!("MarketView ABI: {e}")))
}

pub fn function(name: &str) -> Result<&'static Function> {
    abi()?
        .function(name)
        .map_err(|_| Error::UnknownFunction(name.to_string()))
}

/// The descriptor as a JSON-ABI document, component names included.
pub fn abi_json() -> Result<serde_json::Value> {
    serde_json::from_str(ABI_JSON).map_err(|e| Error::AbiDecode(format!("MarketView ABI: {e}")))
}

/// Call data for `getMarket(conditionalTokens, realitio, marketId)`.
pub fn encode_get_market(
    conditional_tokens: Address,
    realitio: Address,
    market_id: Address,
) -> Result<Vec<u8>> {
    abi::encode_call(
        function(GET_MARKET)?,
        &[
            Token::Address(conditional_tokens),
            Token::Address(realitio),
            Token::Address(market_id),
        ],
    )
}

/// Call data for `getMarkets(count, marketFactory)`.
pub fn encode_get_markets(count: u64, market_factory: Address) -> Result<Vec<u8>> {
    abi::encode_call(
        function(GET_MARKETS)?,
        &[Token::Uint(U256::from(count)), Token::Address(market_factory)],
    )
}

fn single_output(tokens: Vec<Token>) -> Result<Token> {
    let mut iter = tokens.into_iter();
    match (iter.next(), iter.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(Error::AbiDecode("expected exactly one return value".to_string())),
    }
}

pub fn decode_get_market(data: &[u8]) -> Result<MarketInfo> {
    let token = single_output(abi::decode_output(function(GET_MARKET)?, data)?)?;
    MarketInfo::from_token(token)
}

pub fn decode_get_markets(data: &[u8]) -> Result<Vec<MarketInfo>> {
    let token = single_output(abi::decode_output(function(GET_MARKETS)?, data)?)?;
    Vec::<MarketInfo>::from_token(token)
}

/// Return data a MarketView contract would produce for `getMarket`.
pub fn encode_market_return(market: &MarketInfo) -> Vec<u8> {
    ethabi::encode(&[market.to_token()])
}

/// Return data a MarketView contract would produce for `getMarkets`.
pub fn encode_markets_return(markets: &[MarketInfo]) -> Vec<u8> {
    ethabi::encode(&[Token::Array(markets.iter().map(MarketInfo::to_token).collect())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::StateMutability;

    const MARKET_INFO: &str = "(address,string,string[],bytes32,bytes32,uint256,string,address,\
        address[],(bytes32,address,uint32,uint32,uint32,bool,uint256,bytes32,bytes32,uint256,uint256))";

    fn input_types(f: &Function) -> String {
        f.inputs
            .iter()
            .map(|p| p.kind.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn inputs_match_contract() {
        let get_market = function(GET_MARKET).unwrap();
        assert_eq!(input_types(get_market), "address,address,address");
        let get_markets = function(GET_MARKETS).unwrap();
        assert_eq!(input_types(get_markets), "uint256,address");
        assert!(function("createMarket").is_err());
    }

    #[test]
    fn market_info_layout() {
        let get_market = function(GET_MARKET).unwrap();
        assert_eq!(get_market.outputs.len(), 1);
        assert_eq!(get_market.outputs[0].kind.to_string(), MARKET_INFO);
        let get_markets = function(GET_MARKETS).unwrap();
        assert_eq!(get_markets.outputs[0].kind.to_string(), format!("{MARKET_INFO}[]"));
    }

    #[test]
    fn both_functions_are_views() {
        let functions: Vec<_> = abi().unwrap().functions().collect();
        assert_eq!(functions.len(), 2);
        assert!(functions.iter().all(|f| f.state_mutability == StateMutability::View));
    }

    #[test]
    fn get_market_call_data_layout() {
        let data = encode_get_market(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            Address::repeat_byte(0x33),
        )
        .unwrap();
        assert_eq!(data.len(), 4 + 3 * 32);
        assert_eq!(data[..4], function(GET_MARKET).unwrap().short_signature());
        assert_eq!(&data[4 + 12..4 + 32], &[0x11; 20]);
        assert_eq!(&data[4 + 64 + 12..], &[0x33; 20]);
    }

    #[test]
    fn get_markets_call_data_layout() {
        let data = encode_get_markets(25, Address::repeat_byte(0x44)).unwrap();
        assert_eq!(data.len(), 4 + 2 * 32);
        assert_eq!(data[4 + 31], 25);
    }

    #[test]
    fn json_keeps_struct_names() {
        let json = abi_json().unwrap();
        assert_eq!(json[0]["name"], "getMarket");
        assert_eq!(json[0]["outputs"][0]["type"], "tuple");
        assert_eq!(json[0]["outputs"][0]["components"][1]["name"], "marketName");
        assert_eq!(json[0]["outputs"][0]["components"][9]["type"], "tuple");
        assert_eq!(json[1]["outputs"][0]["type"], "tuple[]");
        assert_eq!(json[1]["inputs"][1]["internalType"], "contract IMarketFactory");
    }

    #[test]
    fn decode_rejects_empty_return_data() {
        assert!(decode_get_market(&[]).is_err());
        assert!(decode_get_markets(&[]).is_err());
    }
}
