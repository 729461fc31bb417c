use serde::{Deserialize, Serialize};

use crate::primitives::{Address, parse_address};

/// Supported EVM chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Gnosis,
    Mainnet,
    Sepolia,
}

impl Chain {
    pub fn chain_id(self) -> u64 {
        match self {
            Chain::Gnosis => 100,
            Chain::Mainnet => 1,
            Chain::Sepolia => 11_155_111,
        }
    }

    pub fn from_chain_id(id: u64) -> Option<Self> {
        match id {
            100 => Some(Chain::Gnosis),
            1 => Some(Chain::Mainnet),
            11_155_111 => Some(Chain::Sepolia),
            _ => None,
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(self, Chain::Sepolia)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Gnosis => "gnosis",
            Chain::Mainnet => "mainnet",
            Chain::Sepolia => "sepolia",
        }
    }

    /// Known deployments. Contracts without a canonical deployment are left
    /// as the zero address and must be configured.
    pub fn default_addresses(self) -> ContractAddresses {
        let parse = |s: &str| parse_address(s).unwrap_or_else(|_| Address::zero());
        match self {
            Chain::Gnosis => ContractAddresses {
                market_view: Address::zero(),
                market_factory: Address::zero(),
                conditional_tokens: parse("0xCeAfDD6bc0bEF976fdCd1112955828E00543c0Ce"),
                realitio: parse("0xE78996A233895bE74a66F451f1019cA9734205cc"),
                collateral_token: parse("0xaf204776c7245bF4147c2612BF6e5972Ee483701"),
                collateral_decimals: 18,
            },
            Chain::Mainnet => ContractAddresses {
                market_view: Address::zero(),
                market_factory: Address::zero(),
                conditional_tokens: parse("0xC59b0e4De5F1248C1140964E0fF287B192407E0C"),
                realitio: parse("0x5b7dD1E86623548AF054A4985F7fc8Ccbb554E2c"),
                collateral_token: parse("0x83F20F44975D03b1b09e64809B757c47f942BEeA"),
                collateral_decimals: 18,
            },
            Chain::Sepolia => ContractAddresses {
                market_view: Address::zero(),
                market_factory: Address::zero(),
                conditional_tokens: Address::zero(),
                realitio: Address::zero(),
                collateral_token: Address::zero(),
                collateral_decimals: 18,
            },
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gnosis" | "xdai" | "100" => Ok(Chain::Gnosis),
            "mainnet" | "ethereum" | "1" => Ok(Chain::Mainnet),
            "sepolia" | "11155111" => Ok(Chain::Sepolia),
            _ => Err(format!("invalid chain: {}", s)),
        }
    }
}

/// Contract address book for one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub market_view: Address,
    pub market_factory: Address,
    pub conditional_tokens: Address,
    pub realitio: Address,
    pub collateral_token: Address,
    pub collateral_decimals: u8,
}

impl ContractAddresses {
    /// Names of contracts still set to the zero address.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("marketView", self.market_view),
            ("marketFactory", self.market_factory),
            ("conditionalTokens", self.conditional_tokens),
            ("realitio", self.realitio),
            ("collateralToken", self.collateral_token),
        ]
        .into_iter()
        .filter(|(_, addr)| addr.is_zero())
        .map(|(name, _)| name)
        .collect()
    }
}
