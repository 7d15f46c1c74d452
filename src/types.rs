use alloy::primitives::U256;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Fractional digits every balance is rendered with
pub const DISPLAY_DECIMALS: u8 = 6;

/// Tokens the checker knows about on every network.
///
/// Variant order is the order results are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WellKnownToken {
    Usdt,
    Usdc,
    Dai,
}

impl WellKnownToken {
    pub const ALL: [WellKnownToken; 3] = [Self::Usdt, Self::Usdc, Self::Dai];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usdt => "USDT",
            Self::Usdc => "USDC",
            Self::Dai => "DAI",
        }
    }
}

impl fmt::Display for WellKnownToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for WellKnownToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|token| token.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown token '{}', expected one of usdt, usdc, dai", s))
    }
}

/// A user-supplied ERC-20 contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomToken {
    pub address: String,
    pub symbol: String,
}

impl CustomToken {
    /// Returns `None` unless both fields are non-empty after trimming.
    pub fn new(address: &str, symbol: &str) -> Option<Self> {
        let address = address.trim();
        let symbol = symbol.trim();
        if address.is_empty() || symbol.is_empty() {
            return None;
        }
        Some(Self {
            address: address.to_string(),
            symbol: symbol.to_string(),
        })
    }
}

/// What to look up for one wallet address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRequest {
    pub address: String,
    pub native: bool,
    pub tokens: BTreeSet<WellKnownToken>,
    pub custom: Option<CustomToken>,
}

impl BalanceRequest {
    /// Native coin plus every well-known token
    pub fn all(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            native: true,
            tokens: WellKnownToken::ALL.into_iter().collect(),
            custom: None,
        }
    }

    pub fn with_custom(mut self, custom: Option<CustomToken>) -> Self {
        self.custom = custom;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Native,
    Erc20,
    Custom,
    Error,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Native => "native",
            Self::Erc20 => "erc20",
            Self::Custom => "custom",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome of a single balance lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceValue {
    /// Human-readable amount with [`DISPLAY_DECIMALS`] fractional digits
    Amount(String),
    /// The token has no contract on the current network
    NotAvailable,
    /// The lookup failed; carries the reason for logs and JSON output
    Failed(String),
}

impl BalanceValue {
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Amount(_))
    }
}

impl fmt::Display for BalanceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(amount) => f.write_str(amount),
            Self::NotAvailable => f.write_str("Not available"),
            Self::Failed(_) => f.write_str("Error"),
        }
    }
}

impl Serialize for BalanceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of a balance report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceResult {
    pub symbol: String,
    pub balance: BalanceValue,
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BalanceResult {
    /// Builds a row; sentinel values always get [`AssetKind::Error`].
    pub fn new(symbol: impl Into<String>, balance: BalanceValue, kind: AssetKind) -> Self {
        let (kind, error) = match &balance {
            BalanceValue::Amount(_) => (kind, None),
            BalanceValue::NotAvailable => (AssetKind::Error, None),
            BalanceValue::Failed(reason) => (AssetKind::Error, Some(reason.clone())),
        };
        Self {
            symbol: symbol.into(),
            balance,
            kind,
            error,
        }
    }
}

/// Everything a front end needs to render one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub network: String,
    pub address: String,
    pub results: Vec<BalanceResult>,
}

/// Scale an on-chain integer amount by `10^-decimals`, rounded half-up to six
/// fractional digits.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let ten = U256::from(10u8);
    let display = DISPLAY_DECIMALS;
    let unit = ten.pow(U256::from(display));

    let (whole, fraction) = if decimals > display {
        match ten.checked_pow(U256::from(decimals - display)) {
            Some(divisor) => {
                // divisor >= 10, so the rounded quotient cannot overflow
                let mut scaled = amount / divisor;
                let remainder = amount % divisor;
                if remainder >= divisor - remainder {
                    scaled += U256::from(1u8);
                }
                (scaled / unit, scaled % unit)
            }
            // more than 10^77 smallest units per display unit, always rounds to zero
            None => (U256::ZERO, U256::ZERO),
        }
    } else {
        // 10^decimals <= 10^6 and remainder < 10^decimals, nothing here can overflow
        let divisor = ten.pow(U256::from(decimals));
        let fraction = (amount % divisor) * ten.pow(U256::from(display - decimals));
        (amount / divisor, fraction)
    };

    format!(
        "{}.{:0>width$}",
        whole,
        fraction.to_string(),
        width = display as usize
    )
}
