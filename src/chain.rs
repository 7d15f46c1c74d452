use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;

/// Trait for chain clients - the RPC capability balance checks are built on.
///
/// The contract methods mirror the minimal ERC-20 read interface
/// (`balanceOf`, `symbol`, `decimals`).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Check the textual form of an account or contract address
    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }

    /// Get the native coin balance, in the smallest unit
    async fn get_native_balance(&self, owner: Address) -> Result<U256>;

    /// `balanceOf(owner)` on an ERC-20 contract
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    /// `symbol()` on an ERC-20 contract
    async fn symbol(&self, token: Address) -> Result<String>;

    /// `decimals()` on an ERC-20 contract
    async fn decimals(&self, token: Address) -> Result<u8>;
}

fn strip_hex_prefix(address: &str) -> &str {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address)
}

/// Accepts 40 hex digits with an optional `0x` (or `0X`) prefix. Mixed-case
/// input must carry a valid EIP-55 checksum; all-lower and all-upper are taken
/// as is.
pub fn is_valid_address(address: &str) -> bool {
    let hex = strip_hex_prefix(address);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{}", hex), None).is_ok();
    }
    true
}

/// Parse an address that already passed [`is_valid_address`]
pub fn parse_address(address: &str) -> Result<Address> {
    let hex = strip_hex_prefix(address);
    Ok(format!("0x{}", hex).parse()?)
}
