mod aggregator;
mod chain;
mod checker;
mod config;
mod error;
mod ethereum;
mod types;

pub use aggregator::{
    aggregate, collect_balances, fetch_custom_token, fetch_native, fetch_token, validate_address,
    validate_token_address, NetworkContext,
};
pub use chain::{is_valid_address, parse_address, ChainClient};
pub use checker::{BalanceChecker, CheckState};
pub use config::{Config, NativeToken, NetworkConfig, TokenInfo};
pub use error::CheckError;
pub use ethereum::EthereumClient;
pub use types::{
    format_units, AssetKind, BalanceReport, BalanceRequest, BalanceResult, BalanceValue,
    CustomToken, WellKnownToken, DISPLAY_DECIMALS,
};

/// Context for `network_id` backed by the network's JSON-RPC endpoint
pub fn connect(config: &Config, network_id: &str) -> Result<NetworkContext<EthereumClient>, CheckError> {
    NetworkContext::from_config(config, network_id, |network| {
        EthereumClient::new(network.rpc.clone())
    })
}

/// Check balances for a request on a network from the embedded configuration
pub async fn get_balances(network_id: &str, request: &BalanceRequest) -> Result<BalanceReport, CheckError> {
    let config = Config::load().map_err(|e| CheckError::Config(format!("{:#}", e)))?;
    let ctx = connect(&config, network_id)?;
    aggregate(&ctx, request).await
}

/// Read `symbol()` and `decimals()` of an ERC-20 contract
pub async fn token_metadata<C: ChainClient>(
    ctx: &NetworkContext<C>,
    contract: &str,
) -> Result<(String, u8), CheckError> {
    let token = validate_token_address(ctx, contract)?;
    let (symbol, decimals) = tokio::try_join!(ctx.client.symbol(token), ctx.client.decimals(token))?;
    Ok((symbol, decimals))
}
