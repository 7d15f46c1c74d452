use alloy::primitives::Address;
use log::{debug, warn};

use crate::chain::{parse_address, ChainClient};
use crate::config::{Config, NetworkConfig};
use crate::error::CheckError;
use crate::types::{
    format_units, AssetKind, BalanceReport, BalanceRequest, BalanceResult, BalanceValue,
};

/// Everything a check needs to know about the selected network.
///
/// Built once per network switch and passed into every operation.
pub struct NetworkContext<C> {
    pub id: String,
    pub network: NetworkConfig,
    pub client: C,
}

impl<C: ChainClient> NetworkContext<C> {
    pub fn new(id: impl Into<String>, network: NetworkConfig, client: C) -> Self {
        Self {
            id: id.into(),
            network,
            client,
        }
    }

    /// Look up `network_id` in `config` and attach a client built by `make_client`
    pub fn from_config(
        config: &Config,
        network_id: &str,
        make_client: impl FnOnce(&NetworkConfig) -> C,
    ) -> Result<Self, CheckError> {
        let network = config
            .get_network(network_id)
            .ok_or_else(|| CheckError::UnknownNetwork(network_id.to_string()))?;
        let client = make_client(network);
        Ok(Self::new(network_id, network.clone(), client))
    }

    pub fn native_symbol(&self) -> &str {
        &self.network.native_token.symbol
    }
}

/// Validate a wallet address before any RPC call is made
pub fn validate_address<C: ChainClient>(
    ctx: &NetworkContext<C>,
    address: &str,
) -> Result<Address, CheckError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(CheckError::EmptyAddress);
    }
    if !ctx.client.is_valid_address(address) {
        return Err(CheckError::InvalidAddress(address.to_string()));
    }
    parse_address(address).map_err(|_| CheckError::InvalidAddress(address.to_string()))
}

/// Validate an ERC-20 contract address before reading from it
pub fn validate_token_address<C: ChainClient>(
    ctx: &NetworkContext<C>,
    contract: &str,
) -> Result<Address, CheckError> {
    let contract = contract.trim();
    if !ctx.client.is_valid_address(contract) {
        return Err(CheckError::InvalidTokenAddress(contract.to_string()));
    }
    parse_address(contract).map_err(|_| CheckError::InvalidTokenAddress(contract.to_string()))
}

/// Native coin balance; failures come back as [`BalanceValue::Failed`]
pub async fn fetch_native<C: ChainClient>(ctx: &NetworkContext<C>, owner: Address) -> BalanceValue {
    match ctx.client.get_native_balance(owner).await {
        Ok(amount) => BalanceValue::Amount(format_units(amount, ctx.network.native_token.decimals)),
        Err(e) => {
            warn!("{} native balance error: {:#}", ctx.native_symbol(), e);
            BalanceValue::Failed(e.to_string())
        }
    }
}

/// Balance of a token from the network's token table
pub async fn fetch_token<C: ChainClient>(
    ctx: &NetworkContext<C>,
    owner: Address,
    symbol: &str,
) -> BalanceValue {
    let Some(token) = ctx.network.token(symbol) else {
        return BalanceValue::NotAvailable;
    };

    let result = async {
        let token_address = parse_address(&token.address)?;
        ctx.client.balance_of(token_address, owner).await
    }
    .await;

    match result {
        Ok(amount) => BalanceValue::Amount(format_units(amount, token.decimals)),
        Err(e) => {
            warn!("{} balance error on {}: {:#}", symbol, ctx.id, e);
            BalanceValue::Failed(e.to_string())
        }
    }
}

/// Balance of an arbitrary ERC-20 contract, reading its precision on chain
pub async fn fetch_custom_token<C: ChainClient>(
    ctx: &NetworkContext<C>,
    owner: Address,
    contract: &str,
    symbol: &str,
) -> Result<String, CheckError> {
    let token = validate_token_address(ctx, contract)?;

    debug!("Reading {} ({}) on {}", symbol, token, ctx.id);
    let (amount, decimals) = tokio::try_join!(
        ctx.client.balance_of(token, owner),
        ctx.client.decimals(token),
    )?;

    Ok(format_units(amount, decimals))
}

/// Run every lookup in `request` and collect the results in report order:
/// native coin, well-known tokens, then the custom token.
///
/// Only address validation can fail; per-asset failures become
/// [`AssetKind::Error`] rows.
pub async fn aggregate<C: ChainClient>(
    ctx: &NetworkContext<C>,
    request: &BalanceRequest,
) -> Result<BalanceReport, CheckError> {
    let owner = validate_address(ctx, &request.address)?;
    Ok(collect_balances(ctx, owner, request).await)
}

/// Fetch every asset in `request` for an owner that already passed
/// [`validate_address`]
pub async fn collect_balances<C: ChainClient>(
    ctx: &NetworkContext<C>,
    owner: Address,
    request: &BalanceRequest,
) -> BalanceReport {
    let mut results = Vec::new();

    if request.native {
        let value = fetch_native(ctx, owner).await;
        results.push(BalanceResult::new(ctx.native_symbol(), value, AssetKind::Native));
    }

    // BTreeSet iterates in declaration order of WellKnownToken
    for token in &request.tokens {
        let symbol = token.symbol();
        if ctx.network.token(symbol).is_none() {
            debug!("{} has no contract on {}, skipping", symbol, ctx.id);
            continue;
        }
        let value = fetch_token(ctx, owner, symbol).await;
        results.push(BalanceResult::new(symbol, value, AssetKind::Erc20));
    }

    if let Some(custom) = &request.custom {
        let value = match fetch_custom_token(ctx, owner, &custom.address, &custom.symbol).await {
            Ok(amount) => BalanceValue::Amount(amount),
            Err(e) => {
                warn!("Custom token error: {}", e);
                BalanceValue::Failed(e.to_string())
            }
        };
        results.push(BalanceResult::new(&custom.symbol, value, AssetKind::Custom));
    }

    BalanceReport {
        network: ctx.id.clone(),
        address: request.address.trim().to_string(),
        results,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{CustomToken, WellKnownToken};
    use alloy::primitives::U256;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    pub const WALLET: &str = "0x78697a9cfc48c1e9d1040172d51833ef78083b10";
    pub const CUSTOM: &str = "0x1111111111111111111111111111111111111111";

    /// In-memory chain that records every call made against it
    #[derive(Default)]
    pub struct FakeChain {
        pub native: Option<U256>,
        pub balances: HashMap<Address, U256>,
        pub decimals: HashMap<Address, u8>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeChain {
        pub fn with_native(amount: u64) -> Self {
            Self {
                native: Some(U256::from(amount)),
                ..Default::default()
            }
        }

        pub fn token(mut self, address: &str, balance: u64, decimals: u8) -> Self {
            let address = parse_address(address).unwrap();
            self.balances.insert(address, U256::from(balance));
            self.decimals.insert(address, decimals);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn get_native_balance(&self, owner: Address) -> Result<U256> {
            self.record(format!("getBalance({})", owner));
            self.native.ok_or_else(|| anyhow!("connection refused"))
        }

        async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
            self.record(format!("balanceOf({}, {})", token, owner));
            self.balances
                .get(&token)
                .copied()
                .ok_or_else(|| anyhow!("execution reverted"))
        }

        async fn symbol(&self, token: Address) -> Result<String> {
            self.record(format!("symbol({})", token));
            Err(anyhow!("execution reverted"))
        }

        async fn decimals(&self, token: Address) -> Result<u8> {
            self.record(format!("decimals({})", token));
            self.decimals
                .get(&token)
                .copied()
                .ok_or_else(|| anyhow!("execution reverted"))
        }
    }

    pub fn context(network_id: &str, chain: FakeChain) -> NetworkContext<FakeChain> {
        let config = Config::load().unwrap();
        NetworkContext::from_config(&config, network_id, |_| chain).unwrap()
    }

    fn mainnet_tokens(chain: FakeChain) -> FakeChain {
        chain
            .token("0xdAC17F958D2ee523a2206206994597C13D831ec7", 2_500_000, 6)
            .token("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 1_000_000, 6)
            .token("0x6B175474E89094C44Da98b954EedeAC495271d0F", 1, 18)
    }

    fn symbols(report: &BalanceReport) -> Vec<&str> {
        report.results.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_assets_in_order() {
        let chain = mainnet_tokens(FakeChain::with_native(1_500_000_000_000_000_000))
            .token(CUSTOM, 42_000, 3);
        let ctx = context("ethereum", chain);
        let request = BalanceRequest::all(WALLET).with_custom(CustomToken::new(CUSTOM, "FOO"));

        let report = assert_ok!(aggregate(&ctx, &request).await);
        assert_eq!(symbols(&report), vec!["ETH", "USDT", "USDC", "DAI", "FOO"]);

        let balances: Vec<String> = report.results.iter().map(|r| r.balance.to_string()).collect();
        assert_eq!(balances, vec!["1.500000", "2.500000", "1.000000", "0.000000", "42.000000"]);

        let kinds: Vec<AssetKind> = report.results.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![AssetKind::Native, AssetKind::Erc20, AssetKind::Erc20, AssetKind::Erc20, AssetKind::Custom]
        );
        assert_eq!(report.network, "ethereum");
        assert_eq!(report.address, WALLET);
    }

    #[tokio::test]
    async fn test_unchecked_assets_are_omitted() {
        let ctx = context("ethereum", mainnet_tokens(FakeChain::with_native(0)));
        let request = BalanceRequest {
            address: WALLET.to_string(),
            native: false,
            tokens: BTreeSet::from([WellKnownToken::Dai]),
            custom: None,
        };

        let report = assert_ok!(aggregate(&ctx, &request).await);
        assert_eq!(symbols(&report), vec!["DAI"]);
        assert!(ctx.client.calls().iter().all(|c| !c.starts_with("getBalance")));
    }

    #[tokio::test]
    async fn test_result_count_skips_tokens_without_config() {
        // Base only lists USDC
        let chain = FakeChain::with_native(0).token("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", 7, 6);
        let ctx = context("base", chain);
        let request = BalanceRequest::all(WALLET).with_custom(CustomToken::new(CUSTOM, " "));

        let report = assert_ok!(aggregate(&ctx, &request).await);
        assert_eq!(symbols(&report), vec!["ETH", "USDC"]);
    }

    #[tokio::test]
    async fn test_polygon_native_symbol() {
        let ctx = context("polygon", FakeChain::with_native(2_000_000_000_000_000_000));
        let request = BalanceRequest {
            tokens: BTreeSet::new(),
            ..BalanceRequest::all(WALLET)
        };

        let report = assert_ok!(aggregate(&ctx, &request).await);
        assert_eq!(report.results[0].symbol, "MATIC");
        assert_eq!(report.results[0].balance.to_string(), "2.000000");
    }

    #[tokio::test]
    async fn test_invalid_address_makes_no_calls() {
        for address in ["", "   ", "0x1234", "0xdAC17F958D2ee523a2206206994597C13D831eC7"] {
            let ctx = context("ethereum", FakeChain::with_native(1));
            let request = BalanceRequest::all(address);

            let err = assert_err!(aggregate(&ctx, &request).await);
            assert!(err.is_validation(), "{} should be a validation error", err);
            assert!(ctx.client.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_address_message() {
        let ctx = context("ethereum", FakeChain::default());
        let err = assert_err!(validate_address(&ctx, "  "));
        assert_eq!(err.to_string(), "Please enter a wallet address");
    }

    #[tokio::test]
    async fn test_missing_token_is_not_available() {
        let ctx = context("polygon", FakeChain::default());
        let owner = validate_address(&ctx, WALLET).unwrap();

        let value = fetch_token(&ctx, owner, "DAI").await;
        assert_eq!(value, BalanceValue::NotAvailable);
        assert_eq!(value.to_string(), "Not available");
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_native_failure_becomes_error_row() {
        let ctx = context("ethereum", mainnet_tokens(FakeChain::default()));
        let report = assert_ok!(aggregate(&ctx, &BalanceRequest::all(WALLET)).await);

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.results[0].kind, AssetKind::Error);
        assert_eq!(report.results[0].balance.to_string(), "Error");
        assert_eq!(report.results[1].balance.to_string(), "2.500000");
    }

    #[tokio::test]
    async fn test_failing_well_known_token_becomes_error_row() {
        // no USDT balance registered, so balanceOf reverts
        let chain = FakeChain::with_native(0)
            .token("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 1_000_000, 6)
            .token("0x6B175474E89094C44Da98b954EedeAC495271d0F", 0, 18);
        let ctx = context("ethereum", chain);

        let report = assert_ok!(aggregate(&ctx, &BalanceRequest::all(WALLET)).await);
        assert_eq!(symbols(&report), vec!["ETH", "USDT", "USDC", "DAI"]);

        let usdt = &report.results[1];
        assert_eq!(usdt.kind, AssetKind::Error);
        assert_eq!(usdt.balance.to_string(), "Error");
        assert_eq!(usdt.error.as_deref(), Some("execution reverted"));

        assert_eq!(report.results[2].kind, AssetKind::Erc20);
        assert_eq!(report.results[2].balance.to_string(), "1.000000");
        assert_eq!(report.results[3].balance.to_string(), "0.000000");
    }

    #[tokio::test]
    async fn test_failing_custom_token_is_isolated() {
        let ctx = context("ethereum", mainnet_tokens(FakeChain::with_native(0)));
        let request = BalanceRequest::all(WALLET).with_custom(CustomToken::new(CUSTOM, "BAD"));

        let report = assert_ok!(aggregate(&ctx, &request).await);
        assert_eq!(symbols(&report), vec!["ETH", "USDT", "USDC", "DAI", "BAD"]);

        let errors: Vec<&BalanceResult> = report
            .results
            .iter()
            .filter(|r| r.kind == AssetKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "BAD");
        assert_eq!(report.results[1].balance.to_string(), "2.500000");
    }

    #[tokio::test]
    async fn test_custom_token_reads_balance_and_decimals() {
        let ctx = context("ethereum", FakeChain::default().token(CUSTOM, 123_456_789, 8));
        let owner = validate_address(&ctx, WALLET).unwrap();

        let amount = assert_ok!(fetch_custom_token(&ctx, owner, CUSTOM, "FOO").await);
        assert_eq!(amount, "1.234568");

        let calls = ctx.client.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().any(|c| c.starts_with("balanceOf")));
        assert!(calls.iter().any(|c| c.starts_with("decimals")));
    }

    #[tokio::test]
    async fn test_invalid_custom_contract_fails_fast() {
        let ctx = context("ethereum", FakeChain::default());
        let owner = validate_address(&ctx, WALLET).unwrap();

        let err = assert_err!(fetch_custom_token(&ctx, owner, "0xnope", "FOO").await);
        assert!(matches!(err, CheckError::InvalidTokenAddress(_)));
        assert!(ctx.client.calls().is_empty());
    }

    #[test]
    fn test_validate_token_address() {
        let ctx = context("ethereum", FakeChain::default());

        let token = assert_ok!(validate_token_address(&ctx, &format!(" {} ", CUSTOM)));
        assert_eq!(token, parse_address(CUSTOM).unwrap());

        let err = assert_err!(validate_token_address(&ctx, "0x12"));
        assert_eq!(err.to_string(), "Invalid token contract address: 0x12");
    }

    #[test]
    fn test_unknown_network() {
        let config = Config::load().unwrap();
        let result = NetworkContext::from_config(&config, "solana", |_| FakeChain::default());
        assert!(matches!(result, Err(CheckError::UnknownNetwork(id)) if id == "solana"));
    }
}
