use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use alloy::sol;
use anyhow::Result;
use async_trait::async_trait;

use crate::chain::ChainClient;

// Minimal ERC-20 read interface
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

/// EVM chain client using JSON-RPC over HTTP
pub struct EthereumClient {
    rpc_url: String,
}

impl EthereumClient {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    async fn get_native_balance(&self, owner: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);

        let balance = provider
            .get_balance(owner)
            .block_id(BlockNumberOrTag::Latest.into())
            .await?;

        Ok(balance)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);

        let contract = IERC20::new(token, provider);
        let balance: U256 = contract.balanceOf(owner).call().await?._0;

        Ok(balance)
    }

    async fn symbol(&self, token: Address) -> Result<String> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);

        let contract = IERC20::new(token, provider);
        Ok(contract.symbol().call().await?._0)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);

        let contract = IERC20::new(token, provider);
        Ok(contract.decimals().call().await?._0)
    }
}
