use thiserror::Error;

/// Failures a balance check can surface to its caller.
///
/// Only the validation variants ever escape [`crate::aggregate`]; the others
/// are produced by individual asset fetches and folded into the report.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Please enter a wallet address")]
    EmptyAddress,

    #[error("Invalid Ethereum address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid token contract address: {0}")]
    InvalidTokenAddress(String),

    #[error("Network '{0}' not found in configuration")]
    UnknownNetwork(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract call failed: {0}")]
    Contract(#[from] anyhow::Error),
}

impl CheckError {
    /// True for errors caused by user input rather than the network
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CheckError::EmptyAddress
                | CheckError::InvalidAddress(_)
                | CheckError::InvalidTokenAddress(_)
        )
    }
}
