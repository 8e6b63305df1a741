mod token_manager;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use token_manager::{AccessTokenManager, DATASTORE_SCOPE, DEFAULT_TOKEN_ENDPOINT};

/// Source of bearer tokens for outgoing requests.
///
/// The document client talks to this seam instead of a concrete manager so
/// tests and emulator setups can substitute a canned token without standing
/// up an OAuth exchange.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn bearer_token(&self) -> StoreResult<String>;
}

pub type TokenProviderArc = Arc<dyn TokenProvider>;

/// Provider that always hands out the same token.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> StoreResult<String> {
        Ok(self.token.clone())
    }
}
