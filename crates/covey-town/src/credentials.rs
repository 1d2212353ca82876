//! Video credential issuance.

use async_trait::async_trait;
use covey_types::{PlayerId, TownId};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of locally minted credentials.
const LOCAL_TOKEN_LEN: usize = 32;

/// Errors raised by a [`CredentialIssuer`].
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The issuing service refused or could not be reached.
    #[error("issuer failed: {message}")]
    Issuer {
        /// Description of the failure.
        message: String,
    },
}

/// Issues the video credential a player needs to join a town's call.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Mint a credential for `player` in `town`.
    async fn issue(&self, town: &TownId, player: PlayerId) -> Result<String, CredentialError>;
}

/// Mints opaque credentials without calling out to a video provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCredentialIssuer;

#[async_trait]
impl CredentialIssuer for LocalCredentialIssuer {
    async fn issue(&self, town: &TownId, player: PlayerId) -> Result<String, CredentialError> {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(LOCAL_TOKEN_LEN)
            .map(char::from)
            .collect();
        Ok(format!("{town}.{player}.{secret}"))
    }
}
