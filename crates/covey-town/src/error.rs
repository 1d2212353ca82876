//! Error types for the `covey-town` crate.

use covey_types::PlayerId;

use crate::credentials::CredentialError;

/// Errors returned by town operations.
///
/// Rejections that leave the town unchanged (overlapping areas, unknown ids)
/// are reported as `false` or silently ignored, not as errors.
#[derive(Debug, thiserror::Error)]
pub enum TownError {
    /// The video credential for a joining player could not be issued.
    #[error("credential issuance failed: {0}")]
    Credential(#[from] CredentialError),

    /// The town already holds its maximum number of players.
    #[error("town is full ({capacity} players)")]
    AtCapacity {
        /// Maximum players.
        capacity: u32,
    },

    /// The player already holds a session in this town.
    #[error("player {player} has already joined")]
    AlreadyJoined {
        /// The joining player's id.
        player: PlayerId,
    },

    /// The town's controller task has stopped.
    #[error("town controller is no longer running")]
    Closed,
}
