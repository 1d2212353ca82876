//! Error types for species lookups.

use covey_types::SpeciesName;

/// Errors that can occur while resolving a species.
#[derive(Debug, thiserror::Error)]
pub enum SpeciesError {
    /// The backing service could not be reached or returned an error status.
    #[error("lookup for {species} failed: {message}")]
    Lookup {
        /// The species being resolved.
        species: SpeciesName,
        /// Description of the failure.
        message: String,
    },

    /// The service answered but the record was missing required fields.
    #[error("record for {species} is malformed: {message}")]
    Malformed {
        /// The species being resolved.
        species: SpeciesName,
        /// Which field was missing or invalid.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("species client setup failed: {message}")]
    Client {
        /// Description of the failure.
        message: String,
    },

    /// The source has no record for this species.
    #[error("no record for {0}")]
    NotFound(SpeciesName),
}
