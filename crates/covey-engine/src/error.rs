//! Error types for the engine binary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: covey_town::ConfigError,
    },

    /// The species source could not be built.
    #[error("species error: {source}")]
    Species {
        /// The underlying species error.
        #[from]
        source: covey_species::SpeciesError,
    },

    /// A town operation failed.
    #[error("town error: {source}")]
    Town {
        /// The underlying town error.
        #[from]
        source: covey_town::TownError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the failure.
        message: String,
    },
}
