use thiserror::Error;

/// Errors surfaced by the simulation engine.
///
/// Both kinds are synchronous and recoverable: fix the parameters (or call
/// `reset`) and retry. A failed call is rejected before any state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Bad reset parameters: a zero size, or more initial infected than agents.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The tick pipeline was invoked before the first successful reset.
    #[error("simulation not initialized; call reset first")]
    NotInitialized,
}
