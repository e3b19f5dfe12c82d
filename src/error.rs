use thiserror::Error;

/// Error type for this crate.
///
/// The enum fields correspond to the different parts of a
/// [Graph](crate::Graph): demes, epochs, migrations, pulses,
/// and the low-level value types they are built from.
///
/// # Example
///
/// A deme must resolve a population size, either directly or from
/// the graph's `default_Ne`.
///
/// ```
/// let mut graph = demograph::Graph::new(
///     "a deme with no sizes",
///     demograph::TimeUnits::Generations,
///     1.0,
/// )
/// .unwrap();
/// let result = graph.add_deme("A", demograph::DemeHistory::default(), &[]);
/// assert!(matches!(result, Err(demograph::DemographError::DemeError(_))));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DemographError {
    /// Errors related to demes
    #[error("{0}")]
    DemeError(String),
    /// Errors related to epochs
    #[error("{0}")]
    EpochError(String),
    /// Top-level errors
    #[error("{0}")]
    GraphError(String),
    /// Errors related to migrations
    #[error("{0}")]
    MigrationError(String),
    /// Errors related to pulses
    #[error("{0}")]
    PulseError(String),
    /// Errors related to low-level types
    #[error("{0}")]
    ValueError(String),
}
