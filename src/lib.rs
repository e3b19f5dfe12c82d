//! Build and validate demographic-history graphs.
//!
//! A demography is modeled as a directed graph of demes that are
//! born, change size, split, merge, and exchange migrants over time,
//! under the backwards-in-time convention: time increases from the
//! present (zero) towards the past.
//!
//! [`Graph`] owns the demes, continuous migrations, and pulses, and
//! exposes a builder API whose every call validates fully before
//! mutating.  A finished graph converts to and from the minimal
//! [`CompactGraph`] representation, which omits every field
//! recoverable via the defaulting rules.
//!
//! # Examples
//!
//! ```
//! let mut graph = demograph::Graph::new(
//!     "an ancestral deme splits into two islands 500 generations ago",
//!     demograph::TimeUnits::Generations,
//!     1.0,
//! )?
//! .with_default_ne(1000.0)?;
//! graph.add_deme(
//!     "ancestral",
//!     demograph::DemeHistory {
//!         start_time: Some(500.0),
//!         ..Default::default()
//!     },
//!     &[],
//! )?;
//! for island in ["alpha", "beta"] {
//!     graph.add_deme(
//!         island,
//!         demograph::DemeHistory {
//!             ancestor: Some("ancestral".to_string()),
//!             ..Default::default()
//!         },
//!         &[],
//!     )?;
//! }
//! graph.add_symmetric_migration(&["alpha", "beta"], 1e-4, None, None)?;
//!
//! // the compact form round-trips
//! let compact = graph.to_compact()?;
//! assert_eq!(compact.resolve()?, graph);
//! # Ok::<(), demograph::DemographError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod macros;

mod canonical;
mod deme_size;
mod error;
mod migration_rate;
mod proportion;
mod specification;
mod time;

pub use canonical::{CompactDeme, CompactEpoch, CompactGraph, CompactMigration, CompactPulse};
pub use deme_size::DemeSize;
pub use error::DemographError;
pub use migration_rate::MigrationRate;
pub use proportion::Proportion;
pub use specification::{Deme, DemeHistory, Epoch, EpochSpec, Graph, Migration, Pulse};
pub use time::{EndTime, GenerationTime, IntervalClosure, Time, TimeInterval, TimeUnits};
