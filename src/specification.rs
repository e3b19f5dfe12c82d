//! The entities of a demographic history and the [`Graph`] builder
//! that validates them.
//!
//! Construction is two-phase: callers hand the builder provisional
//! records ([`EpochSpec`], [`DemeHistory`]) whose unset fields are
//! inferred during a finalization pass, producing immutable resolved
//! entities ([`Epoch`], [`Deme`], [`Migration`], [`Pulse`]).

use crate::deme_size::DemeSize;
use crate::error::DemographError;
use crate::migration_rate::MigrationRate;
use crate::proportion::Proportion;
use crate::time::{EndTime, GenerationTime, IntervalClosure, Time, TimeInterval, TimeUnits};
use serde::Serialize;
use std::collections::HashMap;

type DemeMap = HashMap<String, usize>;

// Relative tolerance for requiring subgraph proportions to sum to one.
const PROPORTION_SUM_TOLERANCE: f64 = 1e-9;

/// A provisional epoch.
///
/// Unset fields are inferred when the owning deme is finalized:
/// an unset `end_time` inherits the deme's terminal end time, an
/// unset `initial_size` continues the previous epoch's `final_size`,
/// and an unset `final_size` keeps the epoch's size constant.
///
/// # Examples
///
/// This type supports field initialization with defaults:
///
/// ```
/// let _ = demograph::EpochSpec {
///     start_time: Some(100.0),
///     final_size: Some(250.0),
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EpochSpec {
    /// The start (most recent) time of the epoch.  Defaults to zero.
    pub start_time: Option<f64>,
    /// The end (oldest) time of the epoch.
    pub end_time: Option<f64>,
    /// Population size at `start_time`.
    pub initial_size: Option<f64>,
    /// Population size at `end_time`.  If it differs from
    /// `initial_size`, the size changes monotonically over the epoch.
    pub final_size: Option<f64>,
}

// An epoch whose inferred fields have been resolved but whose values
// have not yet been validated.  None means "no finite end".
#[derive(Clone, Copy, Debug)]
struct ProvisionalEpoch {
    start_time: f64,
    end_time: Option<f64>,
    initial_size: f64,
    final_size: f64,
}

impl ProvisionalEpoch {
    fn finalize(&self, deme: &str, index: usize) -> Result<Epoch, DemographError> {
        let start_time = Time::try_from(self.start_time).map_err(|_| {
            DemographError::EpochError(format!(
                "deme {deme}, epoch {index}: invalid start_time: {}",
                self.start_time
            ))
        })?;
        let end_time = match self.end_time {
            Some(end) => EndTime::Finite(Time::try_from(end).map_err(|_| {
                DemographError::EpochError(format!(
                    "deme {deme}, epoch {index}: invalid end_time: {end}"
                ))
            })?),
            None => EndTime::Unbounded,
        };
        if !(end_time > start_time) {
            return Err(DemographError::EpochError(format!(
                "deme {deme}, epoch {index}: must have start_time < end_time, got: [{start_time}, {end_time})"
            )));
        }
        let initial_size = DemeSize::try_from(self.initial_size).map_err(|_| {
            DemographError::EpochError(format!(
                "deme {deme}, epoch {index}: invalid initial_size: {}",
                self.initial_size
            ))
        })?;
        let final_size = DemeSize::try_from(self.final_size).map_err(|_| {
            DemographError::EpochError(format!(
                "deme {deme}, epoch {index}: invalid final_size: {}",
                self.final_size
            ))
        })?;
        Ok(Epoch {
            start_time,
            end_time,
            initial_size,
            final_size,
        })
    }
}

/// A resolved epoch: one interval of constant-or-monotonic population
/// size for a single deme.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Epoch {
    start_time: Time,
    end_time: EndTime,
    initial_size: DemeSize,
    final_size: DemeSize,
}

impl Epoch {
    /// The resolved start time
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// The resolved end time
    pub fn end_time(&self) -> EndTime {
        self.end_time
    }

    /// The resolved size at `start_time`
    pub fn initial_size(&self) -> DemeSize {
        self.initial_size
    }

    /// The resolved size at `end_time`
    pub fn final_size(&self) -> DemeSize {
        self.final_size
    }

    /// The time span of the epoch.
    ///
    /// `f64::INFINITY` when the epoch has no finite end.
    pub fn dt(&self) -> f64 {
        self.end_time.as_f64() - f64::from(self.start_time)
    }

    /// The resolved time interval
    pub fn time_interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

/// Deme-level provisional fields, passed to [`Graph::add_deme`].
///
/// # Examples
///
/// ```
/// let history = demograph::DemeHistory {
///     ancestor: Some("ancestral".to_string()),
///     initial_size: Some(1000.0),
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DemeHistory {
    /// Name of the deme's ancestor, if any.  The ancestor must
    /// already be registered in the graph; the new deme's end time is
    /// forced to the ancestor's start time.
    pub ancestor: Option<String>,
    /// The time at which the deme begins existing.  Defaults to zero.
    pub start_time: Option<f64>,
    /// The time at which the deme stops existing.  Unset means the
    /// deme extends indefinitely into the past, unless an `ancestor`
    /// determines the end time.
    pub end_time: Option<f64>,
    /// Size at `start_time`.  Falls back to the graph's `default_Ne`.
    pub initial_size: Option<f64>,
    /// Size at the end of the first epoch.  Defaults to `initial_size`.
    pub final_size: Option<f64>,
}

/// A collection of individuals that are exchangeable at any fixed
/// time, with a contiguous, time-ordered epoch sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Deme {
    name: String,
    ancestor: Option<String>,
    epochs: Vec<Epoch>,
}

impl Deme {
    // Finalize a deme from its provisional first epoch and any
    // additional epoch specs, oldest last.
    fn resolve(
        name: &str,
        ancestor: Option<String>,
        first: ProvisionalEpoch,
        rest: &[EpochSpec],
    ) -> Result<Self, DemographError> {
        validate_deme_name(name)?;
        if let Some(ancestor_name) = &ancestor {
            if ancestor_name == name {
                return Err(DemographError::DemeError(format!(
                    "{name} cannot be its own ancestor"
                )));
            }
        }
        let epochs = resolve_epochs(name, first, rest)?;
        Ok(Self {
            name: name.to_owned(),
            ancestor,
            epochs,
        })
    }

    /// The deme's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the deme's ancestor, if any
    pub fn ancestor(&self) -> Option<&str> {
        self.ancestor.as_deref()
    }

    /// The resolved epochs, most recent first
    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    /// The number of epochs
    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Obtain an epoch by index
    pub fn get_epoch(&self, epoch: usize) -> Option<&Epoch> {
        self.epochs.get(epoch)
    }

    /// The start time of the deme's existence: the first epoch's
    /// start time.
    pub fn start_time(&self) -> Time {
        // a deme always has at least one epoch
        self.epochs[0].start_time()
    }

    /// The end time of the deme's existence: the last epoch's end
    /// time.
    pub fn end_time(&self) -> EndTime {
        self.epochs[self.epochs.len() - 1].end_time()
    }

    /// The resolved time interval of the deme's existence
    pub fn time_interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time(), self.end_time())
    }
}

// Names must be valid identifiers so that every external
// representation of the graph can use them as keys.
fn validate_deme_name(name: &str) -> Result<(), DemographError> {
    let identifier = match regex::Regex::new(r"^[^\d\W]\w*$") {
        Ok(re) => re,
        Err(_) => {
            return Err(DemographError::DemeError(
                "failed to build identifier regex".to_string(),
            ))
        }
    };
    if identifier.is_match(name) {
        Ok(())
    } else {
        Err(DemographError::DemeError(format!(
            "invalid deme name: {name}"
        )))
    }
}

// The finalization fold over a deme's epoch sequence.
//
// Each additional epoch extends the deme further into the past: it
// must start no earlier than its predecessor, the predecessor's end
// is closed down to the new start, an unset end inherits the deme's
// terminal end, and sizes continue across the boundary unless given.
fn resolve_epochs(
    deme: &str,
    first: ProvisionalEpoch,
    rest: &[EpochSpec],
) -> Result<Vec<Epoch>, DemographError> {
    let mut resolved: Vec<ProvisionalEpoch> = Vec::with_capacity(rest.len() + 1);
    let mut prev = first;
    for (offset, spec) in rest.iter().enumerate() {
        let start_time = spec.start_time.unwrap_or(0.0);
        if start_time < prev.start_time {
            return Err(DemographError::EpochError(format!(
                "deme {deme}: epochs must be non-overlapping and added in time-increasing order"
            )));
        }
        if spec.initial_size.is_none() && spec.final_size.is_none() {
            return Err(DemographError::EpochError(format!(
                "deme {deme}, epoch {}: must set either initial_size or final_size",
                offset + 1
            )));
        }
        let inherited_end = prev.end_time;
        prev.end_time = Some(start_time);
        let end_time = match spec.end_time {
            Some(end) if end.is_infinite() && end.is_sign_positive() => None,
            Some(end) => Some(end),
            None => inherited_end,
        };
        let initial_size = spec.initial_size.unwrap_or(prev.final_size);
        let final_size = spec.final_size.unwrap_or(initial_size);
        resolved.push(prev);
        prev = ProvisionalEpoch {
            start_time,
            end_time,
            initial_size,
            final_size,
        };
    }
    resolved.push(prev);
    resolved
        .iter()
        .enumerate()
        .map(|(index, provisional)| provisional.finalize(deme, index))
        .collect()
}

/// Parameters for continuous migration from one deme to another.
///
/// Source and destination demes follow the backwards-in-time
/// coalescent convention.  A record denotes a rate that becomes
/// active at `time`; a rate of zero disables migration from that
/// time onward.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Migration {
    source: String,
    dest: String,
    time: Time,
    rate: MigrationRate,
}

impl Migration {
    fn new(source: &str, dest: &str, time: f64, rate: f64) -> Result<Self, DemographError> {
        if source == dest {
            return Err(DemographError::MigrationError(
                "source and dest cannot be the same deme".to_string(),
            ));
        }
        Ok(Self {
            source: source.to_owned(),
            dest: dest.to_owned(),
            time: Time::try_from(time).map_err(|_| {
                DemographError::MigrationError(format!("invalid migration time: {time}"))
            })?,
            rate: MigrationRate::try_from(rate).map_err(|_| {
                DemographError::MigrationError(format!("invalid migration rate: {rate}"))
            })?,
        })
    }

    /// The source deme
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The destination deme
    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// The time at which the rate becomes active
    pub fn time(&self) -> Time {
        self.time
    }

    /// The migration rate
    pub fn rate(&self) -> MigrationRate {
        self.rate
    }
}

/// Parameters for an instantaneous pulse of migration from one deme
/// to another.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pulse {
    source: String,
    dest: String,
    time: Time,
    proportion: Proportion,
}

impl Pulse {
    fn new(source: &str, dest: &str, time: f64, proportion: f64) -> Result<Self, DemographError> {
        if source == dest {
            return Err(DemographError::PulseError(
                "source and dest cannot be the same deme".to_string(),
            ));
        }
        Ok(Self {
            source: source.to_owned(),
            dest: dest.to_owned(),
            time: Time::try_from(time)
                .map_err(|_| DemographError::PulseError(format!("invalid pulse time: {time}")))?,
            proportion: Proportion::try_from(proportion).map_err(|_| {
                DemographError::PulseError(format!("invalid pulse proportion: {proportion}"))
            })?,
        })
    }

    /// The source deme
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The destination deme
    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// The time of the pulse
    pub fn time(&self) -> Time {
        self.time
    }

    /// The ancestry proportion transferred
    pub fn proportion(&self) -> Proportion {
        self.proportion
    }
}

/// A directed graph describing a demography.
///
/// Vertices are demes; edges run from descendants to ancestors.
/// Every builder method validates fully before mutating, so a failed
/// call leaves the graph in its previous valid state.
///
/// # Examples
///
/// ```
/// let mut graph = demograph::Graph::new(
///     "an ancestral deme that splits into two islands",
///     demograph::TimeUnits::Generations,
///     1.0,
/// )
/// .unwrap()
/// .with_default_ne(1000.0)
/// .unwrap();
/// graph
///     .add_deme(
///         "ancestral",
///         demograph::DemeHistory {
///             start_time: Some(500.0),
///             ..Default::default()
///         },
///         &[],
///     )
///     .unwrap();
/// for island in ["alpha", "beta"] {
///     graph
///         .add_deme(
///             island,
///             demograph::DemeHistory {
///                 ancestor: Some("ancestral".to_string()),
///                 ..Default::default()
///             },
///             &[],
///         )
///         .unwrap();
/// }
/// graph
///     .add_symmetric_migration(&["alpha", "beta"], 1e-4, None, None)
///     .unwrap();
/// assert_eq!(graph.num_demes(), 3);
/// assert_eq!(graph.migrations().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Graph {
    description: String,
    time_units: TimeUnits,
    generation_time: GenerationTime,
    doi: Option<String>,
    #[serde(rename = "default_Ne")]
    default_ne: Option<DemeSize>,
    demes: Vec<Deme>,
    migrations: Vec<Migration>,
    pulses: Vec<Pulse>,
    #[serde(skip)]
    deme_map: DemeMap,
}

impl Graph {
    /// Create an empty graph.
    ///
    /// # Errors
    ///
    /// [`DemographError::GraphError`] if `generation_time` is not
    /// finite and greater than zero.
    pub fn new<D: AsRef<str>>(
        description: D,
        time_units: TimeUnits,
        generation_time: f64,
    ) -> Result<Self, DemographError> {
        Ok(Self {
            description: description.as_ref().to_owned(),
            time_units,
            generation_time: generation_time.try_into()?,
            doi: None,
            default_ne: None,
            demes: vec![],
            migrations: vec![],
            pulses: vec![],
            deme_map: DemeMap::default(),
        })
    }

    /// Record the DOI of the publication the demography is taken from.
    pub fn with_doi<D: AsRef<str>>(self, doi: D) -> Self {
        Self {
            doi: Some(doi.as_ref().to_owned()),
            ..self
        }
    }

    /// Set the default population size used when a deme is added
    /// without an `initial_size`.
    ///
    /// # Errors
    ///
    /// [`DemographError::GraphError`] if `size` is not finite and
    /// greater than zero.
    pub fn with_default_ne(self, size: f64) -> Result<Self, DemographError> {
        let default_ne = DemeSize::try_from(size)
            .map_err(|_| DemographError::GraphError(format!("invalid default_Ne: {size}")))?;
        Ok(Self {
            default_ne: Some(default_ne),
            ..self
        })
    }

    /// The description of the demography
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The time units of the graph
    pub fn time_units(&self) -> &TimeUnits {
        &self.time_units
    }

    /// The generation time
    pub fn generation_time(&self) -> GenerationTime {
        self.generation_time
    }

    /// The DOI, if recorded
    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    /// The default population size, if set
    pub fn default_ne(&self) -> Option<DemeSize> {
        self.default_ne
    }

    /// The demes, in registration order
    pub fn demes(&self) -> &[Deme] {
        &self.demes
    }

    /// The number of demes
    pub fn num_demes(&self) -> usize {
        self.demes.len()
    }

    /// The continuous migration records, in registration order
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// The pulses, in registration order
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Obtain a deme by name
    pub fn get_deme(&self, name: &str) -> Option<&Deme> {
        self.deme_map
            .get(name)
            .and_then(|index| self.demes.get(*index))
    }

    /// `true` if a deme with the given name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.deme_map.contains_key(name)
    }

    fn deme_or_err(&self, name: &str) -> Result<&Deme, DemographError> {
        self.get_deme(name)
            .ok_or_else(|| DemographError::GraphError(format!("{name} not in graph")))
    }

    /// The interval over which two demes coexist:
    /// `[max(start times), min(end times))`.
    ///
    /// # Errors
    ///
    /// [`DemographError::GraphError`] if either deme is unknown.
    pub fn time_intersection(
        &self,
        first: &str,
        second: &str,
    ) -> Result<TimeInterval, DemographError> {
        let deme1 = self.deme_or_err(first)?;
        let deme2 = self.deme_or_err(second)?;
        Ok(deme1.time_interval().intersect(&deme2.time_interval()))
    }

    /// Check that `time` falls within the coexistence interval of two
    /// demes, returning the interval.
    ///
    /// This is a pure query; the graph is never mutated.
    ///
    /// # Errors
    ///
    /// [`DemographError::GraphError`] if either deme is unknown, or
    /// if `time` lies outside the interval (half-open or closed, per
    /// `closure`).
    pub fn check_time_intersection(
        &self,
        first: &str,
        second: &str,
        time: Option<f64>,
        closure: IntervalClosure,
    ) -> Result<TimeInterval, DemographError> {
        let interval = self.time_intersection(first, second)?;
        if let Some(time) = time {
            let contained = match closure {
                IntervalClosure::HalfOpen => interval.contains_half_open(time),
                IntervalClosure::Closed => interval.contains_closed(time),
            };
            if !contained {
                let bracket = match closure {
                    IntervalClosure::HalfOpen => ')',
                    IntervalClosure::Closed => ']',
                };
                return Err(DemographError::GraphError(format!(
                    "{time} not in interval [{}, {}{bracket}, the time intersection of {first} and {second}",
                    interval.start_time(),
                    interval.end_time(),
                )));
            }
        }
        Ok(interval)
    }

    // Resolve and validate a deme without registering it.
    fn build_deme(
        &self,
        name: &str,
        history: &DemeHistory,
        epochs: &[EpochSpec],
    ) -> Result<Deme, DemographError> {
        if self.contains(name) {
            return Err(DemographError::GraphError(format!(
                "deme {name} already in graph"
            )));
        }
        let initial_size = match history.initial_size.or(self.default_ne.map(f64::from)) {
            Some(size) => size,
            None => {
                return Err(DemographError::DemeError(format!(
                    "must set initial_size for {name}"
                )))
            }
        };
        let final_size = history.final_size.unwrap_or(initial_size);
        let end_time = match &history.ancestor {
            Some(ancestor) => Some(f64::from(self.deme_or_err(ancestor)?.start_time())),
            None => history.end_time,
        };
        let end_time = match end_time {
            Some(end) if end.is_infinite() && end.is_sign_positive() => None,
            other => other,
        };
        let first = ProvisionalEpoch {
            start_time: history.start_time.unwrap_or(0.0),
            end_time,
            initial_size,
            final_size,
        };
        Deme::resolve(name, history.ancestor.clone(), first, epochs)
    }

    fn register_deme(&mut self, deme: Deme) {
        self.deme_map.insert(deme.name().to_owned(), self.demes.len());
        self.demes.push(deme);
    }

    /// Add a deme to the graph.
    ///
    /// The first epoch is built from `history`; `epochs` extend the
    /// deme further into the past and are finalized per the rules on
    /// [`EpochSpec`].  If `history` names an ancestor, the deme's end
    /// time is forced to the ancestor's start time.
    ///
    /// # Errors
    ///
    /// * [`DemographError::GraphError`] for a duplicate name or an
    ///   unknown ancestor.
    /// * [`DemographError::DemeError`] if no `initial_size` can be
    ///   resolved, or the name is not a valid identifier.
    /// * [`DemographError::EpochError`] if the epoch sequence cannot
    ///   be finalized.
    pub fn add_deme(
        &mut self,
        name: &str,
        history: DemeHistory,
        epochs: &[EpochSpec],
    ) -> Result<(), DemographError> {
        let deme = self.build_deme(name, &history, epochs)?;
        self.register_deme(deme);
        Ok(())
    }

    // The records a single migration call produces: the rate becoming
    // active at start_time and, if requested, deactivation at end_time.
    fn build_migration(
        &self,
        source: &str,
        dest: &str,
        rate: f64,
        start_time: Option<f64>,
        end_time: Option<f64>,
    ) -> Result<Vec<Migration>, DemographError> {
        let interval = self.time_intersection(source, dest)?;
        let start_time = start_time.unwrap_or_else(|| f64::from(interval.start_time()));
        // the defaulted start still needs the membership test: demes
        // with disjoint lifetimes have an empty intersection
        self.check_time_intersection(source, dest, Some(start_time), IntervalClosure::HalfOpen)?;
        let mut records = vec![Migration::new(source, dest, start_time, rate)?];
        if let Some(end) = end_time {
            self.check_time_intersection(source, dest, Some(end), IntervalClosure::HalfOpen)?;
            records.push(Migration::new(source, dest, end, 0.0)?);
        }
        Ok(records)
    }

    /// Add continuous migration from one deme to another.
    ///
    /// If `start_time` is unset it defaults to the earliest time at
    /// which the demes coexist.  If `end_time` is given, a rate-zero
    /// deactivation record is appended at that time.
    ///
    /// # Errors
    ///
    /// * [`DemographError::GraphError`] if either deme is unknown or
    ///   a time falls outside the coexistence interval.
    /// * [`DemographError::MigrationError`] for an invalid rate or
    ///   `source == dest`.
    pub fn add_migration(
        &mut self,
        source: &str,
        dest: &str,
        rate: f64,
        start_time: Option<f64>,
        end_time: Option<f64>,
    ) -> Result<(), DemographError> {
        let records = self.build_migration(source, dest, rate, start_time, end_time)?;
        self.migrations.extend(records);
        Ok(())
    }

    /// Add continuous symmetric migration between all pairs of the
    /// given demes: one [`add_migration`](Graph::add_migration) per
    /// ordered pair.
    ///
    /// # Errors
    ///
    /// As [`add_migration`](Graph::add_migration), plus
    /// [`DemographError::MigrationError`] if fewer than two demes are
    /// given.  No record is appended unless every pair validates.
    pub fn add_symmetric_migration(
        &mut self,
        demes: &[&str],
        rate: f64,
        start_time: Option<f64>,
        end_time: Option<f64>,
    ) -> Result<(), DemographError> {
        if demes.len() < 2 {
            return Err(DemographError::MigrationError(
                "must specify two or more demes".to_string(),
            ));
        }
        let mut records = vec![];
        for (i, source) in demes.iter().enumerate() {
            for (j, dest) in demes.iter().enumerate() {
                if i != j {
                    records.extend(self.build_migration(source, dest, rate, start_time, end_time)?);
                }
            }
        }
        self.migrations.extend(records);
        Ok(())
    }

    /// Add a pulse of migration at a fixed time.
    ///
    /// The time is checked against the closed coexistence interval: a
    /// pulse at the exact moment a deme ends is meaningful.
    ///
    /// # Errors
    ///
    /// * [`DemographError::GraphError`] if either deme is unknown or
    ///   `time` falls outside the closed coexistence interval.
    /// * [`DemographError::PulseError`] if the demes are in a direct
    ///   ancestor/descendant relation (such a pulse is redundant with
    ///   the ancestry edge), `source == dest`, or the proportion is
    ///   outside `[0, 1]`.
    pub fn add_pulse(
        &mut self,
        source: &str,
        dest: &str,
        proportion: f64,
        time: f64,
    ) -> Result<(), DemographError> {
        let source_deme = self.deme_or_err(source)?;
        let dest_deme = self.deme_or_err(dest)?;
        if source_deme.ancestor() == Some(dest) || dest_deme.ancestor() == Some(source) {
            return Err(DemographError::PulseError(format!(
                "{source} and {dest} have an ancestor/descendant relation"
            )));
        }
        self.check_time_intersection(source, dest, Some(time), IntervalClosure::Closed)?;
        let pulse = Pulse::new(source, dest, time, proportion)?;
        self.pulses.push(pulse);
        Ok(())
    }

    /// Add a new deme whose ancestry is a weighted blend of several
    /// existing demes, realized as a sequence of pulses from the new
    /// deme into each ancestor at the deme's end time.
    ///
    /// `end_time` in `history` defaults to the latest ancestor start
    /// time.  Each pulse's proportion is renormalized against the
    /// ancestry mass remaining after the pulses before it:
    /// `p[j] = proportions[j] / sum(proportions[j..])`.
    ///
    /// # Errors
    ///
    /// * [`DemographError::GraphError`] if `ancestors` and
    ///   `proportions` differ in length, the proportions do not sum
    ///   to one, an ancestor is unknown, a pulse time falls outside a
    ///   coexistence interval, or `history.ancestor` is set (subgraph
    ///   ancestry is given via `ancestors`).
    /// * Any error [`add_deme`](Graph::add_deme) can return.
    ///
    /// Nothing is appended unless the deme and every pulse validate.
    pub fn add_subgraph(
        &mut self,
        name: &str,
        ancestors: &[&str],
        proportions: &[f64],
        history: DemeHistory,
        epochs: &[EpochSpec],
    ) -> Result<(), DemographError> {
        if history.ancestor.is_some() {
            return Err(DemographError::GraphError(
                "subgraph ancestry is given via ancestors, not DemeHistory::ancestor".to_string(),
            ));
        }
        if ancestors.len() != proportions.len() {
            return Err(DemographError::GraphError(
                "ancestors and proportions differ in length".to_string(),
            ));
        }
        let total: f64 = proportions.iter().sum();
        if (total - 1.0).abs() > PROPORTION_SUM_TOLERANCE {
            return Err(DemographError::GraphError(format!(
                "proportions must sum to 1, got: {total}"
            )));
        }
        let mut latest_start: Option<Time> = None;
        for ancestor in ancestors {
            let start = self.deme_or_err(ancestor)?.start_time();
            latest_start = Some(match latest_start {
                Some(current) => std::cmp::max(current, start),
                None => start,
            });
        }
        let end_time = match (history.end_time, latest_start) {
            (Some(end), _) => end,
            (None, Some(start)) => f64::from(start),
            // unreachable: ancestors is non-empty once the sum check passes
            (None, None) => {
                return Err(DemographError::GraphError(
                    "subgraph requires at least one ancestor".to_string(),
                ))
            }
        };
        let scaled = renormalized_proportions(proportions)?;

        let deme = self.build_deme(
            name,
            &DemeHistory {
                end_time: Some(end_time),
                ..history
            },
            epochs,
        )?;
        let mut pulses = Vec::with_capacity(ancestors.len());
        for (ancestor, proportion) in ancestors.iter().zip(scaled) {
            let interval = deme
                .time_interval()
                .intersect(&self.deme_or_err(ancestor)?.time_interval());
            if !interval.contains_closed(end_time) {
                return Err(DemographError::GraphError(format!(
                    "{end_time} not in interval [{}, {}], the time intersection of {name} and {ancestor}",
                    interval.start_time(),
                    interval.end_time(),
                )));
            }
            pulses.push(Pulse::new(name, ancestor, end_time, proportion)?);
        }
        self.register_deme(deme);
        self.pulses.extend(pulses);
        Ok(())
    }
}

// Renormalize each proportion against the mass remaining after its
// predecessors.  Post-condition: the last ancestor absorbs all
// remaining ancestry, so the final value must be exactly one.
fn renormalized_proportions(proportions: &[f64]) -> Result<Vec<f64>, DemographError> {
    let mut scaled = Vec::with_capacity(proportions.len());
    for (j, proportion) in proportions.iter().enumerate() {
        let remaining: f64 = proportions[j..].iter().sum();
        scaled.push(proportion / remaining);
    }
    match scaled.last() {
        Some(last) if *last == 1.0 => Ok(scaled),
        _ => Err(DemographError::GraphError(
            "subgraph proportions failed to renormalize".to_string(),
        )),
    }
}
