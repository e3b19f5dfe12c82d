//! The compact (canonical) representation of a [`Graph`].
//!
//! [`Graph::to_compact`] produces the minimal representation that,
//! under the defaulting rules of the builder, reconstructs an
//! equivalent graph; [`CompactGraph::resolve`] performs that inverse
//! expansion by replaying the rules through the builder API.
//!
//! The compact types are pure data.  They serialize with omitted
//! fields absent and with `demes` as an ordered mapping from deme
//! name to fields, so external collaborators can exchange them in
//! any serde format.

use crate::deme_size::DemeSize;
use crate::error::DemographError;
use crate::migration_rate::MigrationRate;
use crate::proportion::Proportion;
use crate::specification::{Deme, DemeHistory, EpochSpec, Graph, Migration};
use crate::time::{GenerationTime, Time, TimeUnits};
use serde::{Deserialize, Serialize};

/// The compact form of a [`Graph`].
///
/// # Examples
///
/// ```
/// let mut graph = demograph::Graph::new(
///     "one deme",
///     demograph::TimeUnits::Generations,
///     1.0,
/// )
/// .unwrap();
/// graph
///     .add_deme(
///         "A",
///         demograph::DemeHistory {
///             initial_size: Some(100.0),
///             ..Default::default()
///         },
///         &[],
///     )
///     .unwrap();
/// let compact = graph.to_compact().unwrap();
/// assert_eq!(compact.resolve().unwrap(), graph);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactGraph {
    #[allow(missing_docs)]
    pub description: String,
    #[allow(missing_docs)]
    pub time_units: TimeUnits,
    #[allow(missing_docs)]
    pub generation_time: GenerationTime,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub doi: Option<String>,
    #[allow(missing_docs)]
    #[serde(
        rename = "default_Ne",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub default_ne: Option<DemeSize>,
    /// The demes, in registration order, serialized as a mapping from
    /// deme name to compacted fields.
    #[serde(with = "deme_table")]
    pub demes: Vec<CompactDeme>,
    /// One entry per rate change of each ordered deme pair.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub migrations: Vec<CompactMigration>,
    /// Pulses are emitted verbatim; no compaction applies.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pulses: Vec<CompactPulse>,
}

/// One deme of a [`CompactGraph`], with its first epoch inlined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactDeme {
    /// The deme's name; the key of the serialized mapping entry.
    #[serde(skip)]
    pub name: String,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ancestor: Option<String>,
    /// Present only when the first epoch starts after the present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<Time>,
    /// The first epoch's initial size; always present.
    pub initial_size: DemeSize,
    /// Present only when it differs from `initial_size`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub final_size: Option<DemeSize>,
    /// The second and later epochs; the first epoch's fields are
    /// inlined above.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub epochs: Vec<CompactEpoch>,
}

/// A non-first epoch of a [`CompactDeme`].
///
/// `initial_size` is omitted whenever it is inferable by continuity
/// from the previous epoch's `final_size`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactEpoch {
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<Time>,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initial_size: Option<DemeSize>,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub final_size: Option<DemeSize>,
}

/// One rate change of an ordered deme pair.
///
/// `start_time` is omitted when it equals the pair's coexistence
/// lower bound; a transition to rate zero is collapsed into the
/// prior entry's `end_time` (or omitted entirely when it coincides
/// with the coexistence upper bound).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactMigration {
    #[allow(missing_docs)]
    pub source: String,
    #[allow(missing_docs)]
    pub dest: String,
    #[allow(missing_docs)]
    pub rate: MigrationRate,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<Time>,
    #[allow(missing_docs)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_time: Option<Time>,
}

/// A pulse, emitted verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactPulse {
    #[allow(missing_docs)]
    pub source: String,
    #[allow(missing_docs)]
    pub dest: String,
    #[allow(missing_docs)]
    pub time: Time,
    #[allow(missing_docs)]
    pub proportion: Proportion,
}

// Serialize the deme list as an ordered mapping keyed by name.
mod deme_table {
    use super::CompactDeme;
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        demes: &[CompactDeme],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(demes.iter().map(|deme| (deme.name.as_str(), deme)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<CompactDeme>, D::Error> {
        struct DemeTableVisitor;

        impl<'de> Visitor<'de> for DemeTableVisitor {
            type Value = Vec<CompactDeme>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a mapping from deme name to deme fields")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut demes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, mut deme)) = access.next_entry::<String, CompactDeme>()? {
                    deme.name = name;
                    demes.push(deme);
                }
                Ok(demes)
            }
        }

        deserializer.deserialize_map(DemeTableVisitor)
    }
}

impl Graph {
    /// Produce the compact representation of the graph.
    ///
    /// # Errors
    ///
    /// [`DemographError::GraphError`] if the graph contains no demes,
    /// or if a deme has a finite end time that no ancestor forces:
    /// the compact form has no deme-level `end_time` field, so such a
    /// graph cannot be represented without losing the end time.
    pub fn to_compact(&self) -> Result<CompactGraph, DemographError> {
        if self.demes().is_empty() {
            return Err(DemographError::GraphError(
                "graph contains no demes".to_string(),
            ));
        }
        let mut demes = Vec::with_capacity(self.num_demes());
        for deme in self.demes() {
            demes.push(compact_deme(deme)?);
        }
        Ok(CompactGraph {
            description: self.description().to_owned(),
            time_units: self.time_units().clone(),
            generation_time: self.generation_time(),
            doi: self.doi().map(str::to_owned),
            default_ne: self.default_ne(),
            demes,
            migrations: self.compact_migrations()?,
            pulses: self
                .pulses()
                .iter()
                .map(|pulse| CompactPulse {
                    source: pulse.source().to_owned(),
                    dest: pulse.dest().to_owned(),
                    time: pulse.time(),
                    proportion: pulse.proportion(),
                })
                .collect(),
        })
    }

    // Walk each ordered pair's records in original order, emitting one
    // entry per rate change and folding rate-zero transitions into the
    // prior entry's end_time.
    fn compact_migrations(&self) -> Result<Vec<CompactMigration>, DemographError> {
        let mut groups: Vec<(&str, &str, Vec<&Migration>)> = vec![];
        for migration in self.migrations() {
            match groups
                .iter_mut()
                .find(|(source, dest, _)| *source == migration.source() && *dest == migration.dest())
            {
                Some((_, _, records)) => records.push(migration),
                None => groups.push((migration.source(), migration.dest(), vec![migration])),
            }
        }
        let mut entries = vec![];
        for (source, dest, records) in groups {
            let interval = self.time_intersection(source, dest)?;
            let mut index = 0;
            while index < records.len() {
                let record = records[index];
                index += 1;
                let mut entry = CompactMigration {
                    source: source.to_owned(),
                    dest: dest.to_owned(),
                    rate: record.rate(),
                    start_time: None,
                    end_time: None,
                };
                if record.time() != interval.start_time() {
                    entry.start_time = Some(record.time());
                }
                if index < records.len() && record.rate() != 0.0 && records[index].rate() == 0.0 {
                    if interval.end_time() != records[index].time() {
                        entry.end_time = Some(records[index].time());
                    }
                    index += 1;
                }
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

fn compact_deme(deme: &Deme) -> Result<CompactDeme, DemographError> {
    let epochs = deme.epochs();
    let first = epochs.first().ok_or_else(|| {
        DemographError::DemeError(format!("deme {} has no epochs", deme.name()))
    })?;
    // resolve() recovers an end time from an ancestor's start or
    // leaves it unbounded; anything else would be dropped silently
    if deme.ancestor().is_none() && !deme.end_time().is_unbounded() {
        return Err(DemographError::GraphError(format!(
            "deme {} ends at {} with no ancestor to recover the end time from; \
             the compact form cannot represent it",
            deme.name(),
            deme.end_time(),
        )));
    }
    let mut compact = CompactDeme {
        name: deme.name().to_owned(),
        ancestor: deme.ancestor().map(str::to_owned),
        start_time: (first.start_time() > 0.0).then(|| first.start_time()),
        initial_size: first.initial_size(),
        final_size: (first.final_size() != first.initial_size()).then(|| first.final_size()),
        epochs: vec![],
    };
    for (j, epoch) in epochs.iter().enumerate().skip(1) {
        let mut entry = CompactEpoch {
            start_time: (epoch.start_time() > 0.0).then(|| epoch.start_time()),
            ..Default::default()
        };
        if epoch.initial_size() == epoch.final_size() {
            entry.initial_size = Some(epoch.initial_size());
        } else {
            entry.final_size = Some(epoch.final_size());
            if j == epochs.len() - 1 || epoch.initial_size() != epochs[j - 1].final_size() {
                entry.initial_size = Some(epoch.initial_size());
            }
        }
        compact.epochs.push(entry);
    }
    Ok(compact)
}

impl CompactGraph {
    /// Expand back into a fully resolved [`Graph`] by replaying the
    /// defaulting rules through the builder API.
    ///
    /// # Errors
    ///
    /// Any error the builder methods can return; a compact graph that
    /// was produced by [`Graph::to_compact`] always resolves.
    pub fn resolve(&self) -> Result<Graph, DemographError> {
        let mut graph = Graph::new(
            &self.description,
            self.time_units.clone(),
            self.generation_time.into(),
        )?;
        if let Some(doi) = &self.doi {
            graph = graph.with_doi(doi);
        }
        if let Some(default_ne) = self.default_ne {
            graph = graph.with_default_ne(default_ne.into())?;
        }
        for deme in &self.demes {
            let history = DemeHistory {
                ancestor: deme.ancestor.clone(),
                start_time: deme.start_time.map(f64::from),
                initial_size: Some(deme.initial_size.into()),
                final_size: deme.final_size.map(f64::from),
                ..Default::default()
            };
            let epochs: Vec<EpochSpec> = deme
                .epochs
                .iter()
                .map(|epoch| EpochSpec {
                    start_time: epoch.start_time.map(f64::from),
                    initial_size: epoch.initial_size.map(f64::from),
                    final_size: epoch.final_size.map(f64::from),
                    ..Default::default()
                })
                .collect();
            graph.add_deme(&deme.name, history, &epochs)?;
        }
        for migration in &self.migrations {
            graph.add_migration(
                &migration.source,
                &migration.dest,
                migration.rate.into(),
                migration.start_time.map(f64::from),
                migration.end_time.map(f64::from),
            )?;
        }
        for pulse in &self.pulses {
            graph.add_pulse(
                &pulse.source,
                &pulse.dest,
                pulse.proportion.into(),
                pulse.time.into(),
            )?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_has_no_compact_form() {
        let graph = Graph::new("empty", TimeUnits::Generations, 1.0).unwrap();
        assert!(matches!(
            graph.to_compact(),
            Err(DemographError::GraphError(_))
        ));
    }

    #[test]
    fn first_epoch_fields_are_inlined() {
        let mut graph = Graph::new("one deme", TimeUnits::Generations, 1.0).unwrap();
        graph
            .add_deme(
                "A",
                DemeHistory {
                    initial_size: Some(100.0),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();
        let compact = graph.to_compact().unwrap();
        let deme = &compact.demes[0];
        assert_eq!(deme.name, "A");
        assert!(deme.start_time.is_none());
        assert_eq!(deme.initial_size, 100.0);
        assert!(deme.final_size.is_none());
        assert!(deme.epochs.is_empty());
    }

    #[test]
    fn continuity_omits_initial_size() {
        let mut graph = Graph::new("three epochs", TimeUnits::Generations, 1.0).unwrap();
        graph
            .add_deme(
                "A",
                DemeHistory {
                    initial_size: Some(100.0),
                    ..Default::default()
                },
                &[
                    EpochSpec {
                        start_time: Some(50.0),
                        initial_size: Some(100.0),
                        final_size: Some(400.0),
                        ..Default::default()
                    },
                    EpochSpec {
                        start_time: Some(100.0),
                        initial_size: Some(400.0),
                        ..Default::default()
                    },
                ],
            )
            .unwrap();
        let compact = graph.to_compact().unwrap();
        let epochs = &compact.demes[0].epochs;
        assert_eq!(epochs.len(), 2);
        // middle epoch: sizes differ, initial continues the previous
        // final, so only final_size appears
        assert_eq!(epochs[0].start_time.unwrap(), 50.0);
        assert!(epochs[0].initial_size.is_none());
        assert_eq!(epochs[0].final_size.unwrap(), 400.0);
        // terminal epoch: constant size emits only initial_size
        assert_eq!(epochs[1].initial_size.unwrap(), 400.0);
        assert!(epochs[1].final_size.is_none());
    }
}
