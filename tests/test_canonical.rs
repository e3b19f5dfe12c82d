use demograph::CompactGraph;
use demograph::DemeHistory;
use demograph::DemographError;
use demograph::EpochSpec;
use demograph::Graph;
use demograph::TimeUnits;

// Every deme end time is either unbounded or forced by an ancestor,
// so the compact form reconstructs the graph exactly.  Migration
// records are added one ordered pair at a time, matching the order
// the compacted entries replay in.
fn rich_graph() -> Graph {
    let mut graph = Graph::new(
        "an ancestral deme with a size change splits into two islands",
        TimeUnits::Years,
        25.0,
    )
    .unwrap()
    .with_doi("10.1000/example.doi")
    .with_default_ne(1000.0)
    .unwrap();
    graph
        .add_deme(
            "ancestral",
            DemeHistory {
                start_time: Some(500.0),
                ..Default::default()
            },
            &[EpochSpec {
                start_time: Some(1000.0),
                initial_size: Some(5000.0),
                ..Default::default()
            }],
        )
        .unwrap();
    graph
        .add_deme(
            "alpha",
            DemeHistory {
                ancestor: Some("ancestral".to_string()),
                initial_size: Some(100.0),
                final_size: Some(2000.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
        .add_deme(
            "beta",
            DemeHistory {
                ancestor: Some("ancestral".to_string()),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
        .add_migration("alpha", "beta", 1e-4, None, None)
        .unwrap();
    graph
        .add_migration("alpha", "beta", 5e-5, Some(100.0), Some(400.0))
        .unwrap();
    graph
        .add_migration("beta", "alpha", 1e-4, None, Some(450.0))
        .unwrap();
    graph.add_pulse("alpha", "beta", 0.1, 250.0).unwrap();
    graph
}

#[test]
fn round_trip_reconstructs_the_graph() {
    let graph = rich_graph();
    let compact = graph.to_compact().unwrap();
    assert_eq!(compact.resolve().unwrap(), graph);
}

#[test]
fn round_trip_through_yaml() {
    let graph = rich_graph();
    let yaml = serde_yaml::to_string(&graph.to_compact().unwrap()).unwrap();
    let compact: CompactGraph = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(compact.resolve().unwrap(), graph);
}

#[test]
fn demes_serialize_as_an_ordered_mapping() {
    let graph = rich_graph();
    let yaml = serde_yaml::to_string(&graph.to_compact().unwrap()).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let names: Vec<&str> = value["demes"]
        .as_mapping()
        .unwrap()
        .iter()
        .map(|(key, _)| key.as_str().unwrap())
        .collect();
    assert_eq!(names, ["ancestral", "alpha", "beta"]);
}

#[test]
fn omitted_fields_are_absent_from_the_serialized_form() {
    let graph = rich_graph();
    let yaml = serde_yaml::to_string(&graph.to_compact().unwrap()).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(value["default_Ne"], serde_yaml::Value::from(1000.0));
    assert_eq!(value["doi"].as_str().unwrap(), "10.1000/example.doi");
    // the islands start at the present
    assert!(value["demes"]["alpha"].get("start_time").is_none());
    assert!(value["demes"]["beta"].get("start_time").is_none());
    assert_eq!(
        value["demes"]["ancestral"]["start_time"],
        serde_yaml::Value::from(500.0)
    );
    // beta's size is constant, so only initial_size appears
    assert!(value["demes"]["beta"].get("final_size").is_none());
    assert_eq!(
        value["demes"]["alpha"]["final_size"],
        serde_yaml::Value::from(2000.0)
    );
    // ancestral's second epoch has a constant size
    let epoch = &value["demes"]["ancestral"]["epochs"][0];
    assert_eq!(epoch["start_time"], serde_yaml::Value::from(1000.0));
    assert_eq!(epoch["initial_size"], serde_yaml::Value::from(5000.0));
    assert!(epoch.get("final_size").is_none());
}

#[test]
fn migrations_compact_to_one_entry_per_rate_change() {
    let graph = rich_graph();
    let compact = graph.to_compact().unwrap();
    // five records collapse to three entries
    assert_eq!(graph.migrations().len(), 5);
    let entries = &compact.migrations;
    assert_eq!(entries.len(), 3);
    // starts at the coexistence lower bound, so start_time is omitted
    assert_eq!(entries[0].source, "alpha");
    assert_eq!(entries[0].dest, "beta");
    assert_eq!(entries[0].rate, 1e-4);
    assert!(entries[0].start_time.is_none());
    assert!(entries[0].end_time.is_none());
    // the deactivation record folds into the prior entry's end_time
    assert_eq!(entries[1].rate, 5e-5);
    assert_eq!(entries[1].start_time.unwrap(), 100.0);
    assert_eq!(entries[1].end_time.unwrap(), 400.0);
    assert_eq!(entries[2].source, "beta");
    assert_eq!(entries[2].dest, "alpha");
    assert!(entries[2].start_time.is_none());
    assert_eq!(entries[2].end_time.unwrap(), 450.0);
}

#[test]
fn migration_groups_follow_first_appearance_order() {
    let mut graph = Graph::new("two demes", TimeUnits::Generations, 1.0)
        .unwrap()
        .with_default_ne(100.0)
        .unwrap();
    graph.add_deme("A", DemeHistory::default(), &[]).unwrap();
    graph.add_deme("B", DemeHistory::default(), &[]).unwrap();
    graph.add_migration("A", "B", 1e-4, None, None).unwrap();
    graph
        .add_migration("B", "A", 2e-4, Some(10.0), None)
        .unwrap();
    // a bare rate-zero record is a later deactivation of A -> B
    graph.add_migration("A", "B", 0.0, Some(50.0), None).unwrap();
    let compact = graph.to_compact().unwrap();
    let entries = &compact.migrations;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source, "A");
    assert_eq!(entries[0].end_time.unwrap(), 50.0);
    assert_eq!(entries[1].source, "B");
    assert_eq!(entries[1].start_time.unwrap(), 10.0);
    assert!(entries[1].end_time.is_none());
}

#[test]
fn finite_end_time_without_ancestor_has_no_compact_form() {
    let mut graph = Graph::new("one bounded deme", TimeUnits::Generations, 1.0)
        .unwrap()
        .with_default_ne(100.0)
        .unwrap();
    graph
        .add_deme(
            "A",
            DemeHistory {
                end_time: Some(100.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    // nothing in the compact form records A's end time, so the
    // conversion must fail rather than reconstruct a different graph
    assert!(matches!(
        graph.to_compact(),
        Err(DemographError::GraphError(_))
    ));
}

#[test]
fn pulses_are_emitted_verbatim() {
    let graph = rich_graph();
    let compact = graph.to_compact().unwrap();
    assert_eq!(compact.pulses.len(), 1);
    assert_eq!(compact.pulses[0].source, "alpha");
    assert_eq!(compact.pulses[0].dest, "beta");
    assert_eq!(compact.pulses[0].time, 250.0);
    assert_eq!(compact.pulses[0].proportion, 0.1);
}

#[test]
fn hand_written_yaml_resolves() {
    let yaml = "
description: a split with migration between the descendants
time_units: generations
generation_time: 1.0
default_Ne: 100.0
demes:
  A:
    start_time: 300.0
    initial_size: 50.0
  B:
    ancestor: A
    initial_size: 100.0
  C:
    ancestor: A
    initial_size: 100.0
migrations:
  - source: B
    dest: C
    rate: 1.0e-4
pulses:
  - source: B
    dest: C
    time: 150.0
    proportion: 0.05
";
    let compact: CompactGraph = serde_yaml::from_str(yaml).unwrap();
    let graph = compact.resolve().unwrap();
    assert_eq!(graph.num_demes(), 3);
    assert_eq!(
        graph.get_deme("B").unwrap().end_time(),
        demograph::EndTime::try_from(300.0).unwrap()
    );
    // the migration start defaults to the coexistence lower bound
    assert_eq!(graph.migrations().len(), 1);
    assert_eq!(graph.migrations()[0].time(), 0.0);
    assert_eq!(graph.pulses().len(), 1);
    assert_eq!(graph.pulses()[0].proportion(), 0.05);
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = "
description: bad
time_units: generations
generation_time: 1.0
population_size: 100.0
demes:
  A:
    initial_size: 50.0
";
    assert!(serde_yaml::from_str::<CompactGraph>(yaml).is_err());
}
