use demograph::DemeHistory;
use demograph::DemographError;
use demograph::Graph;
use demograph::IntervalClosure;
use demograph::TimeUnits;

// A: [0, Infinity), B: [10, 100), C: [50, 100)
fn three_demes() -> Graph {
    let mut graph = Graph::new("overlapping lifetimes", TimeUnits::Generations, 1.0)
        .unwrap()
        .with_default_ne(100.0)
        .unwrap();
    graph.add_deme("A", DemeHistory::default(), &[]).unwrap();
    graph
        .add_deme(
            "B",
            DemeHistory {
                start_time: Some(10.0),
                end_time: Some(100.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
        .add_deme(
            "C",
            DemeHistory {
                start_time: Some(50.0),
                end_time: Some(100.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
}

#[test]
fn time_intersection_bounds() {
    let graph = three_demes();
    let interval = graph.time_intersection("A", "B").unwrap();
    assert_eq!(interval.start_time(), 10.0);
    assert_eq!(
        interval.end_time(),
        demograph::EndTime::try_from(100.0).unwrap()
    );
    let interval = graph.time_intersection("B", "C").unwrap();
    assert_eq!(interval.start_time(), 50.0);
}

#[test]
fn check_time_intersection_is_half_open_by_default() {
    let graph = three_demes();
    assert!(graph
        .check_time_intersection("A", "B", Some(10.0), IntervalClosure::HalfOpen)
        .is_ok());
    assert!(graph
        .check_time_intersection("A", "B", Some(100.0), IntervalClosure::HalfOpen)
        .is_err());
    assert!(graph
        .check_time_intersection("A", "B", Some(100.0), IntervalClosure::Closed)
        .is_ok());
    assert!(graph
        .check_time_intersection("A", "B", Some(5.0), IntervalClosure::Closed)
        .is_err());
}

#[test]
fn check_time_intersection_names_the_interval() {
    let graph = three_demes();
    let err = graph
        .check_time_intersection("B", "C", Some(20.0), IntervalClosure::HalfOpen)
        .unwrap_err();
    let message = format!("{err}");
    assert!(message.contains("[50, 100)"));
    assert!(message.contains("20"));
}

#[test]
fn unknown_demes_are_referential_errors() {
    let mut graph = three_demes();
    assert!(matches!(
        graph.time_intersection("A", "missing"),
        Err(DemographError::GraphError(_))
    ));
    assert!(matches!(
        graph.add_migration("missing", "A", 1e-4, None, None),
        Err(DemographError::GraphError(_))
    ));
    assert!(matches!(
        graph.add_pulse("A", "missing", 0.1, 20.0),
        Err(DemographError::GraphError(_))
    ));
    assert!(graph.migrations().is_empty());
    assert!(graph.pulses().is_empty());
}

#[test]
fn migration_start_defaults_to_coexistence_lower_bound() {
    let mut graph = three_demes();
    graph.add_migration("A", "B", 1e-4, None, None).unwrap();
    assert_eq!(graph.migrations().len(), 1);
    assert_eq!(graph.migrations()[0].time(), 10.0);
}

#[test]
fn migration_end_time_appends_deactivation_record() {
    let mut graph = three_demes();
    graph
        .add_migration("A", "B", 1e-4, Some(20.0), Some(90.0))
        .unwrap();
    let records = graph.migrations();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].rate(), 1e-4);
    assert_eq!(records[0].time(), 20.0);
    assert_eq!(records[1].rate(), 0.0);
    assert_eq!(records[1].time(), 90.0);
}

#[test]
fn migration_outside_window_leaves_graph_unchanged() {
    let mut graph = three_demes();
    assert!(graph
        .add_migration("A", "B", 1e-4, Some(5.0), None)
        .is_err());
    // the start is valid but the end falls outside the window
    assert!(graph
        .add_migration("A", "B", 1e-4, Some(20.0), Some(100.0))
        .is_err());
    assert!(graph.migrations().is_empty());
}

#[test]
fn migration_between_demes_that_never_coexist_is_rejected() {
    let mut graph = Graph::new("disjoint lifetimes", TimeUnits::Generations, 1.0)
        .unwrap()
        .with_default_ne(100.0)
        .unwrap();
    graph
        .add_deme(
            "early",
            DemeHistory {
                end_time: Some(10.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
        .add_deme(
            "late",
            DemeHistory {
                start_time: Some(20.0),
                end_time: Some(30.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    // the defaulted start must not slip past the (empty) intersection
    assert!(matches!(
        graph.add_migration("early", "late", 1e-4, None, None),
        Err(DemographError::GraphError(_))
    ));
    assert!(graph.migrations().is_empty());
}

#[test]
fn self_migration_is_rejected() {
    let mut graph = three_demes();
    assert!(matches!(
        graph.add_migration("A", "A", 1e-4, None, None),
        Err(DemographError::MigrationError(_))
    ));
}

#[test]
fn symmetric_migration_is_atomic() {
    let mut graph = three_demes();
    // 120 is inside [0, Infinity) for A alone but outside every
    // pairwise window involving B or C
    assert!(graph
        .add_symmetric_migration(&["A", "B", "C"], 1e-5, Some(120.0), None)
        .is_err());
    assert!(graph.migrations().is_empty());
}

#[test]
fn pulse_at_the_moment_a_deme_ends_is_accepted() {
    let mut graph = three_demes();
    graph.add_pulse("B", "C", 0.2, 100.0).unwrap();
    assert_eq!(graph.pulses().len(), 1);
    // continuous migration at the same instant is not
    assert!(graph
        .add_migration("B", "C", 1e-4, Some(100.0), None)
        .is_err());
}

#[test]
fn pulse_between_ancestor_and_descendant_is_rejected() {
    let mut graph = Graph::new("a split", TimeUnits::Generations, 1.0)
        .unwrap()
        .with_default_ne(100.0)
        .unwrap();
    graph
        .add_deme(
            "A",
            DemeHistory {
                start_time: Some(200.0),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    graph
        .add_deme(
            "B",
            DemeHistory {
                ancestor: Some("A".to_string()),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    assert!(matches!(
        graph.add_pulse("A", "B", 0.3, 200.0),
        Err(DemographError::PulseError(_))
    ));
    assert!(matches!(
        graph.add_pulse("B", "A", 0.3, 200.0),
        Err(DemographError::PulseError(_))
    ));
    assert!(graph.pulses().is_empty());
}

#[test]
fn pulse_proportion_must_be_a_unit_interval_value() {
    let mut graph = three_demes();
    assert!(matches!(
        graph.add_pulse("B", "C", 1.5, 60.0),
        Err(DemographError::PulseError(_))
    ));
    assert!(matches!(
        graph.add_pulse("B", "C", -0.1, 60.0),
        Err(DemographError::PulseError(_))
    ));
    graph.add_pulse("B", "C", 1.0, 60.0).unwrap();
}
