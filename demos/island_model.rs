use anyhow::Result;

fn build_island_model() -> Result<demograph::Graph> {
    let mut graph = demograph::Graph::new(
        "an ancestral deme splits into three islands 500 generations ago",
        demograph::TimeUnits::Generations,
        1.0,
    )?
    .with_default_ne(1000.0)?;

    graph.add_deme(
        "ancestral",
        demograph::DemeHistory {
            start_time: Some(500.0),
            ..Default::default()
        },
        &[],
    )?;

    for island in ["alpha", "beta", "gamma"] {
        graph.add_deme(
            island,
            demograph::DemeHistory {
                ancestor: Some("ancestral".to_string()),
                ..Default::default()
            },
            &[],
        )?;
    }

    // symmetric migration among the islands while they coexist
    graph.add_symmetric_migration(&["alpha", "beta", "gamma"], 1e-4, None, None)?;

    // a pulse of ancestry from alpha into beta 250 generations ago
    graph.add_pulse("alpha", "beta", 0.05, 250.0)?;

    Ok(graph)
}

fn iterate_demes_and_epochs(graph: &demograph::Graph) {
    println!("Iterate over demes and their epochs:\n");
    // Get a &[demograph::Deme] (slice of demes)
    for deme in graph.demes() {
        println!("Deme {}:", deme.name());
        println!("\tancestor: {}", deme.ancestor().unwrap_or("None"));
        println!("\tstart_time: {}", deme.start_time());
        println!("\tend_time: {}", deme.end_time());

        // deme.epochs returns &[demograph::Epoch] (slice of epochs),
        // which we then enumerate over.
        for (i, epoch) in deme.epochs().iter().enumerate() {
            println!("\tepoch {i}:");
            println!("\t\tstart_time: {}", epoch.start_time());
            println!("\t\tend_time: {}", epoch.end_time());
            println!("\t\tinitial_size: {}", epoch.initial_size());
            println!("\t\tfinal_size: {}", epoch.final_size());
        }
    }
}

fn iterate_migrations_and_pulses(graph: &demograph::Graph) {
    println!("\nIterate over migration records:\n");
    // Enumerate the &[demograph::Migration]
    for (i, migration) in graph.migrations().iter().enumerate() {
        println!("migration {i}");
        println!("\tsource: {}", migration.source());
        println!("\tdest: {}", migration.dest());
        println!("\ttime: {}", migration.time());
        println!("\trate: {}", migration.rate());
    }
    for (i, pulse) in graph.pulses().iter().enumerate() {
        println!("pulse {i}");
        println!("\tsource: {}", pulse.source());
        println!("\tdest: {}", pulse.dest());
        println!("\ttime: {}", pulse.time());
        println!("\tproportion: {}", pulse.proportion());
    }
}

fn do_work() -> Result<()> {
    let graph = build_island_model()?;

    iterate_demes_and_epochs(&graph);

    iterate_migrations_and_pulses(&graph);

    // The compact representation omits everything the builder's
    // defaulting rules can recover, and expands back to an equal graph.
    let compact = graph.to_compact()?;
    println!(
        "\nThe compact form as a YAML string:\n\n{}",
        serde_yaml::to_string(&compact)?
    );
    assert_eq!(compact.resolve()?, graph);

    Ok(())
}

fn main() {
    do_work().unwrap();
}

#[test]
fn test_island_model() {
    do_work().unwrap();
}
