//! Command-line driver (spec §6), grounded on `Main.c`'s argument handling
//! and trace output, restructured around `clap` and a handful of built-in
//! demo scenarios in place of the original's model text-file parser (out of
//! scope; see `SPEC_FULL.md` §4.10).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use simulac::dna::Direction;
use simulac::operator::OperatorConfig;
use simulac::trace::TraceWriter;
use simulac::world::World;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// A <-> B mass-action conversion at fixed volume.
    MassAction,
    /// A single promoter driving a short gene through to a ribosome-bound
    /// protein product, inside a growing/dividing cell.
    Gene,
    /// Two promoters transcribing toward each other on a shared sequence,
    /// forcing RNAP-RNAP collisions.
    Convergent,
}

#[derive(Debug, Parser)]
#[command(name = "simulac", about = "Stochastic simulator for gene-regulatory networks")]
struct Cli {
    /// Which built-in demo scenario to run.
    #[arg(value_enum)]
    scenario: Scenario,

    /// PRNG seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulated end time, in seconds.
    #[arg(long, default_value_t = 1000.0)]
    max_time: f64,

    /// Trace row interval, in seconds.
    #[arg(long, default_value_t = 10.0)]
    print_interval: f64,

    /// Write the trace to this file instead of stdout.
    #[arg(long)]
    output_file: Option<String>,

    /// Disable division entirely, for runs that want pure reaction-network
    /// dynamics at a fixed volume.
    #[arg(long, default_value_t = false)]
    single_cell: bool,

    /// Scales the scenario's initial/reference volume.
    #[arg(long, default_value_t = 1.0)]
    volume_multiplier: f64,

    /// Scales the scenario's deterministic growth rate.
    #[arg(long, default_value_t = 1.0)]
    growth_multiplier: f64,

    /// Allow a convergently-transcribing RNAP to escape a collision instead
    /// of always falling off (spec §9 open question 3).
    #[arg(long, default_value_t = false)]
    collision_escape: bool,

    /// Force the header row on, overriding an earlier `--no-header`.
    #[allow(dead_code)]
    #[arg(long, action = clap::ArgAction::SetTrue)]
    header: bool,

    /// Suppress the trace's header row.
    #[arg(long, action = clap::ArgAction::SetTrue, overrides_with = "header")]
    no_header: bool,

    /// Increase log verbosity (`-v` = info, `-vv` = debug); overridden by
    /// `RUST_LOG` when set.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_mass_action(cli: &Cli) -> World {
    let mut world = World::new(cli.seed, cli.volume_multiplier, cli.volume_multiplier, 0.0)
        .with_single_cell(true);
    let a = world.add_species("A", 10_000).unwrap();
    let b = world.add_species("B", 0).unwrap();
    world.add_reaction(Some("forward"), 0.1, &[(a, 1)], &[(b, 1)]);
    world.add_reaction(Some("reverse"), 0.05, &[(b, 1)], &[(a, 1)]);
    world
}

fn build_gene(cli: &Cli) -> World {
    let mut world = World::new(
        cli.seed,
        cli.volume_multiplier,
        cli.volume_multiplier,
        1e-4 * cli.growth_multiplier,
    )
    .with_single_cell(cli.single_cell)
    .with_collision_escape(cli.collision_escape);
    let protein = world.add_species("Protein", 0).unwrap();

    let operator = world.add_operator(
        "P1_operator",
        1,
        vec![OperatorConfig::new(1.0, vec![])],
    );

    let segments = vec![
        simulac::dna::Segment::promoter("P1", 10, Direction::Right, operator, vec![0.05]),
        simulac::dna::Segment::coding("geneA", 30, Direction::Right, protein, 0.002, 0.002),
        simulac::dna::Segment::terminator("T1", 5, Direction::Right, None, 0.5, 0.05, 0.0, 0.0),
    ];
    world.add_sequence(segments, 1);
    world
}

fn build_convergent(cli: &Cli) -> World {
    let mut world = World::new(cli.seed, cli.volume_multiplier, cli.volume_multiplier, 0.0)
        .with_single_cell(true)
        .with_collision_escape(cli.collision_escape);
    let protein_a = world.add_species("ProteinA", 0).unwrap();
    let protein_b = world.add_species("ProteinB", 0).unwrap();

    let op_a = world.add_operator("PA_operator", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let op_b = world.add_operator("PB_operator", 1, vec![OperatorConfig::new(1.0, vec![])]);

    let segments = vec![
        simulac::dna::Segment::promoter("PA", 10, Direction::Right, op_a, vec![0.05]),
        simulac::dna::Segment::coding("geneA", 40, Direction::Right, protein_a, 0.002, 0.002),
        simulac::dna::Segment::non_coding("spacer", 20, Direction::Right),
        simulac::dna::Segment::coding("geneB", 40, Direction::Left, protein_b, 0.002, 0.002),
        simulac::dna::Segment::promoter("PB", 10, Direction::Left, op_b, vec![0.05]),
    ];
    world.add_sequence(segments, 1);
    world
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.init();
}

fn run() -> Result<(), simulac::SimError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut world = match cli.scenario {
        Scenario::MassAction => build_mass_action(&cli),
        Scenario::Gene => build_gene(&cli),
        Scenario::Convergent => build_convergent(&cli),
    };

    let mut trace_file;
    let mut stdout;
    let trace_writer: &mut dyn Write = match &cli.output_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| simulac::SimError::Engine(format!("cannot create '{path}': {e}")))?;
            trace_file = BufWriter::new(file);
            &mut trace_file
        }
        None => {
            stdout = io::stdout();
            &mut stdout
        }
    };

    let mut trace = TraceWriter::new(trace_writer);
    if cli.no_header {
        trace = trace.suppress_header();
    }
    world.run(cli.max_time, cli.print_interval, Some(&mut trace))
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
