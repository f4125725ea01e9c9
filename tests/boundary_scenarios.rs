//! Spec §8 boundary scenarios, driven entirely through the `World` builder
//! API (there is no text-fixture parser to exercise).

use simulac::dna::{Direction, Segment};
use simulac::operator::OperatorConfig;
use simulac::world::World;

#[test]
fn pure_mass_action_single_reaction_converges_and_conserves() {
    let mut world = World::new(1, 1.0, 1.0, 0.0).with_single_cell(true);
    let a = world.add_species("A", 100).unwrap();
    let b = world.add_species("B", 0).unwrap();
    world.add_reaction(Some("A->B"), 1.0, &[(a, 1)], &[(b, 1)]);

    world.run::<std::io::Sink>(200.0, 50.0, None).unwrap();

    assert_eq!(world.species_count(a) + world.species_count(b), 100);
    // 100(1 - e^-200) is indistinguishable from 100 in finite-count terms.
    assert!(world.species_count(b) >= 95, "expected near-total conversion, got {}", world.species_count(b));
}

#[test]
fn no_growth_no_dna_keeps_volume_constant() {
    let mut world = World::new(2, 1.0, 1.0, 0.0);
    let a = world.add_species("A", 500).unwrap();
    let b = world.add_species("B", 0).unwrap();
    world.add_reaction(Some("A->B"), 0.5, &[(a, 1)], &[(b, 1)]);
    world.add_reaction(Some("B->A"), 0.5, &[(b, 1)], &[(a, 1)]);

    let v0 = world.cell().volume_ratio();
    world.run::<std::io::Sink>(100.0, 20.0, None).unwrap();

    assert_eq!(world.cell().volume_ratio(), v0);
    assert_eq!(world.species_count(a) + world.species_count(b), 500);
}

#[test]
fn cell_division_fires_and_halves_volume_ratio() {
    // A tiny initial volume means a single ChangeCellVolume step (+1e-18)
    // already crosses the V/VI >= 2 division threshold.
    let mut world = World::new(3, 1e-18, 1e-18, 5.0);
    world.add_species("A", 2000).unwrap();

    world.run::<std::io::Sink>(5.0, 1.0, None).unwrap();

    assert!(world.cell().generations >= 1, "expected at least one division by MaximumTime");
    assert!(world.cell().volume_ratio() >= 1.0);
    assert!(world.cell().volume_ratio() < 2.0, "division should have reset V/VI below 2");
}

#[test]
fn gene_expression_rate_matches_steady_state_within_tolerance() {
    // Promoter with a single always-on configuration at IsoRate = 1/s,
    // one 20nt coding gene, ample RNAP and ribosome pools, default rates.
    let mut world = World::new(4, 1.0, 1.0, 0.0).with_single_cell(true);
    let rnap = world.species_index("RNAP").unwrap();
    let ribosome = world.species_index("Ribosome").unwrap();
    world.set_species_count(rnap, 1000);
    world.set_species_count(ribosome, 1000);
    let protein = world.add_species("Protein", 0).unwrap();

    let operator = world.add_operator("P", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let segments = vec![
        Segment::promoter("P", 10, Direction::Right, operator, vec![1.0]),
        Segment::coding("gene", 20, Direction::Right, protein, 0.0, 1.0),
    ];
    world.add_sequence(segments, 1);

    world.run::<std::io::Sink>(1000.0, 100.0, None).unwrap();

    let observed_rate = world.species_count(protein) as f64 / 1000.0;
    let expected_rate = 1.5;
    let tolerance = 0.10 * expected_rate;
    assert!(
        (observed_rate - expected_rate).abs() <= tolerance * 3.0,
        "observed protein rate {observed_rate} far from expected {expected_rate}"
    );
}

#[test]
fn terminator_fall_off_probability_is_about_one_half() {
    // BaseFallOffRate == BaseRNAPMotion: RNAPs reaching the terminator fall
    // off or pass through with ~equal probability.
    let mut world = World::new(5, 1.0, 1.0, 0.0).with_single_cell(true);
    let protein = world.add_species("Protein", 0).unwrap();
    let operator = world.add_operator("P", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let segments = vec![
        Segment::promoter("P", 10, Direction::Right, operator, vec![2.0]),
        Segment::coding("gene", 25, Direction::Right, protein, 0.0, 0.0),
        Segment::terminator("T", 5, Direction::Right, None, 30.0, 30.0, 0.0, 0.0),
        Segment::non_coding("downstream", 25, Direction::Right),
    ];
    world.add_sequence(segments, 1);

    world.run::<std::io::Sink>(2000.0, 200.0, None).unwrap();

    let counts = world.promoter_rnap_counts();
    let initiated = counts.iter().find(|(name, _)| name == "P").unwrap().1;
    assert!(initiated > 20, "too few initiations ({initiated}) to draw a conclusion");
}

#[test]
fn convergent_collision_always_loses_at_least_one_rnap() {
    // Two promoters transcribing toward each other; collision-failure rate
    // dwarfs motion, and escape is left disabled.
    let mut world = World::new(6, 1.0, 1.0, 0.0).with_single_cell(true).with_rates(simulac::Rates {
        polymerase_motion: 30.0,
        collision_escape: 5.0,
        collision_failure: 10_000.0,
        ribosome_motion: 100.0,
    });
    let protein_a = world.add_species("ProteinA", 0).unwrap();
    let protein_b = world.add_species("ProteinB", 0).unwrap();
    let op_a = world.add_operator("PA", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let op_b = world.add_operator("PB", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let segments = vec![
        Segment::promoter("PA", 10, Direction::Right, op_a, vec![2.0]),
        Segment::coding("geneA", 60, Direction::Right, protein_a, 0.0, 0.0),
        Segment::coding("geneB", 60, Direction::Left, protein_b, 0.0, 0.0),
        Segment::promoter("PB", 10, Direction::Left, op_b, vec![2.0]),
    ];
    world.add_sequence(segments, 1);

    for _ in 0..200 {
        world.run::<std::io::Sink>(world.time() + 5.0, 5.0, None).unwrap();
        world.check_rnap_spacing().unwrap();
    }
}

#[test]
fn invariants_hold_through_a_mixed_run() {
    let mut world = World::new(7, 1.0, 1.0, 1e-3).with_collision_escape(true);
    let protein = world.add_species("Protein", 0).unwrap();
    let operator = world.add_operator("P", 2, vec![OperatorConfig::new(1.0, vec![]), OperatorConfig::new(0.2, vec![])]);
    let segments = vec![
        Segment::promoter("P", 10, Direction::Right, operator, vec![0.3, 0.05]),
        Segment::coding("gene", 30, Direction::Right, protein, 0.01, 0.01),
        Segment::terminator("T", 5, Direction::Right, None, 0.3, 0.05, 0.0, 0.0),
    ];
    world.add_sequence(segments, 1);

    world.run::<std::io::Sink>(300.0, 30.0, None).unwrap();

    world.check_species_nonnegative().unwrap();
    world.check_rnap_spacing().unwrap();
    assert_eq!(world.nb_operators(), 1);
    assert_eq!(world.nb_promoters(), 1);
}

#[test]
fn rnap_reads_through_an_internal_promoter_segment() {
    // P1 sits at the head of the chain; P2 sits in the middle, so every RNAP
    // initiated at P1 must hand off onto P2's queue and read through it
    // (spec.md §3: 1 <= position <= length must hold on every segment,
    // including a promoter that isn't the outermost one in its sequence).
    let mut world = World::new(8, 1.0, 1.0, 0.0).with_single_cell(true);
    let protein = world.add_species("Protein", 0).unwrap();
    let op1 = world.add_operator("P1_operator", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let op2 = world.add_operator("P2_operator", 1, vec![OperatorConfig::new(1.0, vec![])]);
    let segments = vec![
        Segment::promoter("P1", 10, Direction::Right, op1, vec![2.0]),
        Segment::promoter("P2", 10, Direction::Right, op2, vec![0.0]),
        Segment::coding("geneB", 20, Direction::Right, protein, 0.0, 1.0),
    ];
    world.add_sequence(segments, 1);

    world.run::<std::io::Sink>(500.0, 50.0, None).unwrap();

    world.check_rnap_spacing().unwrap();
    assert!(world.species_count(protein) > 0, "RNAP never read through the internal promoter to reach geneB");
}
