//! End-to-end runs through the public driver.

use percolate::init::{self, Seeding};
use percolate::pbm::write_pbm;
use percolate::simulation::{self, RunSummary};
use percolate::{Cohort, HaloExchange, Partition, SimulationConfig, StopReason, Thresholds, Topology};

fn config(seed: u64, length: usize, workers: usize) -> SimulationConfig {
    SimulationConfig {
        length,
        workers,
        ..SimulationConfig::new(seed)
    }
}

fn run(cfg: &SimulationConfig) -> RunSummary {
    simulation::run(cfg).unwrap_or_else(|e| panic!("run {cfg:?} failed: {e}"))
}

// ========================================================================
// Scenario A: fully alive, one worker
// ========================================================================

#[test]
fn fully_alive_lattice_stays_alive() {
    let cfg = SimulationConfig {
        density: 1.0,
        max_steps: Some(1),
        ..config(1, 8, 1)
    };
    let summary = run(&cfg);
    assert_eq!(summary.initial_count, 64);
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.final_count, 64);
    assert_eq!(summary.stop, StopReason::MaxSteps);

    let mut image = Vec::new();
    write_pbm(&mut image, &summary.lattice).unwrap();
    let text = String::from_utf8(image).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("P1"));
    assert!(lines.next().unwrap().starts_with('#'));
    assert_eq!(lines.next(), Some("8 8"));
    let pixels: Vec<&str> = lines.flat_map(|l| l.split(' ')).collect();
    assert_eq!(pixels.len(), 64);
    assert!(pixels.iter().all(|&p| p == "0"));
}

// ========================================================================
// Scenario B: fully dead, two workers, no stripes
// ========================================================================

#[test]
fn empty_lattice_halos_stay_dead() {
    let topology = Topology::balanced(2).unwrap();
    assert_eq!((topology.rows(), topology.columns()), (2, 1));
    let partition = Partition::new(8, &topology).unwrap();
    let seeding = Seeding {
        length: 8,
        density: 0.0,
        seed: 5,
        open_boundary: false,
    };

    let tiles = Cohort::run(2, |world| {
        let (mut tile, initial) = init::initialize(world, &topology, &partition, &seeding)?;
        assert_eq!(initial, 0);
        HaloExchange::new(topology.neighbors(world.rank())).exchange(world, &mut tile)?;
        Ok(tile)
    })
    .unwrap();
    for tile in &tiles {
        assert!(tile.cells().iter().all(|&c| c == 0));
    }
}

#[test]
fn empty_lattice_runs_to_step_limit() {
    // 0 < 0 and 0 > 0 are both false: an empty lattice never crosses.
    assert!(!Thresholds::new(0).crossed(0));

    for max_steps in [1, 4] {
        let cfg = SimulationConfig {
            density: 0.0,
            open_boundary: false,
            max_steps: Some(max_steps),
            ..config(5, 8, 2)
        };
        let summary = run(&cfg);
        assert_eq!(summary.initial_count, 0);
        assert_eq!(summary.final_count, 0);
        assert_eq!(summary.steps, max_steps);
        assert_eq!(summary.stop, StopReason::MaxSteps);
    }
}

// ========================================================================
// Decomposition independence
// ========================================================================

#[test]
fn worker_count_does_not_change_the_result() {
    for length in [12, 13] {
        let base = SimulationConfig {
            max_steps: Some(30),
            ..config(2024, length, 1)
        };
        let reference = run(&base);
        for (workers, grid) in [(2, None), (4, None), (6, None), (3, Some((1, 3))), (6, Some((2, 3)))] {
            let cfg = SimulationConfig {
                workers,
                grid,
                ..base.clone()
            };
            let summary = run(&cfg);
            assert_eq!(summary.steps, reference.steps, "L={length} workers={workers} grid={grid:?}");
            assert_eq!(summary.stop, reference.stop);
            assert_eq!(summary.final_count, reference.final_count);
            assert_eq!(summary.lattice, reference.lattice, "L={length} workers={workers} grid={grid:?}");
        }
    }
}

#[test]
fn final_count_matches_collected_lattice() {
    let summary = run(&SimulationConfig {
        max_steps: Some(25),
        ..config(77, 20, 4)
    });
    assert_eq!(summary.lattice.live_count(), summary.final_count);
}

// ========================================================================
// Termination exactness
// ========================================================================

#[test]
fn stops_exactly_at_first_crossing() {
    for seed in 1..=6 {
        let cfg = SimulationConfig {
            max_steps: Some(200),
            ..config(seed, 16, 4)
        };
        let summary = run(&cfg);
        let band = Thresholds::new(summary.initial_count);
        match summary.stop {
            StopReason::MaxSteps => {
                assert_eq!(summary.steps, 200);
                assert!(!band.crossed(summary.final_count));
            }
            StopReason::ThresholdCrossed => {
                assert!(band.crossed(summary.final_count), "seed {seed}");
                if summary.steps > 1 {
                    // One step earlier the count was still inside the band.
                    let earlier = run(&SimulationConfig {
                        max_steps: Some(summary.steps - 1),
                        ..cfg.clone()
                    });
                    assert_eq!(earlier.stop, StopReason::MaxSteps, "seed {seed}");
                    assert!(!band.crossed(earlier.final_count), "seed {seed}");
                }
            }
        }
    }
}

// ========================================================================
// Configuration failures
// ========================================================================

#[test]
fn mismatched_grid_aborts_whole_run() {
    let cfg = SimulationConfig {
        grid: Some((2, 2)),
        ..config(1, 8, 3)
    };
    let err = simulation::run(&cfg).unwrap_err();
    assert_eq!(err.class(), percolate::ErrorClass::Configuration);
}

#[test]
fn more_blocks_than_cells_is_rejected() {
    let err = simulation::run(&config(1, 2, 9)).unwrap_err();
    assert_eq!(err.class(), percolate::ErrorClass::Configuration);
}

#[test]
fn image_file_is_written() {
    let path = std::env::temp_dir().join(format!("percolate-test-{}.pbm", std::process::id()));
    let cfg = SimulationConfig {
        max_steps: Some(3),
        output: Some(path.clone()),
        ..config(9, 10, 2)
    };
    run(&cfg);
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(text.starts_with("P1\n"));
    assert_eq!(text.lines().nth(2), Some("10 10"));
}
