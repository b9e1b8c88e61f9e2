use itertools::iproduct;

use crate::error::SetupError;
use crate::geometry::{Cell, GridGeometry};
use crate::grid::Grid;
use crate::layer::Layer;
use crate::neighborhood::Neighborhood;
use crate::parameters::*;
use crate::scoring::{score, ControlPoint, Metric};
use crate::simulation::{Simulation, Termination};
use crate::snapshots::SnapshotSeries;
use crate::*;

fn synthetic_parameters(size: usize) -> Parameters {
    let centre = (size / 2) as f64;
    Parameters {
        start_year: 1000,
        stop_year: 1,
        clock: Clock::Backward,
        // Cell centres lie on whole coordinates, rows counting down from `size`.
        origin: (centre, size as f64 - centre),
        initial_fraction: 1.0,
        capacity: 100.,
        growth_rate: 0.5,
        fission_threshold: FissionThreshold::Absolute(80.),
        emigration: Emigration::Excess,
        dispersal: DispersalRule::EvenSplit,
        leap_distance: 0,
        leap_ring: LeapRing::Exact,
        vegetation_threshold: 0.5,
        suitability_threshold: 0.1,
        elevation: ElevationBand {
            minimum: 0.,
            maximum: 1000.,
        },
        refresh_every: 0,
        saturation_cap: 1_000_000,
        seed: Seed::Fixed(12),
    }
}

fn synthetic_grid<F: Fn(Cell) -> f64>(p: &Parameters, size: usize, vegetation: F) -> Grid {
    let g = GridGeometry {
        columns: size,
        rows: size,
        origin_x: 0.,
        origin_y: size as f64,
        cell_size: 1.,
    };
    let vegetation: Vec<f64> = (0..g.cells()).map(|i| vegetation(g.cell_at(i))).collect();
    Grid::new(
        g,
        Layer::filled(&g, 100.),
        p.habitat(),
        Neighborhood::new(p.leap_distance, p.leap_ring),
    )
    .with_vegetation(
        Layer::from_values(&g, vegetation).unwrap(),
        SnapshotSeries::empty(),
    )
}

fn start(p: Parameters, size: usize, vegetation: impl Fn(Cell) -> f64) -> Simulation {
    let grid = synthetic_grid(&p, size, vegetation);
    Simulation::initialize(p, grid).unwrap()
}

fn total(s: &Simulation) -> f64 {
    s.grid().populations().values().iter().sum()
}

#[test]
pub fn test_growth_and_dispersal_scenario() {
    let mut s = start(synthetic_parameters(5), 5, |_| 1.0);
    let origin = Cell::new(2, 2);
    assert_eq!(s.grid().population(origin), 100.);

    s.grow();
    assert_eq!(s.grid().population(origin), 100.);

    s.disperse();
    assert_eq!(s.grid().population(origin), 80.);
    let neighbours: Vec<f64> = s.settled()[1..]
        .iter()
        .map(|&c| s.grid().population(c))
        .collect();
    assert_eq!(neighbours, vec![3., 3., 3., 3., 2., 2., 2., 2.]);
    for &c in &s.settled()[1..] {
        assert_eq!(s.grid().arrival_time(c), 1000);
        assert!((c.column - 2).abs() <= 1 && (c.row - 2).abs() <= 1);
    }
    assert_eq!(total(&s), 100.);
}

#[test]
pub fn test_leap_fallback() {
    let p = Parameters {
        leap_distance: 2,
        ..synthetic_parameters(5)
    };
    let blocked = |c: Cell| {
        let ring = (c.column - 2).abs().max((c.row - 2).abs());
        if ring == 1 {
            0.
        } else {
            1.
        }
    };
    let mut s = start(p, 5, blocked);
    s.step();
    let origin = Cell::new(2, 2);
    assert_eq!(s.grid().population(origin), 80.);
    assert!(s.settled().len() > 1);
    for &c in &s.settled()[1..] {
        let d = f64::from(c.column - 2).hypot(f64::from(c.row - 2)).round();
        assert_eq!(d, 2.);
    }
}

#[test]
pub fn test_blocked_cells_are_clamped_to_capacity() {
    let p = Parameters {
        growth_rate: 0.3,
        ..synthetic_parameters(5)
    };
    let island = |c: Cell| if c == Cell::new(2, 2) { 1. } else { 0. };
    let mut s = start(p, 5, island);
    let end = s.run(10, &observation::Settings::default());
    assert_eq!(end, Termination::StepsExhausted);
    assert_eq!(s.settled(), &[Cell::new(2, 2)]);
    assert_eq!(s.grid().population(Cell::new(2, 2)), 100.);
}

#[test]
pub fn test_unreached_control_point() {
    // A barren column splits the grid in two.
    let p = synthetic_parameters(9);
    let mut s = start(p, 9, |c| if c.column == 6 { 0. } else { 1. });
    s.run(30, &observation::Settings::default());

    let g = *s.grid().geometry();
    let (x, y) = g.to_projected(Cell::new(8, 4));
    let beyond = ControlPoint {
        name: "beyond".to_string(),
        x,
        y,
        date: 950.,
    };
    let result = score(s.grid(), &[beyond], Metric::MeanAbsolute);
    assert_eq!(result.unreached(), 1);
    assert_eq!(result.value(), Some(950.));

    let (x, y) = g.to_projected(Cell::new(4, 4));
    let origin = ControlPoint {
        name: "origin".to_string(),
        x,
        y,
        date: 950.,
    };
    let result = score(s.grid(), &[origin], Metric::Rmse);
    assert_eq!(result.value(), Some(50.));
}

#[test]
pub fn test_settlement_invariants_over_a_run() {
    for rule in &[
        DispersalRule::EvenSplit,
        DispersalRule::RandomPick,
        DispersalRule::BestSuitability,
    ] {
        let p = Parameters {
            dispersal: *rule,
            growth_rate: 0.2,
            fission_threshold: FissionThreshold::FractionOfCapacity(0.6),
            emigration: Emigration::Share(0.4),
            leap_distance: 3,
            leap_ring: LeapRing::Within,
            ..synthetic_parameters(15)
        };
        let patchy = |c: Cell| if (c.column * 7 + c.row * 3) % 5 == 0 { 0.2 } else { 0.9 };
        let mut s = start(p, 15, patchy);
        let mut arrivals = s.grid().arrival_times().clone();
        let mut settled = s.settled().len();
        for _ in 0..40 {
            let mut grown = s.clone();
            grown.grow();
            for &c in grown.settled() {
                assert!(grown.grid().population(c) <= 100.);
            }
            s.step();

            assert!(s.settled().len() >= settled);
            settled = s.settled().len();
            let mut unique = s.settled().to_vec();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), settled, "no cell is settled twice");

            for (old, new) in arrivals
                .values()
                .iter()
                .zip(s.grid().arrival_times().values())
            {
                assert!(*old == 0 || old == new, "arrival times never change");
            }
            arrivals = s.grid().arrival_times().clone();
        }
        for &c in s.settled() {
            assert_ne!(s.grid().arrival_time(c), 0);
        }
    }
}

#[test]
pub fn test_dispersal_conserves_people() {
    let p = Parameters {
        growth_rate: 0.2,
        fission_threshold: FissionThreshold::FractionOfCapacity(0.6),
        emigration: Emigration::Share(0.4),
        ..synthetic_parameters(31)
    };
    let mut s = start(p, 31, |_| 1.0);
    for _ in 0..6 {
        s.grow();
        let before = total(&s);
        s.disperse();
        assert_eq!(total(&s), before);
        s.step();
    }
}

#[test]
pub fn test_fixed_seed_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let run = |name: &str| {
        let p = Parameters {
            dispersal: DispersalRule::RandomPick,
            emigration: Emigration::Share(0.5),
            fission_threshold: FissionThreshold::FractionOfCapacity(0.5),
            leap_distance: 2,
            ..synthetic_parameters(21)
        };
        let mut s = start(p, 21, |c| if c.row % 4 == 0 { 0.3 } else { 1. });
        s.run(25, &observation::Settings::default());
        let path = dir.path().join(name);
        s.grid().write_arrival_times(&path).unwrap();
        std::fs::read(path).unwrap()
    };
    assert_eq!(run("a.asc"), run("b.asc"));
}

#[test]
pub fn test_occupancy_snapshots_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let o = observation::Settings {
        log_every: 0,
        snapshot_every: 2,
        snapshot_stem: Some(dir.path().join("occupied")),
    };
    let mut s = start(synthetic_parameters(5), 5, |_| 1.0);
    s.run(4, &o);
    assert!(dir.path().join("occupied_998.asc").exists());
    assert!(dir.path().join("occupied_996.asc").exists());
    assert!(!dir.path().join("occupied_997.asc").exists());
    let snapshot = ascii_grid::read_raster(&dir.path().join("occupied_996.asc")).unwrap();
    assert!(snapshot.values.iter().all(|&v| v == 0. || v == 1.));
    assert_eq!(snapshot.values[12], 1.);
}

#[test]
pub fn test_initialization_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let g = GridGeometry {
        columns: 5,
        rows: 5,
        origin_x: 0.,
        origin_y: 5.,
        cell_size: 1.,
    };
    ascii_grid::write_raster(&dir.path().join("ele.asc"), &g.header(-9999.), &[50.; 25]).unwrap();
    std::fs::create_dir(dir.path().join("veg")).unwrap();
    ascii_grid::write_raster(&dir.path().join("veg").join("veg1000.asc"), &g.header(-9999.), &[0.8; 25])
        .unwrap();

    let json = serde_json::json!({
        "parameters": serde_json::to_value(synthetic_parameters(5)).unwrap(),
        "layers": {
            "elevation": dir.path().join("ele.asc"),
            "vegetation": { "directory": dir.path().join("veg"), "prefix": "veg" }
        },
        "output": { "write": false, "arrival_times": dir.path().join("out.asc") }
    });
    let config = config::Config::from_json(&json.to_string()).unwrap();
    let mut s = initialization(&config).unwrap();
    assert_eq!(s.grid().vegetation(Cell::new(0, 0)), 0.8);
    s.step();
    assert_eq!(s.settled().len(), 9);
}

#[test]
pub fn test_full_cells_split_at_capacity_threshold() {
    let p = Parameters {
        fission_threshold: FissionThreshold::Capacity,
        emigration: Emigration::Share(0.4),
        ..synthetic_parameters(5)
    };
    let mut s = start(p.clone(), 5, |_| 1.0);
    s.step();
    assert_eq!(s.grid().population(Cell::new(2, 2)), 60.);
    assert_eq!(s.settled().len(), 9);
    s.run(50, &observation::Settings::default());
    assert_eq!(s.settled().len(), 25);

    // A full cell never exceeds the whole capacity.
    let p = Parameters {
        fission_threshold: FissionThreshold::FractionOfCapacity(1.0),
        ..p
    };
    let grid = synthetic_grid(&p, 5, |_| 1.0);
    assert!(matches!(
        Simulation::initialize(p, grid),
        Err(SetupError::Config(_))
    ));
}

#[test]
pub fn test_fractional_capacity_fills_with_whole_persons() {
    let p = Parameters {
        capacity: 100.5,
        leap_distance: 2,
        ..synthetic_parameters(5)
    };
    let mut grid = synthetic_grid(&p, 5, |_| 1.0);
    let ring: Vec<Cell> = iproduct!(1..4, 1..4)
        .map(|(column, row)| Cell::new(column, row))
        .filter(|&c| c != Cell::new(2, 2))
        .collect();
    for &c in &ring {
        grid.set_population(c, 100.);
    }
    let mut s = Simulation::initialize(p, grid).unwrap();
    assert_eq!(s.grid().population(Cell::new(2, 2)), 100.);
    s.step();

    assert_eq!(s.grid().population(Cell::new(2, 2)), 80.);
    assert!(s.settled().len() > 1);
    for &c in &s.settled()[1..] {
        let d = f64::from(c.column - 2).hypot(f64::from(c.row - 2)).round();
        assert_eq!(d, 2.);
    }
    for &c in &ring {
        assert_eq!(s.grid().population(c), 100.);
        assert_eq!(s.grid().arrival_time(c), 0);
    }
}

#[test]
pub fn test_vegetation_changes_after_dispersal_in_refresh_years() {
    let dir = tempfile::tempdir().unwrap();
    let p = Parameters {
        start_year: 909,
        initial_fraction: 0.01,
        fission_threshold: FissionThreshold::Absolute(90.),
        refresh_every: 100,
        ..synthetic_parameters(5)
    };
    let grid = synthetic_grid(&p, 5, |_| 0.);
    let g = *grid.geometry();
    let green = dir.path().join("veg1000.asc");
    let dry = dir.path().join("veg810.asc");
    ascii_grid::write_raster(&green, &g.header(-9999.), &[1.0; 25]).unwrap();
    ascii_grid::write_raster(&dry, &g.header(-9999.), &[0.2; 25]).unwrap();
    let grid = grid.with_vegetation(
        Layer::filled(&g, 0.),
        SnapshotSeries::from_slices(vec![(1000, green), (810, dry)]),
    );

    // 909 is closer to 1000 than to 810.
    let mut s = Simulation::initialize(p, grid).unwrap();
    assert_eq!(s.grid().vegetation(Cell::new(0, 0)), 1.0);
    assert_eq!(s.grid().population(Cell::new(2, 2)), 1.);

    // 1, 2, 3, 5, 8, 12, 18, 27, 41, 62: no year before 900 is a refresh year
    for _ in 0..9 {
        s.step();
    }
    assert_eq!(s.year(), 900);
    assert_eq!(s.grid().vegetation(Cell::new(0, 0)), 1.0);
    assert_eq!(s.settled().len(), 1);

    // 93 persons in 900: the neighbours are settled on the old vegetation,
    // then 900 switches to the slice of 810.
    s.step();
    assert_eq!(s.year(), 899);
    assert_eq!(s.settled().len(), 4);
    for &c in &s.settled()[1..] {
        assert_eq!(s.grid().arrival_time(c), 900);
    }
    assert_eq!(s.grid().vegetation(Cell::new(0, 0)), 0.2);

    s.step();
    assert_eq!(s.settled().len(), 4);
    assert_eq!(s.grid().population(Cell::new(2, 2)), 100.);
}

#[test]
pub fn test_clock_seed_is_reported_for_replay() {
    let p = Parameters {
        dispersal: DispersalRule::RandomPick,
        emigration: Emigration::Share(0.5),
        fission_threshold: FissionThreshold::FractionOfCapacity(0.5),
        leap_distance: 2,
        seed: Seed::FromClock,
        ..synthetic_parameters(21)
    };
    let patchy = |c: Cell| if c.row % 4 == 0 { 0.3 } else { 1. };
    let mut first = start(p.clone(), 21, patchy);
    let mut replay = start(
        Parameters {
            seed: Seed::Fixed(first.seed()),
            ..p
        },
        21,
        patchy,
    );
    assert_eq!(replay.seed(), first.seed());
    first.run(15, &observation::Settings::default());
    replay.run(15, &observation::Settings::default());
    assert!(first.settled().len() > 1);
    assert_eq!(first.settled(), replay.settled());
    assert_eq!(
        first.grid().arrival_times().values(),
        replay.grid().arrival_times().values()
    );
}
