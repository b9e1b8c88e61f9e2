use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use model::cli::{parse_args, Overrides};
use model::config::Config;
use model::scoring;

mod minimal_logger;

fn main() -> Result<()> {
    let mut config_path = PathBuf::from("expansion.json");
    let mut o = Overrides::default();
    {
        let parser = parse_args(&mut config_path, &mut o);
        parser.parse_args_or_exit();
    }
    minimal_logger::init(o.log_level());

    let mut config = Config::from_json_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    o.apply(&mut config)?;
    let max_steps = o.steps.unwrap_or_else(|| config.max_steps());

    let mut simulation = model::initialization(&config).context("Failed to set up the simulation")?;
    info!("Starting…");
    let end = simulation.run(max_steps, &config.observation);
    info!(
        "{:?} after {} steps with {} settled cells",
        end,
        simulation.steps(),
        simulation.settled().len()
    );

    if config.output.write {
        let path = &config.output.arrival_times;
        simulation
            .grid()
            .write_arrival_times(path)
            .context("Failed to write the arrival times")?;
        info!("Arrival times written to {}", path.display());
    }

    match &config.control_points {
        Some(path) => {
            let points = scoring::load_control_points(path);
            let score = scoring::score(simulation.grid(), &points, config.metric);
            score.log_report();
            match score.value() {
                Some(value) => println!("{}", value),
                None => warn!("No control points to score against"),
            }
        }
        None => info!("No control points configured, not scoring"),
    }
    Ok(())
}
