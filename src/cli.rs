use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use argparse::action::Action::Single;
use argparse::action::ParseResult;
use argparse::action::ParseResult::{Error, Parsed};
use argparse::action::TypedAction;
use argparse::action::{Action, IArgAction};
use log::LevelFilter;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::ConfigError;
use crate::parameters::{DispersalRule, Seed};
use crate::scoring::Metric;

/// Parse an option value as the snake_case name of a configuration enum,
/// the same spelling the JSON configuration uses.
pub struct StoreVariantAction<'a, T> {
    pub cell: Rc<RefCell<&'a mut Option<T>>>,
}

impl<'a, T: DeserializeOwned> IArgAction for StoreVariantAction<'a, T> {
    fn parse_arg(&self, arg: &str) -> ParseResult {
        match serde_json::from_value::<T>(serde_json::Value::String(arg.to_string())) {
            Ok(x) => {
                **self.cell.borrow_mut() = Some(x);
                Parsed
            }
            Err(_) => Error(format!("Bad value {}", arg)),
        }
    }
}

pub struct StoreVariant;

impl<T: DeserializeOwned + 'static> TypedAction<Option<T>> for StoreVariant {
    fn bind<'x>(&self, cell: Rc<RefCell<&'x mut Option<T>>>) -> Action<'x> {
        Single(Box::new(StoreVariantAction { cell }))
    }
}

/// Command line settings that take precedence over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub steps: Option<u32>,
    pub seed: Option<u64>,
    pub random_seed: bool,
    pub growth_rate: Option<f64>,
    pub capacity: Option<f64>,
    pub leap_distance: Option<u32>,
    pub dispersal: Option<DispersalRule>,
    pub metric: Option<Metric>,
    pub log_every: Option<u32>,
    pub snapshot_every: Option<u32>,
    pub output: Option<PathBuf>,
    pub no_output: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        let p = &mut config.parameters;
        if let Some(seed) = self.seed {
            p.seed = Seed::Fixed(seed);
        }
        if self.random_seed {
            p.seed = Seed::FromClock;
        }
        if let Some(r) = self.growth_rate {
            p.growth_rate = r;
        }
        if let Some(k) = self.capacity {
            p.capacity = k;
        }
        if let Some(d) = self.leap_distance {
            p.leap_distance = d;
        }
        if let Some(rule) = self.dispersal {
            p.dispersal = rule;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(every) = self.log_every {
            config.observation.log_every = every;
        }
        if let Some(every) = self.snapshot_every {
            config.observation.snapshot_every = every;
        }
        if let Some(path) = &self.output {
            config.output.arrival_times = path.clone();
            config.output.write = true;
        }
        if self.no_output {
            config.output.write = false;
        }
        config.parameters.validate()
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Warn
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

pub fn parse_args<'a>(
    config_path: &'a mut PathBuf,
    o: &'a mut Overrides,
) -> argparse::ArgumentParser<'a> {
    let mut parser = argparse::ArgumentParser::new();
    parser.set_description("Simulate the expansion of a population across a raster landscape");
    parser.refer(config_path).add_argument(
        "config",
        argparse::Store,
        "JSON file with parameters, layers and outputs of the run",
    );
    parser.refer(&mut o.steps).add_option(
        &["--steps"],
        argparse::StoreOption,
        "number of years to simulate at most (default: from start to stop year)",
    );
    parser.refer(&mut o.seed).add_option(
        &["--seed"],
        argparse::StoreOption,
        "seed for the random number generator",
    );
    parser.refer(&mut o.random_seed).add_option(
        &["--random-seed"],
        argparse::StoreTrue,
        "seed the random number generator from the clock",
    );
    parser.refer(&mut o.growth_rate).add_option(
        &["--growth-rate"],
        argparse::StoreOption,
        "annual population growth rate",
    );
    parser.refer(&mut o.capacity).add_option(
        &["--capacity"],
        argparse::StoreOption,
        "carrying capacity, in persons per cell",
    );
    parser.refer(&mut o.leap_distance).add_option(
        &["--leap-distance"],
        argparse::StoreOption,
        "leapfrogging distance in cells, 0 to disable",
    );
    parser.refer(&mut o.dispersal).add_option(
        &["--dispersal"],
        StoreVariant,
        "dispersal rule: even_split, random_pick or best_suitability",
    );
    parser.refer(&mut o.metric).add_option(
        &["--metric"],
        StoreVariant,
        "score metric: rmse or mean_absolute",
    );
    parser.refer(&mut o.log_every).add_option(
        &["--log-every"],
        argparse::StoreOption,
        "period of progress logging, in years",
    );
    parser.refer(&mut o.snapshot_every).add_option(
        &["--snapshot-every"],
        argparse::StoreOption,
        "period of occupancy snapshots, in years",
    );
    parser.refer(&mut o.output).add_option(
        &["--output"],
        argparse::StoreOption,
        "file to write the arrival times to",
    );
    parser.refer(&mut o.no_output).add_option(
        &["--no-output"],
        argparse::StoreTrue,
        "do not write the arrival times",
    );
    parser.refer(&mut o.verbose).add_option(
        &["-v", "--verbose"],
        argparse::StoreTrue,
        "log every settled cell",
    );
    parser.refer(&mut o.quiet).add_option(
        &["-q", "--quiet"],
        argparse::StoreTrue,
        "log warnings only",
    );
    parser
}
