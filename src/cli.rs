mod simulate;
mod steady_state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::{simulate::SimulateArgs, steady_state::SteadyStateArgs};
use crate::{
    core::simulation::DEFAULT_HORIZON,
    prelude::*,
    quantity::temperature::Kelvin,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Simulate the battery fade of the whole fleet over the horizon.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Distribute the cohorts over ages, assuming replacement at the end of life.
    #[clap(name = "steady-state")]
    SteadyState(Box<SteadyStateArgs>),
}

#[must_use]
#[derive(Parser)]
pub struct ScenarioArgs {
    /// Scenario file: `.toml` or JSON.
    #[clap(long = "scenario", env = "SCENARIO_PATH")]
    pub path: PathBuf,
}

impl ScenarioArgs {
    pub fn read(&self) -> Result<Scenario> {
        Scenario::read_from(&self.path)
    }
}

#[derive(Copy, Clone, Parser)]
pub struct SimulationArgs {
    /// Number of simulated years.
    #[clap(long = "years", env = "SIMULATION_YEARS", default_value_t = DEFAULT_HORIZON)]
    pub years: u32,

    /// Constant ambient temperature in kelvins.
    #[clap(
        long = "ambient-temperature",
        env = "AMBIENT_TEMPERATURE_KELVIN",
        default_value = "300.15"
    )]
    pub temperature: Kelvin,
}
