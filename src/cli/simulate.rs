use std::path::PathBuf;

use clap::Parser;

use crate::{
    cli::{ScenarioArgs, SimulationArgs},
    core::simulation::Simulation,
    prelude::*,
    tables::{build_end_of_life_table, build_state_of_health_table, build_yearly_fade_table},
};

#[must_use]
#[derive(Parser)]
pub struct SimulateArgs {
    #[clap(flatten)]
    pub scenario: ScenarioArgs,

    #[clap(flatten)]
    pub simulation: SimulationArgs,

    /// Write the outcome as JSON to this path.
    #[clap(long = "outcome", env = "OUTCOME_PATH")]
    pub outcome_path: Option<PathBuf>,
}

impl SimulateArgs {
    #[instrument(skip_all)]
    pub fn run(self) -> Result {
        let scenario = self.scenario.read()?;
        let fleet = scenario.fleet().context("invalid scenario registries")?;

        info!(
            years = self.simulation.years,
            temperature = %self.simulation.temperature,
            "simulating…",
        );
        let outcome = Simulation::builder()
            .fleet(&fleet)
            .aging_model(scenario.aging_model)
            .temperature(self.simulation.temperature)
            .years(self.simulation.years)
            .build()
            .run(scenario.events)
            .context("the simulation has been aborted")?;

        for depot in fleet.depots() {
            println!("{}", depot.name);
            println!("{}", build_state_of_health_table(&fleet, &outcome, depot));
        }
        println!("{}", build_end_of_life_table(&fleet, &outcome));
        println!("{}", build_yearly_fade_table(&fleet, &outcome.statistics));

        if !outcome.diagnostics.is_empty() {
            warn!(n_diagnostics = outcome.diagnostics.len(), "the scenario data is incomplete");
        }
        if let Some(path) = &self.outcome_path {
            outcome.write_to(path)?;
            info!(path = %path.display(), "saved the outcome");
        }
        Ok(())
    }
}
