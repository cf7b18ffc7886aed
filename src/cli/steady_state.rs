use std::{fs, path::PathBuf};

use clap::Parser;

use crate::{
    cli::ScenarioArgs,
    core::{
        diagnostics::Diagnostics,
        simulation::{Axes, Outcome},
        steady_state::SteadyStatePlan,
    },
    prelude::*,
    tables::build_steady_state_table,
};

#[must_use]
#[derive(Parser)]
pub struct SteadyStateArgs {
    #[clap(flatten)]
    pub scenario: ScenarioArgs,

    /// Outcome JSON of a previous simulation of the same scenario.
    #[clap(long = "outcome", env = "OUTCOME_PATH")]
    pub outcome_path: PathBuf,

    /// Write the assigned vehicle ages as JSON to this path.
    #[clap(long = "ages", env = "AGES_PATH")]
    pub ages_path: Option<PathBuf>,
}

impl SteadyStateArgs {
    #[instrument(skip_all)]
    pub fn run(self) -> Result {
        let fleet = self.scenario.read()?.fleet().context("invalid scenario registries")?;
        let outcome = Outcome::read_from(&self.outcome_path)?;
        ensure!(
            *outcome.end_of_life.axes() == Axes::from(&fleet),
            "the outcome was produced for a different set of depots or vehicle types",
        );

        let mut diagnostics = Diagnostics::default();
        let plan = SteadyStatePlan::build(&fleet, &outcome.end_of_life, &mut diagnostics);
        info!(n_cohorts = plan.cohorts.len(), n_diagnostics = diagnostics.len(), "planned");
        println!("{}", build_steady_state_table(&fleet, &plan));

        if let Some(path) = &self.ages_path {
            let ages = plan.assign_ages(&fleet);
            fs::write(path, serde_json::to_string_pretty(&ages)?)
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            info!(path = %path.display(), n_vehicles = ages.len(), "saved the ages");
        }
        Ok(())
    }
}
