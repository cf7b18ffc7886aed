use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{
        fleet::{Cohort, Depot, Fleet},
        simulation::Outcome,
        statistics::YearlyStatistics,
        steady_state::SteadyStatePlan,
    },
    fmt::FormattedPercentage,
};

const NO_DATA: &str = "---";

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn no_data_cell() -> Cell {
    Cell::new(NO_DATA).set_alignment(CellAlignment::Center).add_attribute(Attribute::Dim)
}

fn fade_cell(fade: Option<f64>) -> Cell {
    fade.map_or_else(no_data_cell, |fade| {
        Cell::new(FormattedPercentage(fade)).set_alignment(CellAlignment::Right)
    })
}

/// State of health progression of every vehicle type housed in the depot.
pub fn build_state_of_health_table(fleet: &Fleet, outcome: &Outcome, depot: &Depot) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once("Vehicle type".to_string())
            .chain((0..=outcome.fade.years()).map(|age| format!("Age {age}")))
            .chain(std::iter::once("Lifespan".to_string())),
    );
    for vehicle_type in fleet.vehicle_types() {
        let cohort = Cohort { depot_id: depot.id, vehicle_type_id: vehicle_type.id };
        if !outcome.fade.is_populated(cohort) {
            continue;
        }
        let end_of_life_age = outcome.end_of_life.get(cohort);
        table.add_row(
            std::iter::once(Cell::new(&vehicle_type.name))
                .chain((0..=outcome.fade.years()).map(|year| {
                    outcome.fade.get(cohort, year).map_or_else(no_data_cell, |fade| {
                        let state_of_health = (1.0 - fade).max(0.0);
                        Cell::new(FormattedPercentage(state_of_health))
                            .set_alignment(CellAlignment::Right)
                            .fg(if state_of_health <= 0.0 {
                                Color::Red
                            } else if state_of_health < 0.5 {
                                Color::DarkYellow
                            } else {
                                Color::Green
                            })
                    })
                }))
                .chain(std::iter::once(end_of_life_age.map_or_else(no_data_cell, |age| {
                    Cell::new(format!("{age} years")).set_alignment(CellAlignment::Right)
                })))
                .collect_vec(),
        );
    }
    table
}

/// End-of-life ages, depots by vehicle types.
pub fn build_end_of_life_table(fleet: &Fleet, outcome: &Outcome) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once("Depot")
            .chain(fleet.vehicle_types().map(|vehicle_type| vehicle_type.name.as_str())),
    );
    for depot in fleet.depots() {
        table.add_row(
            std::iter::once(Cell::new(depot.label()))
                .chain(fleet.vehicle_types().map(|vehicle_type| {
                    let cohort = Cohort { depot_id: depot.id, vehicle_type_id: vehicle_type.id };
                    outcome.end_of_life.get(cohort).map_or_else(no_data_cell, |age| {
                        Cell::new(age).set_alignment(CellAlignment::Right)
                    })
                }))
                .collect_vec(),
        );
    }
    table
}

/// Yearly mean fade per depot, per vehicle type and across the fleet.
pub fn build_yearly_fade_table(fleet: &Fleet, statistics: &[YearlyStatistics]) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once(Cell::new("Year"))
            .chain(fleet.depots().map(|depot| Cell::new(depot.label())))
            .chain(
                fleet
                    .vehicle_types()
                    .map(|vehicle_type| Cell::new(&vehicle_type.name).add_attribute(Attribute::Italic)),
            )
            .chain(std::iter::once(Cell::new("Fleet").add_attribute(Attribute::Bold)))
            .collect_vec(),
    );
    for yearly in statistics {
        table.add_row(
            std::iter::once(Cell::new(yearly.year).add_attribute(Attribute::Dim))
                .chain(fleet.depots().map(|depot| fade_cell(yearly.by_depot.get(&depot.id).copied())))
                .chain(fleet.vehicle_types().map(|vehicle_type| {
                    fade_cell(yearly.by_vehicle_type.get(&vehicle_type.id).copied())
                }))
                .chain(std::iter::once(fade_cell(yearly.fleet).add_attribute(Attribute::Bold)))
                .collect_vec(),
        );
    }
    table
}

/// Number of vehicles of each age per cohort, under replacement at the end-of-life age.
pub fn build_steady_state_table(fleet: &Fleet, plan: &SteadyStatePlan) -> Table {
    let max_n_buckets =
        plan.cohorts.iter().map(|planned| planned.distribution.counts().len()).max().unwrap_or(0);

    let mut table = new_table();
    table.set_header(
        ["Depot", "Vehicle type", "Lifespan", "Vehicles"]
            .into_iter()
            .map(str::to_string)
            .chain((0..max_n_buckets).map(|age| format!("Age {age}")))
            .collect_vec(),
    );
    for planned in &plan.cohorts {
        let depot = fleet.depot(planned.cohort.depot_id).map_or(NO_DATA, Depot::label);
        let vehicle_type = fleet
            .vehicle_type(planned.cohort.vehicle_type_id)
            .map_or(NO_DATA, |vehicle_type| vehicle_type.name.as_str());
        let counts = planned.distribution.counts();
        table.add_row(
            [
                Cell::new(depot),
                Cell::new(vehicle_type),
                Cell::new(planned.end_of_life_age).set_alignment(CellAlignment::Right),
                Cell::new(planned.distribution.fleet_size()).set_alignment(CellAlignment::Right),
            ]
            .into_iter()
            .chain((0..max_n_buckets).map(|age| {
                counts.get(age).map_or_else(no_data_cell, |count| {
                    Cell::new(count).set_alignment(CellAlignment::Right)
                })
            }))
            .collect_vec(),
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        degradation::tests::weekly_events,
        diagnostics::Diagnostics,
        fleet::tests::{depot, vehicle, vehicle_type},
        simulation::Simulation,
    };

    fn fleet() -> Fleet {
        Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 320.0), vehicle_type(2, 200.0)])
            .depots(vec![depot(1), depot(2)])
            .vehicles(vec![vehicle(1, 1, Some(1))])
            .build()
            .unwrap()
    }

    #[test]
    fn render_all_tables() {
        let fleet = fleet();
        let outcome = Simulation::builder().fleet(&fleet).years(3).build().run(weekly_events()).unwrap();
        let plan =
            SteadyStatePlan::build(&fleet, &outcome.end_of_life, &mut Diagnostics::default());

        let depot = fleet.depots().next().unwrap();
        let state_of_health = build_state_of_health_table(&fleet, &outcome, depot).to_string();
        assert!(state_of_health.contains("Age 3"));
        assert!(state_of_health.contains("100.0%"));
        assert!(!state_of_health.contains("VT2"));

        let end_of_life = build_end_of_life_table(&fleet, &outcome).to_string();
        assert!(end_of_life.contains(NO_DATA));
        assert!(end_of_life.contains("Depot at Betriebshof 2"));

        let yearly_fade = build_yearly_fade_table(&fleet, &outcome.statistics).to_string();
        assert!(yearly_fade.contains("Fleet"));

        let steady_state = build_steady_state_table(&fleet, &plan).to_string();
        assert!(steady_state.contains("Age 1"));
    }
}
