use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset};
use enumset::{EnumSet, EnumSetType, enum_set};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::id::{EventId, VehicleId};

#[derive(Debug, Hash, Deserialize, Serialize, EnumSetType)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Trip between stations, discharging the battery.
    Driving,

    /// Charging at the vehicle's home depot.
    ChargingDepot,

    /// Charging at a terminal station between trips.
    ChargingOpportunity,
}

impl EventKind {
    pub const CHARGING: EnumSet<Self> = enum_set!(Self::ChargingDepot | Self::ChargingOpportunity);
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driving => write!(f, "Driving"),
            Self::ChargingDepot => write!(f, "Depot charging"),
            Self::ChargingOpportunity => write!(f, "Opportunity charging"),
        }
    }
}

/// Single driving or charging event of one vehicle, as recorded by the depot simulation.
#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Event {
    pub id: EventId,

    #[serde(rename = "vehicle")]
    pub vehicle_id: VehicleId,

    pub kind: EventKind,

    pub started_at: DateTime<FixedOffset>,

    /// State of charge at the start of the event, `0..=1`.
    pub soc_start: f64,

    /// State of charge at the end of the event, `0..=1`.
    pub soc_end: f64,
}

impl Event {
    pub fn is_charging(&self) -> bool {
        EventKind::CHARGING.contains(self.kind)
    }
}

/// Unique charging events of the recorded week, without the chronologically last one.
///
/// The last charging event straddles the week boundary and is already covered by the first
/// one of the next replayed week.
pub fn weekly_cycle(charging_events: &[Event]) -> Vec<&Event> {
    let mut events = charging_events.iter().unique_by(|event| event.id).collect_vec();
    if let Some(last) = events.iter().position_max_by_key(|event| (event.started_at, event.id)) {
        events.remove(last);
    }
    events
}
