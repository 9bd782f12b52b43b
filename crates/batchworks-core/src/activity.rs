//! Edge-triggered activity reporting.
//!
//! Stations tell an external resource-accounting collaborator (power draw,
//! water use, ...) whether they are actively consuming. The collaborator is
//! only notified when that flag *flips*, never once per tick.

use crate::id::StationId;
use serde::{Deserialize, Serialize};

/// Receives activity transitions. Implemented by the host.
pub trait ActivitySink {
    fn activity_changed(&mut self, station: StationId, active: bool);
}

/// Discards notifications.
impl ActivitySink for () {
    fn activity_changed(&mut self, _station: StationId, _active: bool) {}
}

/// A single recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityNotice {
    pub station: StationId,
    pub active: bool,
}

/// Records every notification in order.
impl ActivitySink for Vec<ActivityNotice> {
    fn activity_changed(&mut self, station: StationId, active: bool) {
        self.push(ActivityNotice { station, active });
    }
}

/// Per-station debouncer holding the last value sent to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReporter {
    last_reported: bool,
}

impl ActivityReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify `sink` if `active` differs from the last reported value.
    /// Returns whether a notification was sent.
    pub fn report_if_changed(
        &mut self,
        station: StationId,
        active: bool,
        sink: &mut dyn ActivitySink,
    ) -> bool {
        if active == self.last_reported {
            return false;
        }
        self.last_reported = active;
        tracing::info!(?station, active, "station activity changed");
        sink.activity_changed(station, active);
        true
    }

    /// The value most recently sent to the sink.
    pub fn last_reported(&self) -> bool {
        self.last_reported
    }
}
