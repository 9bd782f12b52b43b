//! The plant: every station in one simulation, ticked together.
//!
//! A [`Plant`] owns its stations in a `SlotMap`, so [`StationId`]s stay
//! valid across removals and are never reused. Each [`step`](Plant::step)
//! ticks every station once, in slot-map order, against a shared
//! deterministic RNG. Stations are independent; order only matters for
//! which station consumes which random draws.

use crate::activity::ActivitySink;
use crate::config::{BatchConfig, ConfigError, ThermalConfig};
use crate::context::TickContext;
use crate::effect::{Position, WorldEffects};
use crate::fixed::Ticks;
use crate::id::StationId;
use crate::quality::QualityTier;
use crate::rng::SimRng;
use crate::station::BatchStation;
use crate::thermal::{ThermalProcess, ThermalTick};
use slotmap::SlotMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// Any station the plant can own.
#[derive(Debug, Clone)]
pub enum Station<Q> {
    Batch(BatchStation<Q>),
    Thermal(ThermalProcess<Q>),
}

impl<Q: QualityTier> Station<Q> {
    pub fn name(&self) -> &str {
        match self {
            Station::Batch(s) => s.name(),
            Station::Thermal(s) => s.name(),
        }
    }

    /// The activity value last reported for this station.
    pub fn is_active(&self) -> bool {
        match self {
            Station::Batch(s) => s.is_active(),
            Station::Thermal(s) => s.is_active(),
        }
    }

    pub fn as_batch(&self) -> Option<&BatchStation<Q>> {
        match self {
            Station::Batch(s) => Some(s),
            Station::Thermal(_) => None,
        }
    }

    pub fn as_batch_mut(&mut self) -> Option<&mut BatchStation<Q>> {
        match self {
            Station::Batch(s) => Some(s),
            Station::Thermal(_) => None,
        }
    }

    pub fn as_thermal(&self) -> Option<&ThermalProcess<Q>> {
        match self {
            Station::Thermal(s) => Some(s),
            Station::Batch(_) => None,
        }
    }

    pub fn as_thermal_mut(&mut self) -> Option<&mut ThermalProcess<Q>> {
        match self {
            Station::Thermal(s) => Some(s),
            Station::Batch(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something that happened during a [`Plant::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantEvent<Q> {
    /// A batch station slot completed.
    BatchCompleted {
        station: StationId,
        slot: usize,
        quality: Q,
    },
    /// A thermal reactor completed its batch.
    ReactorCompleted { station: StationId, quality: Q },
    /// A reactor exploded and was removed from the plant.
    StationDestroyed {
        station: StationId,
        position: Position,
    },
}

// ---------------------------------------------------------------------------
// Plant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Plant<Q> {
    stations: SlotMap<StationId, Station<Q>>,
    rng: SimRng,
    tick: Ticks,
}

impl<Q: QualityTier> Plant<Q> {
    /// An empty plant whose quality rolls are seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            stations: SlotMap::with_key(),
            rng: SimRng::new(seed),
            tick: 0,
        }
    }

    /// Rebuild a plant. Stations are inserted in order.
    pub(crate) fn from_parts(rng: SimRng, tick: Ticks, stations: Vec<Station<Q>>) -> Self {
        let mut plant = Self {
            stations: SlotMap::with_key(),
            rng,
            tick,
        };
        for station in stations {
            plant.stations.insert(station);
        }
        plant
    }

    /// Add a batch station without validating `config`; see
    /// [`try_add_batch_station`](Self::try_add_batch_station).
    pub fn add_batch_station(&mut self, config: BatchConfig<Q>) -> StationId {
        self.stations.insert(Station::Batch(BatchStation::new(config)))
    }

    pub fn add_thermal_process(&mut self, config: ThermalConfig<Q>, position: Position) -> StationId {
        self.stations
            .insert(Station::Thermal(ThermalProcess::new(config, position)))
    }

    /// Validate `config`, then add the station.
    pub fn try_add_batch_station(&mut self, config: BatchConfig<Q>) -> Result<StationId, ConfigError> {
        let station = BatchStation::try_new(config)?;
        Ok(self.stations.insert(Station::Batch(station)))
    }

    pub fn try_add_thermal_process(
        &mut self,
        config: ThermalConfig<Q>,
        position: Position,
    ) -> Result<StationId, ConfigError> {
        let station = ThermalProcess::try_new(config, position)?;
        Ok(self.stations.insert(Station::Thermal(station)))
    }

    pub fn station(&self, id: StationId) -> Option<&Station<Q>> {
        self.stations.get(id)
    }

    pub fn station_mut(&mut self, id: StationId) -> Option<&mut Station<Q>> {
        self.stations.get_mut(id)
    }

    pub fn batch(&self, id: StationId) -> Option<&BatchStation<Q>> {
        self.station(id).and_then(Station::as_batch)
    }

    pub fn batch_mut(&mut self, id: StationId) -> Option<&mut BatchStation<Q>> {
        self.station_mut(id).and_then(Station::as_batch_mut)
    }

    pub fn thermal(&self, id: StationId) -> Option<&ThermalProcess<Q>> {
        self.station(id).and_then(Station::as_thermal)
    }

    pub fn thermal_mut(&mut self, id: StationId) -> Option<&mut ThermalProcess<Q>> {
        self.station_mut(id).and_then(Station::as_thermal_mut)
    }

    /// Remove a station, returning it. Its id is never reused.
    pub fn remove(&mut self, id: StationId) -> Option<Station<Q>> {
        self.stations.remove(id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station ids in tick order.
    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationId, &Station<Q>)> {
        self.stations.iter()
    }

    /// Number of completed steps.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Tick every station once. Reactors that explode are removed before
    /// this returns.
    pub fn step(
        &mut self,
        activity: &mut dyn ActivitySink,
        world: &mut dyn WorldEffects,
    ) -> Vec<PlantEvent<Q>> {
        let mut events = Vec::new();
        let mut destroyed = Vec::new();

        for (id, station) in self.stations.iter_mut() {
            let mut ctx = TickContext::new(id, self.tick, &mut self.rng, activity, world);
            match station {
                Station::Batch(batch) => {
                    let result = batch.tick(&mut ctx);
                    events.extend(result.completed.into_iter().map(|(slot, quality)| {
                        PlantEvent::BatchCompleted {
                            station: id,
                            slot,
                            quality,
                        }
                    }));
                }
                Station::Thermal(reactor) => match reactor.tick(&mut ctx) {
                    ThermalTick::Completed(quality) => {
                        events.push(PlantEvent::ReactorCompleted {
                            station: id,
                            quality,
                        });
                    }
                    ThermalTick::Exploded | ThermalTick::Destroyed => {
                        destroyed.push((id, reactor.position()));
                    }
                    ThermalTick::Idle | ThermalTick::Paused | ThermalTick::Progressed(_) => {}
                },
            }
        }

        for (id, position) in destroyed {
            self.stations.remove(id);
            debug!(station = ?id, "removed destroyed station");
            events.push(PlantEvent::StationDestroyed {
                station: id,
                position,
            });
        }

        self.tick += 1;
        events
    }

    /// Run `steps` steps, collecting every event.
    pub fn run(
        &mut self,
        steps: u32,
        activity: &mut dyn ActivitySink,
        world: &mut dyn WorldEffects,
    ) -> Vec<PlantEvent<Q>> {
        let mut events = Vec::new();
        for _ in 0..steps {
            events.extend(self.step(activity, world));
        }
        events
    }
}
