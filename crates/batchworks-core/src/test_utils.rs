//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::activity::{ActivityNotice, ActivitySink};
use crate::context::TickContext;
use crate::effect::{Blast, WorldEffects};
use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, StationId};
use crate::presets;
use crate::quality::Grade;
use crate::registry::ItemRegistry;
use crate::rng::Roll;
use crate::slot::Ingredient;
use crate::station::{BatchStation, BatchTick};
use crate::thermal::{ThermalProcess, ThermalTick};

pub use crate::presets::LineItems;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Items
// ===========================================================================

/// Line items registered in order into a fresh registry (ids 0..8).
pub fn line_registry() -> (ItemRegistry, LineItems) {
    match presets::line_registry() {
        Ok(pair) => pair,
        Err(e) => panic!("line items must register cleanly: {e}"),
    }
}

/// Line item ids without a registry.
pub fn line_items() -> LineItems {
    line_registry().1
}

/// An ingredient no station accepts.
pub fn stray_item() -> ItemTypeId {
    ItemTypeId(999)
}

/// Stage one full mixer batch. Returns false if the mixer refused any part.
pub fn stage_mix(station: &mut BatchStation<Grade>, items: &LineItems) -> bool {
    station.add_ingredient(Ingredient::raw(items.base_reagent))
        && station.add_ingredient(Ingredient::raw(items.catalyst_a))
        && station.add_ingredient(Ingredient::raw(items.catalyst_b))
}

// ===========================================================================
// Recording collaborators
// ===========================================================================

/// Records activity notices and blasts raised while ticking.
#[derive(Debug, Default)]
pub struct Recorder {
    pub notices: Vec<ActivityNotice>,
    pub blasts: Vec<Blast>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tick context for `station` that records into this recorder.
    pub fn context<'a>(
        &'a mut self,
        station: StationId,
        tick: u64,
        rng: &'a mut dyn Roll,
    ) -> TickContext<'a> {
        TickContext::new(station, tick, rng, &mut self.notices, &mut self.blasts)
    }

    pub fn sinks(&mut self) -> (&mut dyn ActivitySink, &mut dyn WorldEffects) {
        (&mut self.notices, &mut self.blasts)
    }
}

// ===========================================================================
// Tick drivers
// ===========================================================================

/// Tick a batch station `n` times with discarding collaborators. Returns
/// the result of the last tick.
pub fn tick_batch<Q: crate::quality::QualityTier>(
    station: &mut BatchStation<Q>,
    rng: &mut dyn Roll,
    n: u32,
) -> Option<BatchTick<Q>> {
    let mut last = None;
    for tick in 0..n {
        let (mut activity, mut world) = ((), ());
        let mut ctx = TickContext::new(
            StationId::default(),
            u64::from(tick),
            &mut *rng,
            &mut activity,
            &mut world,
        );
        last = Some(station.tick(&mut ctx));
    }
    last
}

/// Tick a reactor `n` times with discarding collaborators. Returns every
/// tick outcome.
pub fn tick_thermal<Q: crate::quality::QualityTier>(
    reactor: &mut ThermalProcess<Q>,
    rng: &mut dyn Roll,
    n: u32,
) -> Vec<ThermalTick<Q>> {
    (0..n)
        .map(|tick| {
            let (mut activity, mut world) = ((), ());
            let mut ctx = TickContext::new(
                StationId::default(),
                u64::from(tick),
                &mut *rng,
                &mut activity,
                &mut world,
            );
            reactor.tick(&mut ctx)
        })
        .collect()
}
