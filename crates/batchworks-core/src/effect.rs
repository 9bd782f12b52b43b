//! World-effect collaborator: the core raises area effects, the host applies
//! them (damage, knockback, removing the block).

use crate::fixed::Fixed64;
use crate::id::StationId;
use serde::{Deserialize, Serialize};

/// World position of a station. Opaque to the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// A destructive area effect: the station at `position` is gone and every
/// actor within `radius` takes `magnitude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blast {
    pub station: StationId,
    pub position: Position,
    pub radius: Fixed64,
    pub magnitude: Fixed64,
}

/// Applies world effects. Implemented by the host.
pub trait WorldEffects {
    fn detonate(&mut self, blast: Blast);
}

/// Discards effects.
impl WorldEffects for () {
    fn detonate(&mut self, _blast: Blast) {}
}

/// Records every effect in order.
impl WorldEffects for Vec<Blast> {
    fn detonate(&mut self, blast: Blast) {
        self.push(blast);
    }
}
