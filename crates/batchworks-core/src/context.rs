use crate::activity::ActivitySink;
use crate::effect::WorldEffects;
use crate::fixed::Ticks;
use crate::id::StationId;
use crate::rng::Roll;

/// Collaborators handed to a station for the duration of one tick.
///
/// Ticks are single-threaded and non-reentrant: the context is borrowed
/// exclusively for the call and nothing in it outlives the tick.
pub struct TickContext<'a> {
    /// The station being ticked. Used to tag notifications and effects.
    pub station: StationId,
    /// The scheduler's tick counter.
    pub tick: Ticks,
    pub rng: &'a mut dyn Roll,
    pub activity: &'a mut dyn ActivitySink,
    pub world: &'a mut dyn WorldEffects,
}

impl<'a> TickContext<'a> {
    pub fn new(
        station: StationId,
        tick: Ticks,
        rng: &'a mut dyn Roll,
        activity: &'a mut dyn ActivitySink,
        world: &'a mut dyn WorldEffects,
    ) -> Self {
        Self {
            station,
            tick,
            rng,
            activity,
            world,
        }
    }
}
