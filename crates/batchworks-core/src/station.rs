//! Slotted batch stations.
//!
//! A [`BatchStation`] owns a fixed array of [`BatchSlot`]s. Ingredients are
//! routed to the first slot that can take them; every tick advances each
//! fully staged slot by one and completes the ones that reach the process
//! time, resolving quality through the station's
//! [`QualityPolicy`](crate::policy::QualityPolicy).

use crate::activity::ActivityReporter;
use crate::config::{BatchConfig, ConfigError};
use crate::context::TickContext;
use crate::fixed::{Fixed64, fraction};
use crate::quality::{QualityTier, best_of};
use crate::slot::{BatchOutput, BatchSlot, Ingredient};
use tracing::debug;

/// What happened during one [`BatchStation::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTick<Q> {
    /// `(slot index, quality)` for every slot that completed this tick.
    pub completed: Vec<(usize, Q)>,
    /// Whether any slot progressed this tick.
    pub active: bool,
}

impl<Q> BatchTick<Q> {
    fn idle() -> Self {
        Self {
            completed: Vec::new(),
            active: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchStation<Q> {
    config: BatchConfig<Q>,
    slots: Vec<BatchSlot<Q>>,
    reporter: ActivityReporter,
}

impl<Q: QualityTier> BatchStation<Q> {
    /// Build a station with `config.capacity` empty slots. The configuration
    /// is taken as-is; see [`try_new`](Self::try_new) for a validating
    /// constructor.
    pub fn new(config: BatchConfig<Q>) -> Self {
        let slots = (0..config.capacity)
            .map(|_| BatchSlot::new(config.stages.len()))
            .collect();
        Self {
            config,
            slots,
            reporter: ActivityReporter::new(),
        }
    }

    pub fn try_new(config: BatchConfig<Q>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub(crate) fn restore(config: BatchConfig<Q>, slots: Vec<BatchSlot<Q>>) -> Self {
        let mut station = Self::new(config);
        for (dst, src) in station.slots.iter_mut().zip(slots) {
            *dst = src;
        }
        station
    }

    // -----------------------------------------------------------------------
    // Operator actions
    // -----------------------------------------------------------------------

    /// Stage `ingredient` in the first slot that will take it.
    ///
    /// The ingredient's item type selects the stage. Returns false when the
    /// item type belongs to no stage, or when no slot is waiting for this
    /// stage (full, out of order, or holding output).
    pub fn add_ingredient(&mut self, ingredient: Ingredient<Q>) -> bool {
        let Some(stage) = self.config.stage_of(ingredient.item) else {
            return false;
        };
        self.slots
            .iter_mut()
            .any(|slot| slot.accept(ingredient, stage))
    }

    /// Drain every completed slot into one output: quantities summed
    /// (saturating at `u32::MAX`), best quality kept.
    pub fn extract_all(&mut self) -> Option<BatchOutput<Q>> {
        let drained: Vec<BatchOutput<Q>> =
            self.slots.iter_mut().filter_map(BatchSlot::drain).collect();
        let quality = best_of(drained.iter().map(|o| o.quality))?;
        let quantity = drained
            .iter()
            .fold(0u32, |total, o| total.saturating_add(o.quantity));
        debug!(
            station = %self.config.name,
            batches = drained.len(),
            quantity,
            quality = quality.name(),
            "drained station output"
        );
        Some(BatchOutput {
            item: self.config.output_item,
            quantity,
            quality,
        })
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every fully staged slot by one tick and complete the ones
    /// that reach the process time. Reports activity changes through
    /// `ctx.activity`.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> BatchTick<Q> {
        let mut result = BatchTick::idle();
        let threshold = self.config.process_time;
        let item = self.config.output_item;
        let quantity = self.config.output_quantity;
        let policy = &self.config.policy;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.advance(1) {
                continue;
            }
            result.active = true;
            let completed = slot.complete(threshold, |inputs| BatchOutput {
                item,
                quantity,
                quality: policy.resolve(inputs, &mut *ctx.rng),
            });
            if let Some(output) = slot.output().filter(|_| completed) {
                debug!(
                    station = %self.config.name,
                    slot = index,
                    quality = output.quality.name(),
                    "batch completed"
                );
                result.completed.push((index, output.quality));
            }
        }

        self.reporter
            .report_if_changed(ctx.station, result.active, &mut *ctx.activity);
        result
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &BatchConfig<Q> {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[BatchSlot<Q>] {
        &self.slots
    }

    pub fn has_output(&self) -> bool {
        self.slots.iter().any(|s| s.output().is_some())
    }

    /// Slots with every input staged and no output yet.
    pub fn active_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_progressing()).count()
    }

    /// Slots holding a completed output.
    pub fn output_count(&self) -> usize {
        self.slots.iter().filter(|s| s.output().is_some()).count()
    }

    /// Mean completion of the progressing slots in `[0, 1]`, or 0 when none
    /// are progressing. For display.
    pub fn average_progress(&self) -> f64 {
        let progressing: Vec<f64> = self
            .slots
            .iter()
            .filter(|s| s.is_progressing())
            .map(|s| {
                fraction(s.elapsed(), self.config.process_time)
                    .min(Fixed64::ONE)
                    .to_num::<f64>()
            })
            .collect();
        if progressing.is_empty() {
            return 0.0;
        }
        progressing.iter().sum::<f64>() / progressing.len() as f64
    }

    /// For each stage, how many slots have that stage filled.
    pub fn stage_counts(&self) -> Vec<usize> {
        (0..self.config.stages.len())
            .map(|stage| self.slots.iter().filter(|s| s.stage() > stage).count())
            .collect()
    }

    /// The activity value last reported to the accounting collaborator.
    pub fn is_active(&self) -> bool {
        self.reporter.last_reported()
    }
}
