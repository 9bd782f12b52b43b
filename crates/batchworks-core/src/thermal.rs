//! The thermal reactor: one batch, one continuously evolving temperature.
//!
//! Heating is operator-controlled. Processing only advances at or above the
//! optimal minimum, and the time spent in the optimal and danger zones
//! decides the output quality. Reaching the explosion threshold destroys
//! the reactor for good: the batch is lost and a [`Blast`] is raised.
//!
//! # Tick order
//!
//! 1. Heating switches itself off if an output is waiting.
//! 2. Temperature rises (plus process heat if the reactor was processing on
//!    the previous tick) or falls toward ambient.
//! 3. At or above the explosion threshold the reactor is destroyed and the
//!    tick stops.
//! 4. A staged batch advances if the temperature is at least optimal-min,
//!    counting the tick toward the zone it falls in.
//! 5. At the process time the quality is settled, the output written, and
//!    the temperature drops by the completion cooldown.

use crate::activity::ActivityReporter;
use crate::config::{ConfigError, ThermalConfig};
use crate::context::TickContext;
use crate::effect::{Blast, Position};
use crate::fixed::{Fixed64, fixed64_to_f64, fraction};
use crate::id::ItemTypeId;
use crate::quality::QualityTier;
use crate::slot::{BatchOutput, Ingredient};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Named sub-range of the temperature axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Below optimal-min. Processing pauses.
    Cold,
    /// optimal-min ..= optimal-max.
    Optimal,
    /// Above optimal-max, at or below danger-max.
    Danger,
    /// Above danger-max. The next step up is the explosion.
    Critical,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Cold => "cold",
            Zone::Optimal => "optimal",
            Zone::Danger => "danger",
            Zone::Critical => "critical",
        }
    }

    /// Zone of `temperature` under `config`'s thresholds.
    pub fn classify<Q>(config: &ThermalConfig<Q>, temperature: Fixed64) -> Self {
        if temperature < config.optimal_min {
            Zone::Cold
        } else if temperature <= config.optimal_max {
            Zone::Optimal
        } else if temperature <= config.danger_max {
            Zone::Danger
        } else {
            Zone::Critical
        }
    }
}

// ---------------------------------------------------------------------------
// Batch state
// ---------------------------------------------------------------------------

/// Bookkeeping for the batch in the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalRun<Q> {
    /// Item type that was staged.
    pub item: ItemTypeId,
    pub input: Q,
    /// Ticks processed (temperature at or above optimal-min).
    pub elapsed: u32,
    pub optimal_ticks: u32,
    pub danger_ticks: u32,
}

impl<Q> ThermalRun<Q> {
    fn start(item: ItemTypeId, input: Q) -> Self {
        Self {
            item,
            input,
            elapsed: 0,
            optimal_ticks: 0,
            danger_ticks: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Charge<Q> {
    Empty,
    Running(ThermalRun<Q>),
    /// The run's counters stay readable until the output is extracted.
    Finished {
        run: ThermalRun<Q>,
        output: BatchOutput<Q>,
    },
}

/// What happened during one [`ThermalProcess::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalTick<Q> {
    /// No batch to process, or the output is waiting.
    Idle,
    /// A batch is staged but the reactor is too cold.
    Paused,
    /// The batch advanced one tick in the given zone.
    Progressed(Zone),
    /// The batch completed with this quality.
    Completed(Q),
    /// The reactor exploded this tick.
    Exploded,
    /// The reactor was already destroyed. Nothing happened.
    Destroyed,
}

// ---------------------------------------------------------------------------
// Reactor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ThermalProcess<Q> {
    config: ThermalConfig<Q>,
    position: Position,
    temperature: Fixed64,
    heating: bool,
    /// Whether the batch advanced on the most recent tick.
    processing: bool,
    charge: Charge<Q>,
    destroyed: bool,
    reporter: ActivityReporter,
}

impl<Q: QualityTier> ThermalProcess<Q> {
    /// A cold, empty reactor at ambient temperature.
    pub fn new(config: ThermalConfig<Q>, position: Position) -> Self {
        Self {
            temperature: config.ambient,
            config,
            position,
            heating: false,
            processing: false,
            charge: Charge::Empty,
            destroyed: false,
            reporter: ActivityReporter::new(),
        }
    }

    pub fn try_new(config: ThermalConfig<Q>, position: Position) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, position))
    }

    /// Rebuild a reactor from persisted scalars. The temperature is clamped
    /// to ambient; an output without a run gets an empty run.
    pub(crate) fn restore(
        config: ThermalConfig<Q>,
        position: Position,
        temperature: Fixed64,
        heating: bool,
        processing: bool,
        run: Option<ThermalRun<Q>>,
        output: Option<BatchOutput<Q>>,
    ) -> Self {
        let mut reactor = Self::new(config, position);
        reactor.temperature = temperature.max(reactor.config.ambient);
        reactor.heating = heating;
        let staged = reactor.config.accepts.first().copied();
        reactor.charge = match (run, output) {
            (run, Some(output)) => Charge::Finished {
                run: run.unwrap_or_else(|| {
                    ThermalRun::start(staged.unwrap_or(output.item), output.quality)
                }),
                output,
            },
            (Some(run), None) => Charge::Running(run),
            (None, None) => Charge::Empty,
        };
        reactor.processing = processing && matches!(reactor.charge, Charge::Running(_));
        reactor
    }

    // -----------------------------------------------------------------------
    // Operator actions
    // -----------------------------------------------------------------------

    /// Switch the heater. Ignored once destroyed.
    pub fn set_heating(&mut self, on: bool) {
        if !self.destroyed {
            self.heating = on;
        }
    }

    /// Stage a batch. Rejected if a batch or output is present, the item is
    /// not accepted, or the reactor is destroyed. Resets the zone counters.
    pub fn add_batch(&mut self, ingredient: Ingredient<Q>) -> bool {
        if self.destroyed
            || !matches!(self.charge, Charge::Empty)
            || !self.config.accepts.contains(&ingredient.item)
        {
            return false;
        }
        let input = ingredient.quality.unwrap_or(self.config.fallback_quality);
        self.charge = Charge::Running(ThermalRun::start(ingredient.item, input));
        self.processing = false;
        true
    }

    /// Take the finished output. Resets the temperature to ambient and clears
    /// the run for the next batch.
    pub fn extract(&mut self) -> Option<BatchOutput<Q>> {
        if !matches!(self.charge, Charge::Finished { .. }) {
            return None;
        }
        match std::mem::replace(&mut self.charge, Charge::Empty) {
            Charge::Finished { output, .. } => {
                self.temperature = self.config.ambient;
                debug!(
                    station = %self.config.name,
                    quality = output.quality.name(),
                    "reactor output extracted"
                );
                Some(output)
            }
            other => {
                self.charge = other;
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> ThermalTick<Q> {
        if self.destroyed {
            return ThermalTick::Destroyed;
        }

        if self.heating && self.has_output() {
            self.heating = false;
        }
        if self.heating {
            self.temperature = self.temperature.saturating_add(self.config.rise_rate);
            if self.processing {
                self.temperature = self.temperature.saturating_add(self.config.process_heat);
            }
        } else if self.temperature > self.config.ambient {
            self.temperature = self
                .temperature
                .saturating_sub(self.config.fall_rate)
                .max(self.config.ambient);
        }

        if self.temperature >= self.config.explosion_at {
            self.explode(ctx);
            return ThermalTick::Exploded;
        }

        let outcome = self.process(ctx);
        self.reporter
            .report_if_changed(ctx.station, self.is_active(), &mut *ctx.activity);
        outcome
    }

    fn process(&mut self, ctx: &mut TickContext<'_>) -> ThermalTick<Q> {
        let zone = self.zone();
        let Charge::Running(run) = &mut self.charge else {
            self.processing = false;
            return ThermalTick::Idle;
        };
        if zone == Zone::Cold {
            self.processing = false;
            return ThermalTick::Paused;
        }

        self.processing = true;
        run.elapsed += 1;
        match zone {
            Zone::Optimal => run.optimal_ticks += 1,
            Zone::Danger => run.danger_ticks += 1,
            Zone::Cold | Zone::Critical => {}
        }
        if run.elapsed < self.config.process_time {
            return ThermalTick::Progressed(zone);
        }

        let run = *run;
        let quality = self.config.rules.settle(
            run.input,
            run.optimal_ticks,
            run.danger_ticks,
            self.config.process_time,
            &mut *ctx.rng,
        );
        self.charge = Charge::Finished {
            run,
            output: BatchOutput {
                item: self.config.output_item,
                quantity: self.config.output_quantity,
                quality,
            },
        };
        self.processing = false;
        self.temperature = self
            .temperature
            .saturating_sub(self.config.completion_cooldown)
            .max(self.config.ambient);
        debug!(
            station = %self.config.name,
            input = run.input.name(),
            output = quality.name(),
            optimal_ticks = run.optimal_ticks,
            danger_ticks = run.danger_ticks,
            "reactor batch completed"
        );
        ThermalTick::Completed(quality)
    }

    fn explode(&mut self, ctx: &mut TickContext<'_>) {
        self.destroyed = true;
        self.heating = false;
        self.processing = false;
        self.charge = Charge::Empty;

        let blast = Blast {
            station: ctx.station,
            position: self.position,
            radius: self.config.blast_radius,
            magnitude: self.config.blast_magnitude,
        };
        warn!(
            station = %self.config.name,
            temperature = fixed64_to_f64(self.temperature),
            position = ?self.position,
            "reactor exploded"
        );
        ctx.world.detonate(blast);
        self.reporter
            .report_if_changed(ctx.station, false, &mut *ctx.activity);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ThermalConfig<Q> {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn temperature(&self) -> Fixed64 {
        self.temperature
    }

    pub fn temperature_f64(&self) -> f64 {
        fixed64_to_f64(self.temperature)
    }

    pub fn is_heating(&self) -> bool {
        self.heating
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Heating or processing: what the accounting collaborator is told.
    pub fn is_active(&self) -> bool {
        self.heating || self.processing
    }

    pub fn zone(&self) -> Zone {
        Zone::classify(&self.config, self.temperature)
    }

    pub fn run(&self) -> Option<&ThermalRun<Q>> {
        match &self.charge {
            Charge::Empty => None,
            Charge::Running(run) | Charge::Finished { run, .. } => Some(run),
        }
    }

    /// Ticks processed on the current batch.
    pub fn progress(&self) -> u32 {
        self.run().map_or(0, |r| r.elapsed)
    }

    /// Progress toward the process time in `[0, 1]`. For display.
    pub fn progress_fraction(&self) -> f64 {
        fraction(self.progress(), self.config.process_time)
            .min(Fixed64::ONE)
            .to_num::<f64>()
    }

    pub fn optimal_ticks(&self) -> u32 {
        self.run().map_or(0, |r| r.optimal_ticks)
    }

    pub fn danger_ticks(&self) -> u32 {
        self.run().map_or(0, |r| r.danger_ticks)
    }

    pub fn input_quality(&self) -> Option<Q> {
        self.run().map(|r| r.input)
    }

    /// A batch is staged, running or finished.
    pub fn has_batch(&self) -> bool {
        !matches!(self.charge, Charge::Empty)
    }

    pub fn has_output(&self) -> bool {
        matches!(self.charge, Charge::Finished { .. })
    }

    pub fn output(&self) -> Option<&BatchOutput<Q>> {
        match &self.charge {
            Charge::Finished { output, .. } => Some(output),
            _ => None,
        }
    }

    /// The quality the batch would get if it finished now, without rolling.
    /// Once finished, the actual output quality.
    pub fn projected_quality(&self) -> Option<Q> {
        match &self.charge {
            Charge::Empty => None,
            Charge::Running(run) => Some(self.config.rules.project(
                run.input,
                run.optimal_ticks,
                run.danger_ticks,
                run.elapsed,
            )),
            Charge::Finished { output, .. } => Some(output.quality),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
