//! Batchworks Core -- multi-stage batch production stations.
//!
//! This crate provides slotted batch stations, a thermal reactor with a
//! destructive failure mode, quality-tier algebra, edge-triggered activity
//! reporting and crash-safe persistence. The host (a game loop or any other
//! scheduler) owns the world; the core only decides *when* a batch is ready
//! and *what quality* it yields, and talks to the host through three narrow
//! collaborator traits.
//!
//! # Tick Pipeline
//!
//! Each call to [`plant::Plant::step`] ticks every station once:
//!
//! 1. **Batch stations** -- every fully staged slot advances one tick; slots
//!    reaching the process time resolve their quality and hold the output.
//! 2. **Thermal reactors** -- temperature moves, processing advances while
//!    hot enough, and an overheated reactor explodes.
//! 3. **Activity** -- each station reports to the [`activity::ActivitySink`]
//!    only if its "actively consuming" flag flipped.
//! 4. **Bookkeeping** -- destroyed reactors are removed and the tick counter
//!    increments.
//!
//! # Collaborators
//!
//! - [`activity::ActivitySink`] -- resource accounting (power draw, ...).
//! - [`effect::WorldEffects`] -- applies explosion damage in the world.
//! - [`rng::Roll`] -- Bernoulli trials for quality rolls.
//!
//! # Key Types
//!
//! - [`quality::QualityTier`] -- Saturating, ordered tiers. Ships with
//!   [`quality::Grade`] (five tiers) and [`quality::Finish`] (two tiers).
//! - [`slot::BatchSlot`] -- One lane: ordered inputs, progress, output.
//! - [`station::BatchStation`] -- Fixed array of slots plus a quality policy.
//! - [`thermal::ThermalProcess`] -- Single-batch reactor driven by temperature.
//! - [`plant::Plant`] -- Owns and ticks stations with a deterministic RNG.
//! - [`persist`] -- Name-based documents, JSON and versioned binary encodings.
//! - [`presets`] -- The standard four-stage production line.

pub mod activity;
pub mod config;
pub mod context;
pub mod effect;
pub mod fixed;
pub mod id;
pub mod persist;
pub mod plant;
pub mod policy;
pub mod presets;
pub mod quality;
pub mod registry;
pub mod rng;
pub mod slot;
pub mod station;
pub mod thermal;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
