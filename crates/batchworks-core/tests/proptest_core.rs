//! Property-based tests for the Batchworks core.
//!
//! Uses proptest to generate tiers, station sizes, heating schedules and
//! seeds, then verify the invariants the stations promise.

use batchworks_core::config::StationCatalog;
use batchworks_core::effect::Position;
use batchworks_core::persist;
use batchworks_core::plant::{Plant, PlantEvent};
use batchworks_core::presets;
use batchworks_core::quality::{Finish, Grade, QualityTier};
use batchworks_core::rng::{SimRng, Roll};
use batchworks_core::slot::Ingredient;
use batchworks_core::station::BatchStation;
use batchworks_core::thermal::{ThermalProcess, ThermalTick};
use batchworks_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_grade() -> impl Strategy<Value = Grade> {
    proptest::sample::select(Grade::TIERS)
}

fn arb_finish() -> impl Strategy<Value = Finish> {
    proptest::sample::select(Finish::TIERS)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // -----------------------------------------------------------------------
    // Quality algebra
    // -----------------------------------------------------------------------

    #[test]
    fn upgrade_then_downgrade_is_near_identity(q in arb_grade()) {
        let back = q.upgrade().downgrade();
        prop_assert!(back == q || back == q.upgrade());
        let up = q.downgrade().upgrade();
        prop_assert!(up == q || up == q.downgrade());
    }

    #[test]
    fn two_tier_family_saturates(f in arb_finish()) {
        prop_assert!(f.upgrade() >= f);
        prop_assert!(f.downgrade() <= f);
        prop_assert_eq!(f.upgrade().upgrade(), Finish::Fine);
        prop_assert_eq!(f.downgrade().downgrade(), Finish::Rough);
    }

    #[test]
    fn upgrade_never_lowers(q in arb_grade()) {
        prop_assert!(q.upgrade() >= q);
        prop_assert!(q.downgrade() <= q);
        prop_assert!(q.upgrade().level() <= q.level() + 1);
    }

    // -----------------------------------------------------------------------
    // Batch stations
    // -----------------------------------------------------------------------

    #[test]
    fn full_station_extracts_capacity(
        capacity in 1usize..8,
        process_time in 1u32..40,
        seed in any::<u64>(),
    ) {
        let items = line_items();
        let mut cfg = presets::mixing_station(&items);
        cfg.capacity = capacity;
        cfg.process_time = process_time;
        let mut mixer = BatchStation::new(cfg);
        for _ in 0..capacity {
            prop_assert!(stage_mix(&mut mixer, &items));
        }
        prop_assert!(!mixer.add_ingredient(Ingredient::raw(items.base_reagent)));

        let mut rng = SimRng::new(seed);
        tick_batch(&mut mixer, &mut rng, process_time);
        prop_assert_eq!(mixer.output_count(), capacity);

        let out = mixer.extract_all();
        prop_assert_eq!(out.map(|o| o.quantity), Some(capacity as u32));
        let quality = out.map(|o| o.quality);
        prop_assert!(quality == Some(Grade::Poor) || quality == Some(Grade::Standard));
        prop_assert!(mixer.slots().iter().all(|s| s.is_empty()));
        prop_assert_eq!(mixer.extract_all(), None);
    }

    #[test]
    fn catalyst_first_is_always_rejected(capacity in 1usize..8, use_b in any::<bool>()) {
        let items = line_items();
        let mut cfg = presets::mixing_station(&items);
        cfg.capacity = capacity;
        let mut mixer = BatchStation::new(cfg);
        let catalyst = if use_b { items.catalyst_b } else { items.catalyst_a };
        prop_assert!(!mixer.add_ingredient(Ingredient::raw(catalyst)));
        prop_assert!(mixer.slots().iter().all(|s| s.is_empty()));
    }

    #[test]
    fn extract_keeps_best_quality(qualities in proptest::collection::vec(arb_grade(), 1..6)) {
        let items = line_items();
        let mut cfg = presets::vacuum_dryer(&items);
        cfg.process_time = 2;
        let mut dryer = BatchStation::new(cfg);
        for &q in &qualities {
            prop_assert!(dryer.add_ingredient(Ingredient::graded(items.crystals, q)));
        }
        tick_batch(&mut dryer, &mut SimRng::new(1), 2);
        let out = dryer.extract_all();
        prop_assert_eq!(out.map(|o| o.quality), qualities.iter().copied().max());
        prop_assert_eq!(out.map(|o| o.quantity), Some(qualities.len() as u32));
    }

    // -----------------------------------------------------------------------
    // Thermal reactor
    // -----------------------------------------------------------------------

    #[test]
    fn temperature_rises_then_falls_to_floor(heat_ticks in 1u32..60, cool_ticks in 1u32..200) {
        let items = line_items();
        let mut reactor = ThermalProcess::new(presets::reduction_reactor(&items), Position::default());
        let mut rng = SimRng::new(0);
        let ambient = reactor.config().ambient;

        reactor.set_heating(true);
        for _ in 0..heat_ticks {
            let before = reactor.temperature();
            tick_thermal(&mut reactor, &mut rng, 1);
            prop_assert!(reactor.temperature() > before);
        }

        reactor.set_heating(false);
        for _ in 0..cool_ticks {
            let before = reactor.temperature();
            tick_thermal(&mut reactor, &mut rng, 1);
            let after = reactor.temperature();
            prop_assert!(after >= ambient);
            if before > ambient {
                prop_assert!(after < before);
            } else {
                prop_assert_eq!(after, ambient);
            }
        }
    }

    #[test]
    fn overheating_destroys_once_without_output(extra_ticks in 0u32..50, input in arb_grade()) {
        let items = line_items();
        let mut reactor = ThermalProcess::new(presets::reduction_reactor(&items), Position::default());
        reactor.add_batch(Ingredient::graded(items.reaction_mixture, input));
        reactor.set_heating(true);

        let mut recorder = Recorder::new();
        let mut rng = SimRng::new(5);
        let mut outcomes = Vec::new();
        for tick in 0..(120 + extra_ticks) {
            let mut ctx = recorder.context(Default::default(), u64::from(tick), &mut rng);
            outcomes.push(reactor.tick(&mut ctx));
        }

        let exploded = outcomes.iter().filter(|o| **o == ThermalTick::Exploded).count();
        prop_assert_eq!(exploded, 1);
        prop_assert!(!outcomes.iter().any(|o| matches!(o, ThermalTick::Completed(_))));
        prop_assert_eq!(recorder.blasts.len(), 1);
        prop_assert!(!reactor.has_output());
        prop_assert!(reactor.is_destroyed());
    }

    #[test]
    fn thermostat_run_never_below_standard(seed in any::<u64>()) {
        let items = line_items();
        let mut reactor = ThermalProcess::new(presets::reduction_reactor(&items), Position::default());
        reactor.add_batch(Ingredient::graded(items.reaction_mixture, Grade::Standard));
        let mut rng = SimRng::new(seed);

        let mut result = None;
        for _ in 0..1000 {
            if reactor.temperature() >= fixed(110.0) {
                reactor.set_heating(false);
            } else if reactor.temperature() <= fixed(100.0) {
                reactor.set_heating(true);
            }
            if let Some(ThermalTick::Completed(q)) = tick_thermal(&mut reactor, &mut rng, 1).pop() {
                result = Some(q);
                break;
            }
        }
        prop_assert!(result == Some(Grade::Good) || result == Some(Grade::Legendary));
    }

    // -----------------------------------------------------------------------
    // Plant determinism and persistence
    // -----------------------------------------------------------------------

    #[test]
    fn reload_mid_run_matches_uninterrupted(seed in any::<u64>(), split in 1u32..120) {
        let (registry, items) = line_registry();
        let mut cfg = presets::crystallizer(&items);
        cfg.process_time = 20;
        let mut catalog = StationCatalog::new();
        catalog.insert_batch(cfg.clone());

        let build = || {
            let mut plant: Plant<Grade> = Plant::new(seed);
            let id = plant.add_batch_station(cfg.clone());
            if let Some(station) = plant.batch_mut(id) {
                while station.add_ingredient(Ingredient::graded(items.raw_product, Grade::Standard)) {}
            }
            plant
        };

        let mut straight = build();
        let straight_events = straight.run(120, &mut (), &mut ());

        let mut first = build();
        let mut events = first.run(split, &mut (), &mut ());
        let bytes = persist::to_bytes(&first.save(&registry).unwrap()).unwrap();
        let mut second = Plant::load(&persist::from_bytes(&bytes).unwrap(), &registry, &catalog).unwrap();
        events.extend(second.run(120 - split, &mut (), &mut ()));

        let qualities = |events: &[PlantEvent<Grade>]| -> Vec<Grade> {
            events
                .iter()
                .filter_map(|e| match e {
                    PlantEvent::BatchCompleted { quality, .. } => Some(*quality),
                    _ => None,
                })
                .collect()
        };
        prop_assert_eq!(qualities(&straight_events), qualities(&events));
        prop_assert_eq!(straight.save(&registry).unwrap(), second.save(&registry).unwrap());
    }

    #[test]
    fn sim_rng_respects_degenerate_probabilities(seed in any::<u64>()) {
        let mut rng = SimRng::new(seed);
        prop_assert!(!rng.chance(fixed(0.0)));
        prop_assert!(rng.chance(fixed(1.0)));
    }
}
