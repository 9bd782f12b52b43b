//! Criterion benchmarks for the Batchworks plant.
//!
//! Two benchmark groups:
//! - `plant_step`: 250 production lines (1000 stations) kept busy, one step
//! - `persistence`: save, JSON and binary encode/decode of the same plant

use batchworks_core::effect::Position;
use batchworks_core::persist;
use batchworks_core::plant::Plant;
use batchworks_core::presets;
use batchworks_core::quality::Grade;
use batchworks_core::slot::Ingredient;
use batchworks_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

// ===========================================================================
// Plant builder
// ===========================================================================

/// `lines` four-stage lines, every batch station filled and every reactor
/// loaded and heating.
fn build_plant(lines: usize, items: &LineItems) -> Plant<Grade> {
    let mut plant = Plant::new(0xBA7C);
    for i in 0..lines {
        let mixer = plant.add_batch_station(presets::mixing_station(items));
        let reactor = plant.add_thermal_process(
            presets::reduction_reactor(items),
            Position::new(i as i32, 64, 0),
        );
        let crystallizer = plant.add_batch_station(presets::crystallizer(items));
        let dryer = plant.add_batch_station(presets::vacuum_dryer(items));

        if let Some(station) = plant.batch_mut(mixer) {
            while stage_mix(station, items) {}
        }
        if let Some(reactor) = plant.thermal_mut(reactor) {
            reactor.add_batch(Ingredient::graded(items.reaction_mixture, Grade::Standard));
            reactor.set_heating(true);
        }
        if let Some(station) = plant.batch_mut(crystallizer) {
            while station.add_ingredient(Ingredient::graded(items.raw_product, Grade::Good)) {}
        }
        if let Some(station) = plant.batch_mut(dryer) {
            while station.add_ingredient(Ingredient::graded(items.crystals, Grade::Good)) {}
        }
    }
    plant
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_plant_step(c: &mut Criterion) {
    let items = line_items();
    let mut group = c.benchmark_group("plant_step");

    group.bench_function("step_1000_stations", |b| {
        b.iter_batched(
            || build_plant(250, &items),
            |mut plant| {
                let mut recorder = Recorder::new();
                let (activity, world) = recorder.sinks();
                plant.step(activity, world);
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.bench_function("run_100_steps_1000_stations", |b| {
        b.iter_batched(
            || build_plant(250, &items),
            |mut plant| {
                plant.run(100, &mut (), &mut ());
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let (registry, items) = line_registry();
    let mut plant = build_plant(250, &items);
    plant.run(50, &mut (), &mut ());
    let catalog = presets::line_catalog(&items);

    let mut group = c.benchmark_group("persistence");

    group.bench_function("save_1000_stations", |b| {
        b.iter(|| plant.save(&registry).unwrap());
    });

    let doc = plant.save(&registry).unwrap();
    group.bench_function("load_1000_stations", |b| {
        b.iter(|| Plant::load(&doc, &registry, &catalog).unwrap());
    });

    let json = persist::to_json(&doc).unwrap();
    group.bench_function("decode_json", |b| {
        b.iter(|| persist::from_json(&json).unwrap());
    });

    let bytes = persist::to_bytes(&doc).unwrap();
    group.bench_function("decode_binary", |b| {
        b.iter(|| persist::from_bytes(&bytes).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_plant_step, bench_persistence);
criterion_main!(benches);
