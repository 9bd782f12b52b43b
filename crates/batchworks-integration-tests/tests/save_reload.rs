//! Save and reload of a running production line.
//!
//! A plant saved mid-batch and reloaded must continue exactly as the
//! uninterrupted plant would, through either encoding.

use batchworks_core::config::StationCatalog;
use batchworks_core::effect::Position;
use batchworks_core::id::StationId;
use batchworks_core::persist::{self, PersistError, PlantDocument, StationDocument};
use batchworks_core::plant::{Plant, PlantEvent};
use batchworks_core::presets::{self, LINE_ITEM_NAMES};
use batchworks_core::quality::Grade;
use batchworks_core::registry::ItemRegistryBuilder;
use batchworks_core::slot::Ingredient;
use batchworks_core::test_utils::*;

/// A mixer with four staged batches, a heating reactor with a batch in
/// flight, and a crystallizer with two lanes in use.
fn busy_plant(items: &LineItems) -> (Plant<Grade>, StationId) {
    let mut plant = Plant::new(2024);
    let mixer = plant.add_batch_station(presets::mixing_station(items));
    let reactor =
        plant.add_thermal_process(presets::reduction_reactor(items), Position::new(3, 70, 3));
    let crystallizer = plant.add_batch_station(presets::crystallizer(items));

    let m = plant.batch_mut(mixer).unwrap();
    while stage_mix(m, items) {}

    let r = plant.thermal_mut(reactor).unwrap();
    assert!(r.add_batch(Ingredient::graded(items.reaction_mixture, Grade::Standard)));
    r.set_heating(true);

    let c = plant.batch_mut(crystallizer).unwrap();
    assert!(c.add_ingredient(Ingredient::graded(items.raw_product, Grade::Good)));
    assert!(c.add_ingredient(Ingredient::graded(items.raw_product, Grade::Excellent)));

    (plant, reactor)
}

/// Run with the reactor held between 90 and 100.
fn run_regulated(
    plant: &mut Plant<Grade>,
    reactor: StationId,
    steps: u32,
) -> Vec<PlantEvent<Grade>> {
    let mut events = Vec::new();
    for _ in 0..steps {
        if let Some(r) = plant.thermal_mut(reactor) {
            let t = r.temperature_f64();
            if r.has_output() || t >= 100.0 {
                r.set_heating(false);
            } else if t <= 90.0 {
                r.set_heating(true);
            }
        }
        events.extend(plant.run(1, &mut (), &mut ()));
    }
    events
}

fn reloaded_ids(plant: &Plant<Grade>) -> Vec<StationId> {
    plant.ids().collect()
}

#[test]
fn reload_mid_batch_continues_identically() {
    let (registry, items) = line_registry();
    let catalog = presets::line_catalog(&items);

    let (mut straight, reactor) = busy_plant(&items);
    let straight_events = run_regulated(&mut straight, reactor, 1000);

    let (mut first, reactor) = busy_plant(&items);
    let before = run_regulated(&mut first, reactor, 300);
    let doc = first.save(&registry).unwrap();
    assert_eq!(doc.tick, 300);

    for decoded in [
        persist::from_json(&persist::to_json(&doc).unwrap()).unwrap(),
        persist::from_bytes(&persist::to_bytes(&doc).unwrap()).unwrap(),
    ] {
        assert_eq!(decoded, doc);
        let mut second = Plant::load(&decoded, &registry, &catalog).unwrap();
        assert_eq!(second.tick(), 300);
        let reactor = reloaded_ids(&second)[1];
        assert!(second.thermal(reactor).unwrap().is_processing());

        let mut events = before.clone();
        events.extend(run_regulated(&mut second, reactor, 700));

        // Station ids may differ after reload; compare what happened.
        let summary = |events: &[PlantEvent<Grade>]| -> Vec<(u8, Grade)> {
            events
                .iter()
                .filter_map(|e| match e {
                    PlantEvent::BatchCompleted { quality, .. } => Some((0, *quality)),
                    PlantEvent::ReactorCompleted { quality, .. } => Some((1, *quality)),
                    PlantEvent::StationDestroyed { .. } => None,
                })
                .collect()
        };
        assert_eq!(summary(&events), summary(&straight_events));
        assert_eq!(
            second.save(&registry).unwrap(),
            straight.save(&registry).unwrap()
        );
    }
}

#[test]
fn reload_survives_renumbered_registry() {
    let (registry, items) = line_registry();
    let (mut plant, reactor) = busy_plant(&items);
    run_regulated(&mut plant, reactor, 120);
    let doc = plant.save(&registry).unwrap();

    let mut builder = ItemRegistryBuilder::new();
    for name in LINE_ITEM_NAMES.iter().rev() {
        builder.register(name).unwrap();
    }
    let renumbered = builder.build();
    let renumbered_items = LineItems::from_registry(&renumbered).unwrap();
    assert_ne!(renumbered_items, items);

    let catalog = presets::line_catalog(&renumbered_items);
    let reloaded = Plant::load(&doc, &renumbered, &catalog).unwrap();
    assert_eq!(reloaded.save(&renumbered).unwrap(), doc);

    let mixer = reloaded.batch(reloaded_ids(&reloaded)[0]).unwrap();
    assert_eq!(mixer.slots()[0].inputs()[0].item, renumbered_items.base_reagent);
}

#[test]
fn corrupt_slot_resets_only_that_slot() {
    let (registry, items) = line_registry();
    let catalog = presets::line_catalog(&items);
    let (mut plant, reactor) = busy_plant(&items);
    run_regulated(&mut plant, reactor, 50);

    let mut doc: PlantDocument = plant.save(&registry).unwrap();
    let StationDocument::Batch(mixer) = &mut doc.stations[0] else {
        panic!("first station is the mixer");
    };
    mixer.slots[2].inputs[1].item = "unobtainium".to_string();
    let StationDocument::Thermal(reactor_doc) = &mut doc.stations[1] else {
        panic!("second station is the reactor");
    };
    reactor_doc.input.as_mut().unwrap().quality = Some("mythic".to_string());

    let reloaded = Plant::load(&doc, &registry, &catalog).unwrap();
    let ids = reloaded_ids(&reloaded);

    let mixer = reloaded.batch(ids[0]).unwrap();
    assert!(mixer.slots()[2].is_empty());
    for i in [0, 1, 3] {
        assert_eq!(mixer.slots()[i].stage(), 3);
        assert_eq!(mixer.slots()[i].elapsed(), 50);
    }

    // An unknown quality name falls back to the bottom tier, keeping the batch.
    let reactor = reloaded.thermal(ids[1]).unwrap();
    assert!(reactor.has_batch());
    assert_eq!(reactor.input_quality(), Some(Grade::Poor));
}

#[test]
fn unknown_station_and_truncated_snapshot_are_errors() {
    let (registry, items) = line_registry();
    let (plant, _) = busy_plant(&items);
    let doc = plant.save(&registry).unwrap();

    let full = presets::line_catalog(&items);
    let mut batch_only = StationCatalog::new();
    for cfg in full.batch_configs() {
        batch_only.insert_batch(cfg.clone());
    }
    assert!(matches!(
        Plant::load(&doc, &registry, &batch_only),
        Err(PersistError::UnknownStation(name)) if name == "reduction_reactor"
    ));

    let bytes = persist::to_bytes(&doc).unwrap();
    assert!(matches!(
        persist::from_bytes(&bytes[..bytes.len() / 2]),
        Err(PersistError::Decode(_))
    ));
    assert!(persist::from_json("{ not json").is_err());
}
