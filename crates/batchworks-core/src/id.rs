use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a station instance owned by a [`Plant`](crate::plant::Plant).
    ///
    /// Stations ticked outside a plant may use `StationId::default()`.
    pub struct StationId;
}

/// Identifies an item type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{Key, SlotMap};

    #[test]
    fn item_type_id_equality() {
        assert_eq!(ItemTypeId(3), ItemTypeId(3));
        assert_ne!(ItemTypeId(3), ItemTypeId(4));
    }

    #[test]
    fn default_station_id_is_null() {
        assert!(StationId::default().is_null());
    }

    #[test]
    fn station_ids_are_not_reused_after_removal() {
        let mut map: SlotMap<StationId, u8> = SlotMap::with_key();
        let a = map.insert(1);
        map.remove(a);
        let b = map.insert(2);
        assert_ne!(a, b);
        assert!(map.get(a).is_none());
    }
}
