use proptest::prelude::*;
use remisiones_migrate::record::{
    extract_services, extract_technicians, transform, LegacyRecord, LegacyStatusPolicy,
    MAX_SERVICE_SLOTS, MAX_TECHNICIAN_SLOTS,
};
use remisiones_migrate::FieldValue;
use serde_json::{Map, Value};

fn slot_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[A-Za-zñé ]{0,16}".prop_map(Value::String),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn record_fields() -> impl Strategy<Value = Map<String, Value>> {
    (
        proptest::collection::btree_map(0u32..=25, slot_value(), 0..10),
        proptest::collection::btree_map(0u32..=14, slot_value(), 0..6),
        proptest::option::of(slot_value()),
    )
        .prop_map(|(services, technicians, estado)| {
            let mut fields = Map::new();
            for (i, v) in services {
                fields.insert(format!("servicio{i}"), v);
            }
            for (i, v) in technicians {
                fields.insert(format!("tecnico{i}"), v);
            }
            if let Some(estado) = estado {
                fields.insert("estado".into(), estado);
            }
            fields
        })
}

proptest! {
    #[test]
    fn prop_extracted_items_are_usable_and_ordered(fields in record_fields()) {
        let record = LegacyRecord::from_fields("P", &fields);

        for (items, max) in [
            (extract_services(&record), MAX_SERVICE_SLOTS),
            (extract_technicians(&record), MAX_TECHNICIAN_SLOTS),
        ] {
            for item in &items {
                prop_assert!(!item.name.is_empty());
                prop_assert_eq!(item.name.trim(), item.name.as_str());
                prop_assert!((1..=max).contains(&item.ordinal));
            }
            prop_assert!(items.windows(2).all(|w| w[0].ordinal < w[1].ordinal));
        }
    }

    #[test]
    fn prop_every_stored_field_is_carried_or_superseded(fields in record_fields()) {
        let record = LegacyRecord::from_fields("P", &fields);
        let normalized = transform(&record, LegacyStatusPolicy::Delete);

        for key in fields.keys() {
            let carried = normalized.carried.contains_key(key);
            let superseded = normalized.superseded.contains(key);
            prop_assert!(carried != superseded, "key {} carried={} superseded={}", key, carried, superseded);
        }
    }

    #[test]
    fn prop_superseded_keys_are_deleted_in_payload(fields in record_fields()) {
        let record = LegacyRecord::from_fields("P", &fields);
        let normalized = transform(&record, LegacyStatusPolicy::Retain);
        let payload = normalized.to_payload(FieldValue::ServerTimestamp);

        for key in &normalized.superseded {
            prop_assert_eq!(payload.get(key), Some(&FieldValue::Delete));
        }
        prop_assert_eq!(
            payload.get("schemaVersion"),
            Some(&FieldValue::Value(Value::from("2.0")))
        );
    }
}
