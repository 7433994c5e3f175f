//! Serde roundtrip and JsonSchema validation tests for persisted and queued types.

use chrono::Utc;
use schemars::schema_for;
use serde_json::json;
use mise_core::change_set::{ChangeSet, FieldChange};
use mise_core::entities::AuditRecord;
use mise_core::enums::{ChangeType, EntityType};
use mise_core::payload::{AuditPayload, PAYLOAD_VERSION};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

fn diffs() -> ChangeSet {
    [
        FieldChange::new("name", json!("Old"), json!("New")),
        FieldChange::new("password_digest", json!("[FILTERED]"), json!("[FILTERED]")),
    ]
    .into_iter()
    .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

roundtrip_and_validate!(
    audit_record_roundtrip,
    AuditRecord,
    AuditRecord {
        id: "aud-a3f8b2c1".into(),
        record_type: EntityType::User,
        record_id: "usr-00000001".into(),
        user_id: Some("usr-00000002".into()),
        change_type: ChangeType::Update,
        version: 3,
        record_changes: diffs(),
        changed_fields: vec!["name".into(), "password_digest".into()],
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    audit_record_without_actor_roundtrip,
    AuditRecord,
    AuditRecord {
        id: "aud-00000000".into(),
        record_type: EntityType::Setting,
        record_id: "set-00000001".into(),
        user_id: None,
        change_type: ChangeType::Delete,
        version: 1,
        record_changes: [FieldChange::new("value", json!({"currency": "EUR"}), json!(null))]
            .into_iter()
            .collect(),
        changed_fields: vec!["value".into()],
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    audit_payload_roundtrip,
    AuditPayload,
    AuditPayload {
        v: PAYLOAD_VERSION,
        entity_type: EntityType::Reservation,
        entity_id: "rsv-0badf00d".into(),
        actor_id: None,
        change_type: ChangeType::Create,
        changed_fields: vec!["name".into(), "password_digest".into()],
        field_diffs: diffs(),
        captured_at: Utc::now(),
    }
);

#[test]
fn payload_schema_rejects_empty_changed_fields() {
    let schema = serde_json::to_value(schema_for!(AuditPayload)).unwrap();
    let instance = json!({
        "v": 1,
        "entity_type": "dish",
        "entity_id": "dsh-1",
        "actor_id": null,
        "change_type": "update",
        "changed_fields": [],
        "field_diffs": {},
        "captured_at": "2026-01-01T00:00:00Z"
    });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn payload_schema_rejects_unknown_entity_type() {
    let schema = serde_json::to_value(schema_for!(AuditPayload)).unwrap();
    let instance = json!({
        "v": 1,
        "entity_type": "spaceship",
        "entity_id": "x-1",
        "actor_id": null,
        "change_type": "update",
        "changed_fields": ["name"],
        "field_diffs": {"name": ["a", "b"]},
        "captured_at": "2026-01-01T00:00:00Z"
    });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}
