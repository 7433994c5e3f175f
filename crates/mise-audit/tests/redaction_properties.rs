//! Property tests for secret-field redaction.

use mise_audit::{REDACTED, RedactionPolicy, redact};
use mise_core::change_set::{ChangeSet, FieldChange};
use proptest::prelude::*;
use serde_json::{Value, json};

// Strategy: scalar and small composite JSON values, blanks included
fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        prop::string::string_regex("[ a-zA-Z0-9]{0,12}")
            .unwrap()
            .prop_map(Value::String),
        Just(json!([])),
        Just(json!({})),
        Just(json!(["a", 1])),
        Just(json!({"k": "v"})),
    ]
}

// Strategy: field names drawn from sensitive and ordinary columns
fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password".to_string()),
        Just("password_digest".to_string()),
        Just("secret".to_string()),
        Just("api_key".to_string()),
        Just("name".to_string()),
        Just("email".to_string()),
        prop::string::string_regex("[a-z_]{1,10}").unwrap(),
    ]
}

fn arb_change_set() -> impl Strategy<Value = ChangeSet> {
    prop::collection::vec((arb_field(), arb_value(), arb_value()), 0..12).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(field, old, new)| FieldChange::new(field, old, new))
            .collect()
    })
}

fn is_masked(value: &Value) -> bool {
    value.is_null() || value == &json!(REDACTED)
}

proptest! {
    /// Property: redaction keeps every field, in the same order
    #[test]
    fn proptest_fields_and_order_preserved(changes in arb_change_set()) {
        let out = redact(&changes, &RedactionPolicy::builtin());
        prop_assert_eq!(out.fields(), changes.fields());
    }

    /// Property: sensitive sides are null or the sentinel, others untouched
    #[test]
    fn proptest_sensitive_values_never_leak(changes in arb_change_set()) {
        let policy = RedactionPolicy::builtin();
        let out = redact(&changes, &policy);
        for (before, after) in changes.iter().zip(out.iter()) {
            if policy.is_sensitive(&before.field) {
                prop_assert!(is_masked(&after.old));
                prop_assert!(is_masked(&after.new));
                prop_assert_eq!(after.old.is_null(), mise_core::row::is_blank(&before.old));
                prop_assert_eq!(after.new.is_null(), mise_core::row::is_blank(&before.new));
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    /// Property: applying redaction twice equals applying it once
    #[test]
    fn proptest_redaction_idempotent(changes in arb_change_set()) {
        let policy = RedactionPolicy::new(["email"]);
        let once = redact(&changes, &policy);
        prop_assert_eq!(redact(&once, &policy), once);
    }
}
