//! Secret-field redaction.
//!
//! Sensitive fields keep their place in a change set but lose their values:
//! each side becomes `null` when blank and the `[FILTERED]` sentinel
//! otherwise. The two sides are judged independently, so a password set for
//! the first time reads `[null, "[FILTERED]"]`.

use std::collections::BTreeSet;

use mise_config::AuditConfig;
use mise_core::change_set::{ChangeSet, FieldChange};
use mise_core::row::is_blank;
use serde_json::Value;

/// Sentinel substituted for non-blank sensitive values.
pub const REDACTED: &str = "[FILTERED]";

/// Field names that are always redacted.
pub const BUILTIN_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password_confirmation",
    "password_digest",
    "encrypted_password",
    "reset_password_token",
    "confirmation_token",
    "unlock_token",
    "authentication_token",
    "otp_secret",
    "secret",
    "api_key",
];

/// Set of field names whose values must never reach the audit log.
///
/// Matching is exact and case-sensitive. Built once at startup and shared
/// read-only behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
    fields: BTreeSet<String>,
}

impl RedactionPolicy {
    /// Built-in sensitive fields plus a runtime deny-list.
    pub fn new<I, S>(deny_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: BTreeSet<String> = BUILTIN_SENSITIVE_FIELDS
            .iter()
            .map(|f| (*f).to_string())
            .collect();
        fields.extend(deny_list.into_iter().map(Into::into));
        Self { fields }
    }

    /// Only the built-in sensitive fields.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(std::iter::empty::<String>())
    }

    /// Built-in fields plus `audit.filter_parameters`.
    #[must_use]
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.filter_parameters.iter().cloned())
    }

    #[must_use]
    pub fn is_sensitive(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Sensitive field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Replace sensitive values in a change set.
///
/// Pure: the input is untouched, the output has the same fields in the same
/// order, and applying it twice gives the same result as applying it once.
#[must_use]
pub fn redact(changes: &ChangeSet, policy: &RedactionPolicy) -> ChangeSet {
    changes
        .iter()
        .map(|change| {
            if policy.is_sensitive(&change.field) {
                FieldChange::new(change.field.clone(), mask(&change.old), mask(&change.new))
            } else {
                change.clone()
            }
        })
        .collect()
}

fn mask(value: &Value) -> Value {
    if is_blank(value) {
        Value::Null
    } else {
        Value::String(REDACTED.to_string())
    }
}
