//! Application service — per-field attribute assignment.
//!
//! Every field gets exactly one attempt, in column order. A failed field is
//! recorded and logged; it never stops the fields after it.

use crate::application::ports::{AttributeWriter, SyncReporter};
use crate::domain::{ApplyOutcome, EntityHandle, FieldOutcome, LogLine};

/// Assign each `(field, value)` pair to `entity`.
///
/// Emits an `Assigning` line before each attempt and a `FieldFailed` line
/// after each failure. Returns one [`FieldOutcome`] per pair.
pub async fn apply_fields(
    writer: &impl AttributeWriter,
    entity: &EntityHandle,
    fields: &[(String, String)],
    reporter: &impl SyncReporter,
) -> Vec<FieldOutcome> {
    let mut outcomes = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        reporter.log(&LogLine::Assigning {
            machine: entity.name.clone(),
            field: field.clone(),
            value: value.clone(),
        });

        let outcome = match writer.set_custom_value(entity, field, value).await {
            Ok(()) => ApplyOutcome::Applied,
            Err(e) => {
                tracing::debug!(machine = %entity.name, %field, error = %e, "field rejected");
                reporter.log(&LogLine::FieldFailed {
                    machine: entity.name.clone(),
                    field: field.clone(),
                    reason: e.reason.clone(),
                });
                ApplyOutcome::Failed(e.reason)
            }
        };

        outcomes.push(FieldOutcome {
            field: field.clone(),
            value: value.clone(),
            outcome,
        });
    }
    outcomes
}
