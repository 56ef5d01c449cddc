use chrono::{DateTime, SecondsFormat, Utc};
use role_common::{EntitySchema, Field};
use serde::Serialize;

use crate::domain::content::input::{DraftInput, ValidatedDraft};

/// Result of evaluating the publish requirements of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishChecklist {
    pub can_publish: bool,
    pub missing_fields: Vec<Field>,
    pub slug_conflict: bool,
    pub items: Vec<ChecklistItem>,
}

/// One line of the live checklist shown next to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub field: Field,
    /// false for a conditional rule whose condition does not hold
    pub required: bool,
    pub done: bool,
}

/// Pure check of `values` against the schema's publish rules.
///
/// Runs on every keystroke, so it never touches the network: slug
/// availability is passed in, already computed.
pub fn evaluate(schema: &EntitySchema, values: &DraftInput, slug_available: bool) -> PublishChecklist {
    let rules = &schema.publish;
    let mut items = Vec::with_capacity(rules.required.len() + rules.required_if.len());

    for field in rules.required.iter().copied() {
        items.push(ChecklistItem {
            field,
            required: true,
            done: values.is_set(field),
        });
    }

    for rule in rules.required_if.iter() {
        let required = values.is_set(rule.present);
        items.push(ChecklistItem {
            field: rule.field,
            required,
            done: !required || values.is_set(rule.field),
        });
    }

    let missing_fields: Vec<Field> = items
        .iter()
        .filter(|item| item.required && !item.done)
        .map(|item| item.field)
        .collect();
    let slug_conflict = !slug_available;

    PublishChecklist {
        can_publish: missing_fields.is_empty() && !slug_conflict,
        missing_fields,
        slug_conflict,
        items,
    }
}

/// Rounds start/end to the schema's granularity, if it has one.
pub fn round_schedule(schema: &EntitySchema, values: &mut DraftInput, validated: &ValidatedDraft) {
    let Some(minutes) = schema.publish.round_to_minutes else {
        return;
    };
    for (field, timestamp) in [(Field::StartAt, validated.start_at), (Field::EndAt, validated.end_at)] {
        if let Some(timestamp) = timestamp {
            let rounded = round_to_nearest(timestamp, minutes);
            values.set(field, rounded.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }
}

pub fn round_to_nearest(timestamp: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let step = i64::from(minutes) * 60;
    if step == 0 {
        return timestamp;
    }
    let seconds = timestamp.timestamp();
    let rounded = (seconds + step / 2).div_euclid(step) * step;
    DateTime::from_timestamp(rounded, 0).unwrap_or(timestamp)
}
