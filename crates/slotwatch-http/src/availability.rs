//! Availability response body parsing

use serde::Deserialize;
use serde_json::Value;
use slotwatch_core::{RawSlot, Snapshot};

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    availabilities: Option<Vec<DayAvailability>>,
}

#[derive(Debug, Deserialize)]
struct DayAvailability {
    #[serde(default)]
    slots: Option<Vec<Value>>,
}

/// Flatten an availability body into slots, day by day in response order.
///
/// A slot is either a bare timestamp string or an object carrying
/// `start_date` and an agenda id (directly or per step). Entries without a
/// usable start are kept with an empty start so the diff counts them as
/// malformed instead of silently dropping them.
pub fn parse_availabilities(body: &str) -> Result<Snapshot, serde_json::Error> {
    let response: AvailabilityResponse = serde_json::from_str(body)?;

    Ok(response
        .availabilities
        .unwrap_or_default()
        .into_iter()
        .flat_map(|day| day.slots.unwrap_or_default())
        .map(raw_slot)
        .collect())
}

fn raw_slot(value: Value) -> RawSlot {
    match &value {
        Value::String(start) => RawSlot {
            start: start.clone(),
            sub_id: None,
            metadata: value,
        },
        Value::Object(fields) => {
            let start = fields
                .get("start_date")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let sub_id = agenda_of(fields.get("agenda_id")).or_else(|| {
                let steps: Vec<String> = fields
                    .get("steps")
                    .and_then(Value::as_array)
                    .map(|steps| {
                        steps
                            .iter()
                            .filter_map(|step| agenda_of(step.get("agenda_id")))
                            .collect()
                    })
                    .unwrap_or_default();
                (!steps.is_empty()).then(|| steps.join("+"))
            });
            RawSlot {
                start,
                sub_id,
                metadata: value,
            }
        }
        _ => RawSlot {
            start: String::new(),
            sub_id: None,
            metadata: value,
        },
    }
}

fn agenda_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
