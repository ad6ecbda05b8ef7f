//! WASM bindings for occurrence-engine.
//!
//! Exposes per-day occurrence expansion, agenda grouping and repeat-type
//! inference to the dashboard's JavaScript via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings using the dashboard's camelCase
//! field names (`startTime`, `isRepeat`, `repeatType`, `daysOfWeek`, ...).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p occurrence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/lib/occurrence-engine/ \
//!   target/wasm32-unknown-unknown/release/occurrence_engine_wasm.wasm
//! ```

use std::collections::BTreeMap;

use occurrence_engine::{
    Clock, EventOccurrence, EventTemplate, ExpandOptions, FixedClock, SystemClock,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Options JSON is optional; missing fields keep their defaults.
fn parse_options(options_json: Option<&str>) -> Result<ExpandOptions, String> {
    match options_json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(json) => {
            serde_json::from_str(json).map_err(|e| format!("Invalid options JSON: {}", e))
        }
        None => Ok(ExpandOptions::default()),
    }
}

/// A fixed clock when `now` is given, the system clock otherwise.
fn parse_clock(now: Option<&str>) -> Result<Box<dyn Clock>, String> {
    match now {
        Some(s) => occurrence_engine::parse_datetime(s)
            .map(|dt| Box::new(FixedClock(dt)) as Box<dyn Clock>)
            .map_err(|e| e.to_string()),
        None => Ok(Box::new(SystemClock)),
    }
}

fn parse_template(json: &str) -> Result<EventTemplate, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid template JSON: {}", e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// JSON-in / JSON-out operations
// ---------------------------------------------------------------------------

fn occurrences_on_date_json(
    template_json: &str,
    date: &str,
    options_json: Option<&str>,
    now: Option<&str>,
) -> Result<String, String> {
    let template = parse_template(template_json)?;
    let date = occurrence_engine::parse_date(date).map_err(|e| e.to_string())?;
    let options = parse_options(options_json)?;
    let clock = parse_clock(now)?;

    let occurrences = occurrence_engine::occurrences_on_date(&template, date, &options, &*clock);
    to_json(&occurrences)
}

fn occurrences_between_json(
    template_json: &str,
    from: &str,
    to: &str,
    options_json: Option<&str>,
    now: Option<&str>,
) -> Result<String, String> {
    let template = parse_template(template_json)?;
    let from = occurrence_engine::parse_date(from).map_err(|e| e.to_string())?;
    let to = occurrence_engine::parse_date(to).map_err(|e| e.to_string())?;
    let options = parse_options(options_json)?;
    let clock = parse_clock(now)?;

    let occurrences =
        occurrence_engine::occurrences_between(&template, from, to, &options, &*clock);
    to_json(&occurrences)
}

fn agenda_json(
    templates_json: &str,
    from: &str,
    to: &str,
    options_json: Option<&str>,
    now: Option<&str>,
) -> Result<String, String> {
    let templates =
        occurrence_engine::templates_from_json(templates_json).map_err(|e| e.to_string())?;
    let from = occurrence_engine::parse_date(from).map_err(|e| e.to_string())?;
    let to = occurrence_engine::parse_date(to).map_err(|e| e.to_string())?;
    let options = parse_options(options_json)?;
    let clock = parse_clock(now)?;

    let days: BTreeMap<String, Vec<EventOccurrence>> =
        occurrence_engine::agenda(&templates, from, to, &options, &*clock)
            .into_iter()
            .map(|(day, occurrences)| (day.to_string(), occurrences))
            .collect();
    to_json(&days)
}

fn infer_repeat_type_json(template_json: &str, now: Option<&str>) -> Result<String, String> {
    let template = parse_template(template_json)?;
    let clock = parse_clock(now)?;
    Ok(occurrence_engine::effective_repeat_type(&template, clock.now()).to_string())
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Occurrences of one template on a calendar day.
///
/// Returns a JSON array of occurrence objects.
///
/// # Arguments
/// - `template_json` -- one event template object
/// - `date` -- calendar day, `YYYY-MM-DD`
/// - `options_json` -- optional `{timezone, dstPolicy, maxInstances}`
/// - `now` -- optional ISO 8601 instant for the repeat-type fallback; the
///   system clock is used when omitted
#[wasm_bindgen(js_name = "occurrencesOnDate")]
pub fn occurrences_on_date(
    template_json: &str,
    date: &str,
    options_json: Option<String>,
    now: Option<String>,
) -> Result<String, JsValue> {
    occurrences_on_date_json(template_json, date, options_json.as_deref(), now.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Occurrences of one template between two calendar days, inclusive.
#[wasm_bindgen(js_name = "occurrencesBetween")]
pub fn occurrences_between(
    template_json: &str,
    from: &str,
    to: &str,
    options_json: Option<String>,
    now: Option<String>,
) -> Result<String, JsValue> {
    occurrences_between_json(
        template_json,
        from,
        to,
        options_json.as_deref(),
        now.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Occurrences of many templates grouped by day.
///
/// `templates_json` is a JSON array of templates. Returns a JSON object keyed
/// by `YYYY-MM-DD`, each value sorted by start time.
#[wasm_bindgen(js_name = "agenda")]
pub fn agenda(
    templates_json: &str,
    from: &str,
    to: &str,
    options_json: Option<String>,
    now: Option<String>,
) -> Result<String, JsValue> {
    agenda_json(
        templates_json,
        from,
        to,
        options_json.as_deref(),
        now.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// The repeat type a template expands with: stored, or inferred for legacy rows.
#[wasm_bindgen(js_name = "inferRepeatType")]
pub fn infer_repeat_type(template_json: &str, now: Option<String>) -> Result<String, JsValue> {
    infer_repeat_type_json(template_json, now.as_deref()).map_err(|e| JsValue::from_str(&e))
}
