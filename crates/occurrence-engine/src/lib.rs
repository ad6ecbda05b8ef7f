//! # occurrence-engine
//!
//! Deterministic materialization of repeating team events into the concrete
//! occurrences a calendar shows on each day.
//!
//! A stored [`EventTemplate`] carries a start time, an optional cadence
//! (daily, weekly, monthly, yearly), an optional repetition count, an optional
//! end date and, for weekly events, optional weekdays. The engine expands it on
//! demand; occurrences are never cached or persisted.
//!
//! ## Modules
//!
//! - [`template`] — stored event definitions and lenient JSON loading
//! - [`occurrence`] — the derived per-day instances
//! - [`expander`] — template + date (or date range) → occurrences
//! - [`agenda`] — many templates grouped by calendar day
//! - [`inference`] — repeat-type fallback for legacy rows
//! - [`clock`] — injected current time
//! - [`options`] — calendar zone, DST policy and expansion cap
//! - [`dst`] — DST gap handling
//! - [`error`] — Error types

pub mod agenda;
pub mod clock;
pub mod dst;
pub mod error;
pub mod expander;
pub mod inference;
pub mod occurrence;
pub mod options;
pub mod template;

pub use agenda::agenda;
pub use clock::{Clock, FixedClock, SystemClock};
pub use dst::DstPolicy;
pub use error::{EngineError, Result};
pub use expander::{occurrences_between, occurrences_on_date};
pub use inference::{effective_repeat_type, infer_repeat_type};
pub use occurrence::EventOccurrence;
pub use options::{parse_date, parse_datetime, parse_timezone, ExpandOptions};
pub use template::{templates_from_json, EventTemplate, RepeatType};
