//! Scheduling engine for the tempo calendar.
//!
//! Pure, synchronous computations over plain data: recurrence expansion,
//! conflict detection, day layout, drag rescheduling and focus-time
//! checks. Nothing here performs I/O or holds shared mutable state; the
//! hosting application owns storage and presentation and applies the
//! `Mutation` payloads this crate produces.
//!
//! Conflict detection and layout expect the instance set of a single
//! `expand_window` pass; never mix instances from different windows.

pub mod conflict;
pub mod error;
pub mod event;
pub mod focus;
pub mod layout;
pub mod mutation;
pub mod recurrence;
pub mod reschedule;

pub use conflict::{Conflict, ConflictSeverity};
pub use error::{ScheduleError, ScheduleResult};
pub use event::{instance_id, parse_instance_id, EventInstance, EventTemplate};
pub use focus::FocusBlock;
pub use layout::LaneAssignment;
pub use mutation::Mutation;
pub use recurrence::{Expansion, Frequency, RecurrenceRule, EXPANSION_CAP};
pub use reschedule::{DragPayload, ExceptionAdd, Reschedule, SNAP_MINUTES};
