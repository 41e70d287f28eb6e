//! # keel-audit
//!
//! Audit trail of command lifecycle events.
//!
//! Every command produces a `COMMAND_RECEIVED` event and exactly one outcome
//! event. Sagas add one event per compensation they run.
//!
//! ## Event Types
//!
//! | Event Type | Description |
//! |------------|-------------|
//! | `CommandReceived` | A handler accepted the command |
//! | `CommandSucceeded` | Reply was SUCCEEDED |
//! | `TargetNotFound` | Target was already gone; reply was SUCCEEDED |
//! | `CommandFailed` | Reply was ERROR |
//! | `CommandIgnored` | No handler registered; no reply |
//! | `StepCompensated` | A saga compensation ran |
//! | `CompensationFailed` | A saga compensation failed; rollback continued |
//!
//! ## Storage
//!
//! - **File**: JSON Lines (one JSON object per line)
//! - **Console**: JSON on stdout
//! - **Memory**: queryable, used in tests
//! - **Null**: auditing disabled

pub mod error;
pub mod event;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType};
pub use logger::{AuditFilter, AuditLogger};
pub use storage::{
    AuditStorage, ConsoleStorage, DualStorage, FileStorage, MemoryStorage, NullStorage,
};
