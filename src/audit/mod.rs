// Audit trail: structural snapshot diffing and best-effort recording

pub mod diff;
pub mod recorder;

pub use diff::{diff, diff_json, to_document, AuditDelta, Document};
pub use recorder::{AuditRecorder, AuditStore, InMemoryAuditStore};
