// Request gate: whitelist lookup and the ordered check pipeline

pub mod pipeline;
pub mod whitelist;

pub use pipeline::{AppIdentity, GateDecision, RouteGate, RequestView, Stage, PIPELINE};
pub use whitelist::{normalize_path, RouteFlags, Whitelist};
