//! Utility modules for validation and in-memory collaborators

pub mod memory_ledger;
pub mod scripted_source;
pub mod validation;

pub use memory_ledger::MemoryLedger;
pub use scripted_source::ScriptedSyncSource;
