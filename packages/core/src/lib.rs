// ABOUTME: Core types, contracts, and utilities for Adapt
// ABOUTME: Foundational package shared by the AI client, sandbox, pipeline, and API layers

pub mod constants;
pub mod contracts;
pub mod extract;
pub mod types;

// Re-export main types
pub use types::{
    CandidateModule, Issue, IssueKind, Provenance, RenderOutcome, RepairAttempt, RuntimeReport,
    Session, SessionStatus, ValidationResult,
};

// Re-export endpoint contracts
pub use contracts::{
    ContextItem, GenerateComponentRequest, GenerateComponentResponse, Mood,
    RepairComponentRequest, RepairComponentResponse, ValidateComponentRequest,
};

// Re-export utilities
pub use extract::{extract_code, has_export_slot};
