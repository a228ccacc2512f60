// ABOUTME: Orchestration of the generate, validate, render, and repair loop
// ABOUTME: Collaborator seams, session epochs, heuristics, and the best-effort audit log

pub mod audit;
pub mod contracts;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod orchestrator;
pub mod repairer;
pub mod session;
pub mod validator;

pub use audit::{AuditError, AuditLog, AuditRecord, AuditSink, MemoryAuditSink, SqliteAuditSink};
pub use contracts::SystemContracts;
pub use error::{PipelineError, Result};
pub use generator::{AiGenerator, ComponentGenerator};
pub use heuristics::heuristic_issues;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, RunReport};
pub use repairer::{AiRepairer, ComponentRepairer};
pub use session::{SessionCell, Superseded};
pub use validator::{AiValidator, ComponentValidator};
