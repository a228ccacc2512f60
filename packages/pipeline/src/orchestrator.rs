// ABOUTME: Orchestrator state machine sequencing generate, validate, render, and repair
// ABOUTME: Bounded repair budget, epoch-guarded session commits, one audit record per cycle

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use adapt_ai::TextGeneration;
use adapt_config::AdaptConfig;
use adapt_core::constants::DEFAULT_MAX_ATTEMPTS;
use adapt_core::types::join_issue_messages;
use adapt_core::{
    CandidateModule, GenerateComponentRequest, Issue, RepairAttempt, RepairComponentRequest,
    RuntimeReport, SessionStatus,
};
use adapt_prompts::PromptManager;
use adapt_sandbox::{RenderBoundary, SandboxError};

use crate::audit::{AuditLog, AuditRecord};
use crate::contracts::SystemContracts;
use crate::error::{PipelineError, Result};
use crate::generator::{AiGenerator, ComponentGenerator};
use crate::repairer::{AiRepairer, ComponentRepairer};
use crate::session::{SessionCell, Superseded};
use crate::validator::{AiValidator, ComponentValidator};

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Repair cycles allowed per epoch
    pub max_attempts: u32,
    /// Props every candidate is mounted with
    pub render_props: serde_json::Value,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            render_props: serde_json::json!({}),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Succeeded { code: String },
    Failed(PipelineError),
    /// A newer prompt took over the session; nothing from this run was applied
    Superseded,
}

#[derive(Debug)]
pub struct RunReport {
    pub epoch: u64,
    pub outcome: RunOutcome,
    pub attempts: Vec<RepairAttempt>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded { .. })
    }

    /// Terminal status this run reached, `None` when superseded
    pub fn status(&self) -> Option<SessionStatus> {
        match self.outcome {
            RunOutcome::Succeeded { .. } => Some(SessionStatus::Succeeded),
            RunOutcome::Failed(_) => Some(SessionStatus::Failed),
            RunOutcome::Superseded => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Succeeded { code } => Some(code),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            RunOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// What the loop hands to the next repair cycle
struct RepairContext {
    working: String,
    issues: Vec<Issue>,
    runtime_error: Option<String>,
}

impl RepairContext {
    /// Text describing the current problem, as recorded in the audit log
    fn describe(&self, fallback: &str) -> String {
        if let Some(error) = self.runtime_error.as_deref().filter(|e| !e.is_empty()) {
            return error.to_string();
        }
        let joined = join_issue_messages(&self.issues);
        if joined.is_empty() {
            fallback.to_string()
        } else {
            joined
        }
    }

    fn request(&self) -> RepairComponentRequest {
        RepairComponentRequest {
            code: self.working.clone(),
            issues: self.issues.clone(),
            runtime_error: self.runtime_error.clone(),
        }
    }
}

fn cycle_summary(attempt: u32, max_attempts: u32, outcome: &str) -> String {
    if attempt >= max_attempts {
        format!("autofix attempts exhausted (attempt {} {})", attempt, outcome)
    } else {
        format!("autofix attempt {} {}", attempt, outcome)
    }
}

type Step<T> = std::result::Result<T, Superseded>;

pub struct Orchestrator {
    generator: Arc<dyn ComponentGenerator>,
    validator: Arc<dyn ComponentValidator>,
    repairer: Arc<dyn ComponentRepairer>,
    boundary: Arc<dyn RenderBoundary>,
    audit: AuditLog,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn ComponentGenerator>,
        validator: Arc<dyn ComponentValidator>,
        repairer: Arc<dyn ComponentRepairer>,
        boundary: Arc<dyn RenderBoundary>,
        audit: AuditLog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            validator,
            repairer,
            boundary,
            audit,
            config,
        }
    }

    /// Wire collaborator-backed generator, validator, and repairer from configuration
    pub fn from_config(
        config: &AdaptConfig,
        ai: Arc<dyn TextGeneration>,
        boundary: Arc<dyn RenderBoundary>,
        audit: AuditLog,
    ) -> Result<Self> {
        let mut prompts = PromptManager::new(config.prompts_dir.clone());
        let contracts = SystemContracts::load(&mut prompts)?;

        Ok(Self::new(
            Arc::new(AiGenerator::new(
                ai.clone(),
                &config.generation_model,
                config.temperature,
                contracts.generator,
            )),
            Arc::new(AiValidator::new(
                ai.clone(),
                &config.validation_model,
                contracts.validator,
            )),
            Arc::new(AiRepairer::new(
                ai,
                &config.generation_model,
                config.temperature,
                contracts.repairer,
            )),
            boundary,
            audit,
            OrchestratorConfig {
                max_attempts: config.max_attempts,
                ..OrchestratorConfig::default()
            },
        ))
    }

    pub fn generator(&self) -> &Arc<dyn ComponentGenerator> {
        &self.generator
    }

    pub fn validator(&self) -> &Arc<dyn ComponentValidator> {
        &self.validator
    }

    pub fn repairer(&self) -> &Arc<dyn ComponentRepairer> {
        &self.repairer
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one prompt to a terminal state in a fresh epoch
    pub async fn run(&self, session: &SessionCell, request: GenerateComponentRequest) -> RunReport {
        let epoch = session.begin();
        info!(epoch, "Starting generation");

        let mut attempts = Vec::new();
        let outcome = match self.drive(session, epoch, &request, &mut attempts).await {
            Ok(outcome) => outcome,
            Err(superseded) => {
                info!(
                    epoch,
                    current = superseded.current,
                    "Discarding results from superseded epoch"
                );
                RunOutcome::Superseded
            }
        };

        RunReport {
            epoch,
            outcome,
            attempts,
        }
    }

    async fn drive(
        &self,
        session: &SessionCell,
        epoch: u64,
        request: &GenerateComponentRequest,
        attempts: &mut Vec<RepairAttempt>,
    ) -> Step<RunOutcome> {
        let generated = self.generator.generate(request).await;
        let candidate = match generated {
            Ok(response) => CandidateModule::generated(response.code),
            Err(e) => {
                let record = AuditRecord::new(0, e.to_string(), "generation failed", false);
                return self.fail(session, epoch, e, Some(record)).await;
            }
        };
        session.set_status(epoch, SessionStatus::Validating)?;

        let validation = self.validator.validate(&candidate.code).await;
        let validation = match validation {
            Ok(validation) => validation,
            Err(e) => {
                let record =
                    AuditRecord::new(0, e.to_string(), "initial validation failed", false);
                return self.fail(session, epoch, e, Some(record)).await;
            }
        };
        session.update(epoch, |_| ())?;

        let mut context = RepairContext {
            working: candidate.code,
            issues: Vec::new(),
            runtime_error: None,
        };

        if validation.valid {
            match self.render_step(session, epoch, &context.working).await? {
                Ok(report) if report.is_ok() => {
                    let code = context.working;
                    let outcome = self.succeed(session, epoch, code)?;
                    self.audit
                        .record(AuditRecord::new(0, "none", "initial render succeeded", true))
                        .await;
                    return Ok(outcome);
                }
                Ok(report) => {
                    context.runtime_error = Some(fault_message(report));
                }
                Err(e) => {
                    let record = AuditRecord::new(0, e.to_string(), "sandbox unavailable", false);
                    return self
                        .fail(session, epoch, PipelineError::Sandbox(e), Some(record))
                        .await;
                }
            }
        } else {
            context.issues = validation.issues;
        }

        self.repair_loop(session, epoch, context, attempts).await
    }

    async fn repair_loop(
        &self,
        session: &SessionCell,
        epoch: u64,
        mut context: RepairContext,
        attempts: &mut Vec<RepairAttempt>,
    ) -> Step<RunOutcome> {
        let max_attempts = self.config.max_attempts;
        let mut last_error = context.describe("validation failed");

        for attempt in 1..=max_attempts {
            let described = context.describe("validator issues");
            session.update(epoch, |s| {
                s.status = SessionStatus::Repairing;
                s.attempt = attempt;
                s.last_error = Some(described.clone());
            })?;
            info!(epoch, attempt, "Repair attempt");

            let request = context.request();
            let repaired = self.repairer.repair(&request).await;
            session.update(epoch, |_| ())?;

            let patched = match repaired {
                Ok(code) if !code.trim().is_empty() => code,
                Ok(_) => context.working.clone(),
                Err(e) => {
                    warn!(epoch, attempt, "Repairer call failed: {}", e);
                    attempts.push(repair_attempt(attempt, &request, None));
                    self.audit
                        .record(AuditRecord::new(
                            attempt,
                            context.describe("debugger error"),
                            cycle_summary(attempt, max_attempts, "debugger error"),
                            false,
                        ))
                        .await;
                    last_error = e.to_string();
                    continue;
                }
            };
            attempts.push(repair_attempt(attempt, &request, Some(patched.clone())));
            let candidate = CandidateModule::repaired(patched, attempt);

            session.set_status(epoch, SessionStatus::Validating)?;
            let validation = self.validator.validate(&candidate.code).await;
            session.update(epoch, |_| ())?;

            let validation = match validation {
                Ok(validation) => validation,
                Err(e) => {
                    warn!(epoch, attempt, "Validator call failed: {}", e);
                    let message = context
                        .runtime_error
                        .clone()
                        .unwrap_or_else(|| e.to_string());
                    self.audit
                        .record(AuditRecord::new(
                            attempt,
                            message,
                            cycle_summary(attempt, max_attempts, "validator error"),
                            false,
                        ))
                        .await;
                    last_error = e.to_string();
                    continue;
                }
            };

            if !validation.valid {
                let message = context
                    .runtime_error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| {
                        let joined = validation.summary();
                        if joined.is_empty() {
                            "validation failed".to_string()
                        } else {
                            joined
                        }
                    });
                self.audit
                    .record(AuditRecord::new(
                        attempt,
                        message.clone(),
                        cycle_summary(attempt, max_attempts, "failed"),
                        false,
                    ))
                    .await;

                last_error = message;
                context = RepairContext {
                    working: candidate.code,
                    issues: validation.issues,
                    runtime_error: None,
                };
                continue;
            }

            match self.render_step(session, epoch, &candidate.code).await? {
                Ok(report) if report.is_ok() => {
                    let described = context.describe("validator issues");
                    let outcome = self.succeed(session, epoch, candidate.code)?;
                    self.audit
                        .record(AuditRecord::new(
                            attempt,
                            described,
                            format!("autofix attempt {} succeeded", attempt),
                            true,
                        ))
                        .await;
                    return Ok(outcome);
                }
                Ok(report) => {
                    let fault = fault_message(report);
                    warn!(epoch, attempt, "Repaired module failed to render: {}", fault);
                    self.audit
                        .record(AuditRecord::new(
                            attempt,
                            fault.clone(),
                            cycle_summary(attempt, max_attempts, "render error"),
                            false,
                        ))
                        .await;

                    last_error = fault.clone();
                    context = RepairContext {
                        working: candidate.code,
                        issues: Vec::new(),
                        runtime_error: Some(fault),
                    };
                }
                Err(e) => {
                    let record = AuditRecord::new(
                        attempt,
                        e.to_string(),
                        format!("autofix attempt {} sandbox unavailable", attempt),
                        false,
                    );
                    return self
                        .fail(session, epoch, PipelineError::Sandbox(e), Some(record))
                        .await;
                }
            }
        }

        // With a zero budget no cycle wrote the exhaustion record
        let record = (max_attempts == 0).then(|| {
            AuditRecord::new(0, last_error.clone(), "autofix attempts exhausted", false)
        });
        let exhausted = PipelineError::BudgetExhausted {
            attempts: max_attempts,
            last_error,
        };
        self.fail(session, epoch, exhausted, record).await
    }

    /// Mount `code`; a stale epoch on either side of the round-trip discards the result
    async fn render_step(
        &self,
        session: &SessionCell,
        epoch: u64,
        code: &str,
    ) -> Step<std::result::Result<RuntimeReport, SandboxError>> {
        session.update(epoch, |s| {
            s.status = SessionStatus::Rendering;
            s.current_code = Some(code.to_string());
        })?;

        let rendered = self
            .boundary
            .render(code, &self.config.render_props)
            .await
            .map(|output| output.report);

        session.update(epoch, |_| ())?;
        Ok(rendered)
    }

    fn succeed(&self, session: &SessionCell, epoch: u64, code: String) -> Step<RunOutcome> {
        session.update(epoch, |s| {
            s.status = SessionStatus::Succeeded;
            s.current_code = Some(code.clone());
            s.last_error = None;
        })?;
        info!(epoch, "Component rendered successfully");
        Ok(RunOutcome::Succeeded { code })
    }

    async fn fail(
        &self,
        session: &SessionCell,
        epoch: u64,
        error: PipelineError,
        record: Option<AuditRecord>,
    ) -> Step<RunOutcome> {
        let message = error.to_string();
        session.update(epoch, |s| {
            s.status = SessionStatus::Failed;
            s.current_code = None;
            s.last_error = Some(message.clone());
        })?;
        error!(epoch, "Generation failed: {}", message);

        if let Some(record) = record {
            self.audit.record(record).await;
        }
        Ok(RunOutcome::Failed(error))
    }
}

fn fault_message(report: RuntimeReport) -> String {
    report
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Runtime error".to_string())
}

fn repair_attempt(
    attempt: u32,
    request: &RepairComponentRequest,
    output_code: Option<String>,
) -> RepairAttempt {
    RepairAttempt {
        attempt_index: attempt,
        input_code: request.code.clone(),
        issues: request.issues.clone(),
        runtime_error: request.runtime_error.clone(),
        output_code,
        recorded_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cycle_summary_marks_exhaustion() {
        assert_eq!(cycle_summary(2, 5, "failed"), "autofix attempt 2 failed");
        assert_eq!(
            cycle_summary(5, 5, "failed"),
            "autofix attempts exhausted (attempt 5 failed)"
        );
    }

    #[test]
    fn test_context_description_prefers_runtime_error() {
        let context = RepairContext {
            working: String::new(),
            issues: vec![Issue::syntax("a"), Issue::syntax("b")],
            runtime_error: Some("boom".to_string()),
        };
        assert_eq!(context.describe("x"), "boom");

        let context = RepairContext {
            runtime_error: None,
            ..context
        };
        assert_eq!(context.describe("x"), "a | b");

        let context = RepairContext {
            issues: Vec::new(),
            ..context
        };
        assert_eq!(context.describe("x"), "x");
    }
}
