// ABOUTME: Centralized system prompt management for Adapt
// ABOUTME: Loads JSON prompt documents (embedded or from a directory) and substitutes parameters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const EMBEDDED_GENERATOR: &str = include_str!("../system/generator.json");
const EMBEDDED_REPAIRER: &str = include_str!("../system/repairer.json");
const EMBEDDED_VALIDATOR: &str = include_str!("../system/validator.json");

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Failed to read prompt file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse prompt JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid prompt format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub version: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub category: String,
    pub template: String,
    pub parameters: Vec<String>,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PromptMetadata>,
}

/// The three fixed system contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPrompt {
    Generator,
    Repairer,
    Validator,
}

impl SystemPrompt {
    pub fn id(&self) -> &'static str {
        match self {
            SystemPrompt::Generator => "generator",
            SystemPrompt::Repairer => "repairer",
            SystemPrompt::Validator => "validator",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            SystemPrompt::Generator => EMBEDDED_GENERATOR,
            SystemPrompt::Repairer => EMBEDDED_REPAIRER,
            SystemPrompt::Validator => EMBEDDED_VALIDATOR,
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "generator" => Some(SystemPrompt::Generator),
            "repairer" => Some(SystemPrompt::Repairer),
            "validator" => Some(SystemPrompt::Validator),
            _ => None,
        }
    }
}

pub struct PromptManager {
    /// Directory whose `system/<id>.json` files override the embedded prompts
    prompts_dir: Option<PathBuf>,
    cache: HashMap<String, Prompt>,
}

impl PromptManager {
    /// Create a new PromptManager
    ///
    /// With `None`, only the prompts compiled into the binary are used.
    pub fn new(prompts_dir: Option<PathBuf>) -> Self {
        Self {
            prompts_dir,
            cache: HashMap::new(),
        }
    }

    /// PromptManager backed only by the embedded prompts
    pub fn embedded() -> Self {
        Self::new(None)
    }

    /// Get a prompt by ID with parameter substitution
    pub fn get_prompt(
        &mut self,
        prompt_id: &str,
        parameters: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let prompt = self.load_prompt(prompt_id)?;

        // Always validate required parameters, even if empty list provided
        substitute_parameters(&prompt.template, parameters, &prompt.parameters)
    }

    /// Render one of the system contracts
    pub fn system_prompt(
        &mut self,
        which: SystemPrompt,
        parameters: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        self.get_prompt(which.id(), parameters)
    }

    /// Get prompt metadata without substitution
    pub fn get_prompt_metadata(&mut self, prompt_id: &str) -> Result<Prompt, PromptError> {
        self.load_prompt(prompt_id)
    }

    /// Clear the prompt cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Load a prompt with caching; directory overrides win over embedded copies
    fn load_prompt(&mut self, prompt_id: &str) -> Result<Prompt, PromptError> {
        if let Some(prompt) = self.cache.get(prompt_id) {
            return Ok(prompt.clone());
        }

        let prompt = match self.override_path(prompt_id) {
            Some(path) => load_prompt_from_path(&path)?,
            None => {
                let which = SystemPrompt::from_id(prompt_id)
                    .ok_or_else(|| PromptError::NotFound(prompt_id.to_string()))?;
                parse_prompt(which.embedded(), prompt_id)?
            }
        };

        self.cache.insert(prompt_id.to_string(), prompt.clone());
        Ok(prompt)
    }

    fn override_path(&self, prompt_id: &str) -> Option<PathBuf> {
        let dir = self.prompts_dir.as_ref()?;
        let path = dir.join("system").join(format!("{}.json", prompt_id));
        path.exists().then_some(path)
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Substitute `{{parameter}}` placeholders in a template
fn substitute_parameters(
    template: &str,
    parameters: &[(&str, &str)],
    required_params: &[String],
) -> Result<String, PromptError> {
    let param_map: HashMap<&str, &str> = parameters.iter().copied().collect();

    for required in required_params {
        if !param_map.contains_key(required.as_str()) {
            return Err(PromptError::MissingParameter(required.clone()));
        }
    }

    let mut result = template.to_string();
    for (key, value) in parameters {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    Ok(result)
}

fn load_prompt_from_path(path: &Path) -> Result<Prompt, PromptError> {
    let content = fs::read_to_string(path)?;
    parse_prompt(&content, &path.display().to_string())
}

fn parse_prompt(content: &str, source: &str) -> Result<Prompt, PromptError> {
    let prompt: Prompt = serde_json::from_str(content)?;

    if prompt.id.is_empty() || prompt.template.is_empty() || prompt.category.is_empty() {
        return Err(PromptError::InvalidFormat(format!(
            "Invalid prompt format in {}",
            source
        )));
    }

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &[(&str, &str)] = &[
        ("ui_binding", "React"),
        ("hooks", "useState, useEffect"),
        ("export_slot", "module.exports.default"),
    ];

    #[test]
    fn test_embedded_system_prompts_render() {
        let mut manager = PromptManager::embedded();
        for which in [
            SystemPrompt::Generator,
            SystemPrompt::Repairer,
            SystemPrompt::Validator,
        ] {
            let prompt = manager.system_prompt(which, PARAMS).unwrap();
            assert!(prompt.contains("module.exports.default"), "{}", which.id());
            assert!(!prompt.contains("{{"), "unfilled placeholder in {}", which.id());
        }
    }

    #[test]
    fn test_generator_prompt_lists_hooks() {
        let mut manager = PromptManager::embedded();
        let prompt = manager.system_prompt(SystemPrompt::Generator, PARAMS).unwrap();
        assert!(prompt.contains("const { useState, useEffect } = React;"));
        assert!(prompt.contains("Do NOT import anything"));
    }

    #[test]
    fn test_validator_prompt_requests_json() {
        let mut manager = PromptManager::embedded();
        let prompt = manager.system_prompt(SystemPrompt::Validator, PARAMS).unwrap();
        assert!(prompt.contains(r#"{"valid": boolean"#));

        let metadata = manager.get_prompt_metadata("validator").unwrap();
        assert!(metadata.output_schema.is_some());
    }

    #[test]
    fn test_missing_parameter_error() {
        let mut manager = PromptManager::embedded();
        let result = manager.get_prompt("generator", &[("hooks", "useState")]);
        assert!(matches!(result, Err(PromptError::MissingParameter(_))));
    }

    #[test]
    fn test_prompt_not_found() {
        let mut manager = PromptManager::embedded();
        let result = manager.get_prompt("nonexistent", PARAMS);
        assert!(matches!(result, Err(PromptError::NotFound(_))));
    }

    #[test]
    fn test_directory_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("system")).unwrap();
        fs::write(
            dir.path().join("system").join("repairer.json"),
            r#"{"id":"repairer","name":"Custom","category":"system","template":"Fix it using {{hooks}}","parameters":["hooks"]}"#,
        )
        .unwrap();

        let mut manager = PromptManager::new(Some(dir.path().to_path_buf()));
        let prompt = manager
            .system_prompt(SystemPrompt::Repairer, &[("hooks", "useRef")])
            .unwrap();
        assert_eq!(prompt, "Fix it using useRef");

        // Prompts without an override still come from the embedded set
        let generator = manager.system_prompt(SystemPrompt::Generator, PARAMS).unwrap();
        assert!(generator.contains("UI generator"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("system")).unwrap();
        fs::write(
            dir.path().join("system").join("validator.json"),
            r#"{"id":"validator","name":"Empty","category":"system","template":"","parameters":[]}"#,
        )
        .unwrap();

        let mut manager = PromptManager::new(Some(dir.path().to_path_buf()));
        let result = manager.get_prompt("validator", &[]);
        assert!(matches!(result, Err(PromptError::InvalidFormat(_))));
    }

    #[test]
    fn test_cache() {
        let mut manager = PromptManager::embedded();
        manager.get_prompt("generator", PARAMS).unwrap();

        let metadata = manager.get_prompt_metadata("generator").unwrap();
        assert_eq!(metadata.id, "generator");

        manager.clear_cache();
        let prompt = manager.get_prompt("generator", PARAMS).unwrap();
        assert!(prompt.contains("module.exports.default"));
    }
}
