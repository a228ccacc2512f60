// ABOUTME: Rendered system contracts shared by generator, repairer, and validator
// ABOUTME: Fills prompt parameters from the module contract constants

use adapt_core::constants::{injected_hooks_list, EXPORT_SLOT, UI_LIBRARY_BINDING};
use adapt_prompts::{PromptError, PromptManager, SystemPrompt};

#[derive(Debug, Clone, PartialEq)]
pub struct SystemContracts {
    pub generator: String,
    pub repairer: String,
    pub validator: String,
}

impl SystemContracts {
    pub fn load(manager: &mut PromptManager) -> Result<Self, PromptError> {
        let hooks = injected_hooks_list();
        let params = [
            ("ui_binding", UI_LIBRARY_BINDING),
            ("hooks", hooks.as_str()),
            ("export_slot", EXPORT_SLOT),
        ];

        Ok(Self {
            generator: manager.system_prompt(SystemPrompt::Generator, &params)?,
            repairer: manager.system_prompt(SystemPrompt::Repairer, &params)?,
            validator: manager.system_prompt(SystemPrompt::Validator, &params)?,
        })
    }

    pub fn embedded() -> Result<Self, PromptError> {
        Self::load(&mut PromptManager::embedded())
    }
}
