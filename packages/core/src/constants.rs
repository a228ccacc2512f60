// ABOUTME: Shared constants for the generated-module contract
// ABOUTME: Export slot, injected hook names, model ids, and loop defaults

/// Assignment every generated module must perform so the guest can find its component
pub const EXPORT_SLOT: &str = "module.exports.default";

/// Hook-like primitives generated code destructures from the injected UI library
pub const INJECTED_HOOKS: &[&str] = &["useState", "useEffect", "useMemo", "useRef"];

/// Name under which the UI runtime library is injected into generated code
pub const UI_LIBRARY_BINDING: &str = "React";

/// Model used for generation and repair
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";

/// Smaller model used for the remote semantic validation pass
pub const DEFAULT_VALIDATION_MODEL: &str = "llama-3.1-8b-instant";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Repair cycles allowed per epoch before the loop is declared failed
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Characters of code sent to the remote validator
pub const VALIDATION_PAYLOAD_LIMIT: usize = 6000;

/// Comma separated hook list as it appears in prompts: `useState, useEffect, ...`
pub fn injected_hooks_list() -> String {
    INJECTED_HOOKS.join(", ")
}
