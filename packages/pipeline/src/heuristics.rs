// ABOUTME: Deterministic local checks that can veto any remote judgment
// ABOUTME: Export slot, import statements, network, storage, and host-global access

use lazy_static::lazy_static;
use regex::Regex;

use adapt_core::{has_export_slot, Issue};

lazy_static! {
    static ref IMPORT_STATEMENT: Regex =
        Regex::new(r#"(?m)^\s*import\s+(?:[\w*{$]|["'])"#).unwrap();
    static ref NETWORK_CALL: Regex = Regex::new(
        r"\bfetch\s*\(|\bXMLHttpRequest\b|\bWebSocket\b|\bEventSource\b|\bsendBeacon\b"
    )
    .unwrap();
    static ref PERSISTENT_STORAGE: Regex =
        Regex::new(r"\b(?:localStorage|sessionStorage|indexedDB)\b").unwrap();
    static ref HOST_GLOBAL: Regex = Regex::new(r"\b(?:document|window|globalThis)\b").unwrap();
    static ref DYNAMIC_CODE: Regex =
        Regex::new(r"\.\s*constructor\s*\.\s*constructor\b|\bFunction\s*\(|\beval\s*\(").unwrap();
}

pub const MISSING_EXPORT_MESSAGE: &str =
    "Missing default export (module.exports.default = Component).";

/// Every local finding for `code`, in a stable order
pub fn heuristic_issues(code: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !has_export_slot(code) {
        issues.push(Issue::syntax(MISSING_EXPORT_MESSAGE));
    }
    if IMPORT_STATEMENT.is_match(code) {
        issues.push(Issue::syntax(
            "Contains import statements. Only the injected React binding is available.",
        ));
    }
    if let Some(hit) = NETWORK_CALL.find(code) {
        issues.push(Issue::security(format!(
            "Contains {}. Network calls are disallowed in the sandbox.",
            hit.as_str().trim_end_matches(|c: char| c == '(' || c.is_whitespace())
        )));
    }
    if let Some(hit) = PERSISTENT_STORAGE.find(code) {
        issues.push(Issue::security(format!(
            "Uses {}, which is disallowed.",
            hit.as_str()
        )));
    }
    if let Some(hit) = HOST_GLOBAL.find(code) {
        issues.push(Issue::security(format!(
            "Direct {} access found.",
            hit.as_str()
        )));
    }

    if DYNAMIC_CODE.is_match(code) {
        issues.push(Issue::security(
            "Evaluates code from strings, which is disallowed.",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::IssueKind;
    use pretty_assertions::assert_eq;

    const CLEAN: &str = "const { useState } = React;\nconst A = () => React.createElement('div', null, 'hi');\nmodule.exports.default = A;";

    #[test]
    fn test_clean_module_has_no_findings() {
        assert!(heuristic_issues(CLEAN).is_empty());
    }

    #[test]
    fn test_missing_export_is_syntax() {
        let issues = heuristic_issues("const A = () => null;");
        assert_eq!(issues, vec![Issue::syntax(MISSING_EXPORT_MESSAGE)]);
    }

    #[test]
    fn test_imports_flagged() {
        let code = format!("import React from 'react';\n{}", CLEAN);
        let issues = heuristic_issues(&code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Syntax);

        // The word alone is not an import statement
        assert!(heuristic_issues(&format!("// important\n{}", CLEAN)).is_empty());
    }

    #[test]
    fn test_network_calls_flagged() {
        for snippet in [
            "fetch('/api')",
            "fetch ('/api')",
            "new XMLHttpRequest()",
            "new WebSocket(url)",
            "new EventSource(url)",
            "navigator.sendBeacon(url)",
        ] {
            let code = format!("{}\n{}", snippet, CLEAN);
            let issues = heuristic_issues(&code);
            assert_eq!(issues.len(), 1, "{}", snippet);
            assert_eq!(issues[0].kind, IssueKind::Security, "{}", snippet);
        }
        assert_eq!(
            heuristic_issues(&format!("fetch ('/api')\n{}", CLEAN))[0].message,
            "Contains fetch. Network calls are disallowed in the sandbox."
        );
    }

    #[test]
    fn test_storage_and_globals_flagged() {
        let code = format!("localStorage.setItem('a', 1); window.alert(1);\n{}", CLEAN);
        let issues = heuristic_issues(&code);
        assert_eq!(
            issues,
            vec![
                Issue::security("Uses localStorage, which is disallowed."),
                Issue::security("Direct window access found."),
            ]
        );
    }

    #[test]
    fn test_dynamic_code_flagged() {
        for snippet in [
            "this.constructor.constructor('return process')()",
            "({}).constructor .constructor('return 1')",
            "new Function('return 1')",
            "eval('1 + 1')",
        ] {
            let code = format!("{}\n{}", snippet, CLEAN);
            assert_eq!(
                heuristic_issues(&code),
                vec![Issue::security("Evaluates code from strings, which is disallowed.")],
                "{}",
                snippet
            );
        }

        let code = format!("const isFn = typeof x === 'function'; const c = a.constructor;\n{}", CLEAN);
        assert!(heuristic_issues(&code).is_empty());
    }

    #[test]
    fn test_identifier_substrings_not_flagged() {
        let code = format!("const windowSize = 3; const prefetch = 1;\n{}", CLEAN);
        assert!(heuristic_issues(&code).is_empty());
    }
}
