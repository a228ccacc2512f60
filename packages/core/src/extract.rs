// ABOUTME: Code extraction from free-text model output
// ABOUTME: Pulls the first fenced block out of a completion and detects the export slot

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Fence whose opening line may carry a language hint (```tsx, ```javascript, ...)
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[\w+.#-]*[^\S\r\n]*\r?\n(.*?)```").unwrap();

    /// Fence written on one line, e.g. ```const x = 1```
    static ref INLINE_FENCE: Regex = Regex::new(r"(?s)```(.*?)```").unwrap();

    static ref EXPORT_SLOT_ASSIGNMENT: Regex =
        Regex::new(r"\b(?:module\.)?exports\.default\s*=").unwrap();
}

/// Extract the code block from a model response.
///
/// Returns the trimmed contents of the first fenced block, or the whole
/// trimmed text when there is none. Never fails.
pub fn extract_code(text: &str) -> String {
    if let Some(caps) = FENCED_BLOCK.captures(text) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = INLINE_FENCE.captures(text) {
        return caps[1].trim().to_string();
    }
    text.trim().to_string()
}

/// Whether the module assigns its component to the conventional export slot
pub fn has_export_slot(code: &str) -> bool {
    EXPORT_SLOT_ASSIGNMENT.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_tagged_fence() {
        let text = "Here you go:\n```tsx\nconst App = () => null;\nmodule.exports.default = App;\n```\nEnjoy!";
        assert_eq!(
            extract_code(text),
            "const App = () => null;\nmodule.exports.default = App;"
        );
    }

    #[test]
    fn test_extracts_untagged_fence() {
        let text = "```\n  let x = 1;  \n```";
        assert_eq!(extract_code(text), "let x = 1;");
    }

    #[test]
    fn test_first_fence_wins() {
        let text = "```js\nfirst\n```\nand\n```js\nsecond\n```";
        assert_eq!(extract_code(text), "first");
    }

    #[test]
    fn test_inline_fence() {
        assert_eq!(extract_code("```const x = 1;```"), "const x = 1;");
    }

    #[test]
    fn test_no_fence_returns_trimmed_text() {
        let text = "\n\n  function App() {}\n  ";
        assert_eq!(extract_code(text), "function App() {}");
    }

    #[test]
    fn test_unclosed_fence_degrades_to_full_text() {
        let text = "```jsx\nconst A = 1;";
        assert_eq!(extract_code(text), text);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_code(""), "");
    }

    #[test]
    fn test_export_slot_detection() {
        assert!(has_export_slot("module.exports.default = Counter;"));
        assert!(has_export_slot("exports.default=Counter"));
        assert!(!has_export_slot("export default Counter;"));
        assert!(!has_export_slot("const Counter = () => null;"));
    }
}
