use std::path::Path;

use crate::config::PromptStyle;

/// Code-fence language for a file, derived from its extension.
pub fn fence_language(path: &Path) -> &str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "";
    };

    match ext.to_ascii_lowercase().as_str() {
        "kt" | "kts" => "kotlin",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "rs" => "rust",
        "py" => "python",
        "java" => "java",
        "go" => "go",
        "swift" => "swift",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        _ => ext,
    }
}

/// Human-readable language name for the detailed template.
fn display_language(fence: &str) -> &str {
    match fence {
        "kotlin" => "Kotlin",
        "typescript" => "TypeScript",
        "javascript" => "JavaScript",
        "rust" => "Rust",
        "python" => "Python",
        "java" => "Java",
        "csharp" => "C#",
        "cpp" => "C++",
        "" => "source",
        other => other,
    }
}

/// Build the documentation request for an already truncated code snippet.
pub fn documentation_prompt(style: PromptStyle, fence: &str, code: &str) -> String {
    match style {
        PromptStyle::Brief => format!("Generate documentation for:\n\n```{fence}\n{code}\n```"),
        PromptStyle::Detailed => {
            let language = display_language(fence);
            format!(
                r#"Generate detailed documentation for the following {language} code using the standard format:

## Overview
Provide a brief description of what the code does.

## Signature
Format the main function or type signatures as a code block.

## Parameters
List all parameters with descriptions.

## Return Value
Describe the return type and what it represents.

## Functionality
Break down the key steps.

## Usage Example
Provide a sample {language} usage example.

Here is the code:

```{fence}
{code}
```"#
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_language_known_extensions() {
        assert_eq!(fence_language(Path::new("a/Main.kt")), "kotlin");
        assert_eq!(fence_language(Path::new("a/app.ts")), "typescript");
        assert_eq!(fence_language(Path::new("a/app.JS")), "javascript");
        assert_eq!(fence_language(Path::new("lib.rs")), "rust");
    }

    #[test]
    fn test_fence_language_fallbacks() {
        assert_eq!(fence_language(Path::new("query.sql")), "sql");
        assert_eq!(fence_language(Path::new("Makefile")), "");
    }

    #[test]
    fn test_brief_prompt_embeds_code() {
        let prompt = documentation_prompt(PromptStyle::Brief, "javascript", "const a = 1;");
        assert_eq!(
            prompt,
            "Generate documentation for:\n\n```javascript\nconst a = 1;\n```"
        );
    }

    #[test]
    fn test_detailed_prompt_sections() {
        let prompt = documentation_prompt(PromptStyle::Detailed, "kotlin", "fun add() = 1");
        assert!(prompt.contains("following Kotlin code"));
        assert!(prompt.contains("## Overview"));
        assert!(prompt.contains("## Usage Example"));
        assert!(prompt.contains("Provide a sample Kotlin usage example."));
        assert!(prompt.ends_with("```kotlin\nfun add() = 1\n```"));
    }

    #[test]
    fn test_detailed_prompt_without_language() {
        let prompt = documentation_prompt(PromptStyle::Detailed, "", "x");
        assert!(prompt.contains("following source code"));
        assert!(prompt.ends_with("```\nx\n```"));
    }
}
