//! Target-surface wrappers applied as the very last step.

use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Assistant front-ends with a known prompt convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Cursor,
    Copilot,
    Claude,
    ChatGpt,
}

impl Surface {
    pub const ALL: [Surface; 4] = [
        Surface::Cursor,
        Surface::Copilot,
        Surface::Claude,
        Surface::ChatGpt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Copilot => "copilot",
            Self::Claude => "claude",
            Self::ChatGpt => "chatgpt",
        }
    }

    pub fn wrap(&self, prompt: &str) -> String {
        match self {
            Self::Cursor => format!(
                "@codebase\n\n{prompt}\n\nApply the changes directly to the files named above."
            ),
            Self::Copilot => format!(
                "#workspace\n\n{prompt}\n\nReply with the complete contents of each changed file."
            ),
            Self::Claude => format!(
                "<instructions>\n{prompt}\n</instructions>\n\n\
                 Read every rule above before writing code. Return complete files, \
                 each in its own code block headed by its path."
            ),
            Self::ChatGpt => format!(
                "Follow these instructions exactly.\n\n{prompt}\n\n\
                 Respond only with code blocks, one per file, each starting with a path comment."
            ),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cursor" => Ok(Self::Cursor),
            "copilot" => Ok(Self::Copilot),
            "claude" => Ok(Self::Claude),
            "chatgpt" | "chat-gpt" | "openai" => Ok(Self::ChatGpt),
            other => Err(format!("unknown surface '{other}'")),
        }
    }
}

/// Wrap `prompt` for the named surface. Unknown names pass the prompt through.
pub fn wrap(surface: &str, prompt: &str) -> String {
    match surface.parse::<Surface>() {
        Ok(surface) => surface.wrap(prompt),
        Err(_) => {
            debug!(surface, "Unknown surface, prompt passed through unchanged");
            prompt.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_surfaces_wrap_the_prompt() {
        for surface in Surface::ALL {
            let wrapped = wrap(surface.as_str(), "BODY");
            assert!(wrapped.contains("BODY"));
            assert_ne!(wrapped, "BODY", "{surface} did not wrap");
        }
    }

    #[test]
    fn claude_uses_instruction_tags() {
        let wrapped = wrap("Claude", "do it");
        assert!(wrapped.starts_with("<instructions>\ndo it\n</instructions>"));
    }

    #[test]
    fn unknown_surface_passes_through() {
        assert_eq!(wrap("notepad", "unchanged"), "unchanged");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("CURSOR".parse::<Surface>(), Ok(Surface::Cursor));
        assert_eq!("chat-gpt".parse::<Surface>(), Ok(Surface::ChatGpt));
        assert!("vim".parse::<Surface>().is_err());
    }
}
