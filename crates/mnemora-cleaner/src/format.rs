//! Step 1 of the cleaner pipeline: turn a message list into the plain
//! transcript the classifier and emotion-scorer prompts embed.

use mnemora_llm::{Message, Role};

const MAX_TRANSCRIPT_CHARS: usize = 8000;

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// `role: content`, blank line between turns, truncated to ~8000 characters
/// (truncation keeps the *tail*, since the most recent turns are the most
/// relevant to what just happened).
pub fn format_transcript(messages: &[Message]) -> String {
    let full = messages
        .iter()
        .map(|m| format!("{}: {}", role_label(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    if full.chars().count() <= MAX_TRANSCRIPT_CHARS {
        return full;
    }

    let chars: Vec<char> = full.chars().collect();
    let start = chars.len() - MAX_TRANSCRIPT_CHARS;
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_role_and_content_with_blank_line_between_turns() {
        let messages = vec![
            Message {
                role: Role::User,
                content: "hi".to_string(),
            },
            Message {
                role: Role::Assistant,
                content: "hello".to_string(),
            },
        ];
        assert_eq!(format_transcript(&messages), "user: hi\n\nassistant: hello");
    }

    #[test]
    fn truncates_to_max_chars_keeping_the_tail() {
        let long_content = "x".repeat(10_000);
        let messages = vec![Message {
            role: Role::User,
            content: long_content,
        }];
        let formatted = format_transcript(&messages);
        assert_eq!(formatted.chars().count(), MAX_TRANSCRIPT_CHARS);
        assert!(formatted.chars().all(|c| c == 'x'));
    }
}
