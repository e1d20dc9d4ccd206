//! Extraction of a single JSON object out of a raw LLM reply.
//!
//! Models routinely wrap their JSON answer in prose or a markdown code
//! fence, or leave stray trailing text after the object. This is the one
//! place in the workspace permitted to pull a JSON object out of that noise
//! — callers (the cleaner's classifier, its emotion scorer, the emotion
//! judge) get a `serde_json::Value` or a `ParseError`, never raw text.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not extract a JSON object from the reply")]
pub struct ParseError;

/// Strip whitespace and a surrounding ``` / ```json fence, then try a strict
/// parse; on failure scan for balanced `{...}` substrings from longest to
/// shortest and return the first that parses.
pub fn extract_json_object(raw: &str) -> Result<serde_json::Value, ParseError> {
    let stripped = strip_fence(raw.trim());

    if let Ok(v) = serde_json::from_str::<serde_json::Value>(stripped) {
        return Ok(v);
    }

    for candidate in balanced_brace_substrings(stripped) {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(candidate) {
            return Ok(v);
        }
    }

    Err(ParseError)
}

fn strip_fence(s: &str) -> &str {
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```JSON"))
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s)
        .trim_start();
    s.strip_suffix("```").unwrap_or(s).trim()
}

/// Every substring delimited by a matching pair of top-level `{` `}`,
/// ordered longest first so the outermost (most complete) object wins.
fn balanced_brace_substrings(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();

    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' {
            continue;
        }
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset + 1;
                        out.push(&s[start..end]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    out.sort_by_key(|c| std::cmp::Reverse(c.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let v = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn recovers_from_surrounding_prose() {
        let raw = "Sure, here's the result: {\"a\": 1, \"b\": {\"c\": 2}} hope that helps!";
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["a"], 1);
        assert_eq!(v["b"]["c"], 2);
    }

    #[test]
    fn prefers_longest_balanced_object() {
        let raw = "noise {\"small\":1} more noise {\"big\":{\"nested\":true}} trailing";
        let v = extract_json_object(raw).unwrap();
        assert!(v.get("big").is_some());
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let raw = r#"{"summary": "a { stray brace"}"#;
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["summary"], "a { stray brace");
    }

    #[test]
    fn fails_on_total_garbage() {
        assert!(extract_json_object("not json at all, no braces here").is_err());
    }
}
