//! Markdown code-fence stripping for oracle replies.

const FENCE: &str = "```";

/// Return the program text inside a markdown code fence, or the reply as-is.
///
/// Handles a leading fence with an info string (```` ```python ````), a
/// missing closing fence, a single-line fenced reply, and prose surrounding
/// the first fenced block.
pub fn strip_code_fence(reply: &str) -> String {
    let trimmed = reply.trim();
    let Some(start) = trimmed.find(FENCE) else {
        return trimmed.to_string();
    };
    let after_open = &trimmed[start + FENCE.len()..];

    let Some(newline) = after_open.find('\n') else {
        // Single line: ```print(1)```
        return after_open.trim_end_matches('`').trim().to_string();
    };
    let body = &after_open[newline + 1..];
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reply_is_trimmed_only() {
        assert_eq!(strip_code_fence("  print(1)\n"), "print(1)");
    }

    #[test]
    fn strips_fence_with_language_tag() {
        let reply = "```python\na = int(input())\nprint(a)\n```";
        assert_eq!(strip_code_fence(reply), "a = int(input())\nprint(a)");
    }

    #[test]
    fn strips_fence_without_language_tag() {
        assert_eq!(strip_code_fence("```\nprint(2)\n```\n"), "print(2)");
    }

    #[test]
    fn tolerates_missing_closing_fence() {
        assert_eq!(strip_code_fence("```python\nprint(3)\n"), "print(3)");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(strip_code_fence("```print(4)```"), "print(4)");
    }

    #[test]
    fn extracts_first_block_from_prose() {
        let reply = "Here is the code:\n```python\nprint(5)\n```\nIt prints five.";
        assert_eq!(strip_code_fence(reply), "print(5)");
    }
}
