//! Strip incidental markdown code fencing from raw model output.
//!
//! Models are told not to fence their answers but frequently do anyway. The
//! check here is a line heuristic, not a markdown parser: when the trimmed
//! reply is at least three lines long and opens with a fence, the first and
//! last lines are dropped. The closing line is not inspected and fences in
//! the middle of the reply are left alone.

/// Opening marker of a fenced code block.
const FENCE: &str = "```";

/// Return `raw` with a surrounding code fence removed, or `raw` unchanged
/// when it does not look fenced.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    if lines.len() >= 3 && lines[0].trim().starts_with(FENCE) {
        return lines[1..lines.len() - 1].join("\n");
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_language_tagged_fence() {
        let raw = "```javascript\nconsole.log(\"hi\");\nlet x = 1;\n```";
        assert_eq!(sanitize(raw), "console.log(\"hi\");\nlet x = 1;");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(sanitize("```\nbody\n```"), "body");
    }

    #[test]
    fn preserves_blank_lines_inside_body() {
        let raw = "```py\ndef f():\n\n    return 1\n```";
        assert_eq!(sanitize(raw), "def f():\n\n    return 1");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let raw = "\n\n   ```html\n<p>x</p>\n```  \n";
        assert_eq!(sanitize(raw), "<p>x</p>");
    }

    #[test]
    fn unfenced_text_passes_through_untouched() {
        let raw = "  <html>\n</html>\n";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn two_line_fence_is_left_alone() {
        let raw = "```\n```";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn does_not_check_closing_marker() {
        let raw = "```rust\nfn main() {}\n}";
        assert_eq!(sanitize(raw), "fn main() {}");
    }

    #[test]
    fn mid_content_fence_is_not_touched() {
        let raw = "# Readme\n```sh\nmake\n```\n";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "```js\nconst a = 1;\n```",
            "plain text",
            "",
            "line one\nline two\nline three",
            "```\nx\n```\n",
            "   padded   ",
        ];
        for raw in samples {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "not idempotent for {raw:?}");
        }
    }
}
