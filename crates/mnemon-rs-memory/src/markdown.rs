//! Markdown stripping for model-generated memory text.

use regex::Regex;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[\w+#.-]*[ \t]*\n)?(.*?)```").expect("code fence pattern")
});
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]+)+").expect("header pattern"));
static BOLD_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("bold pattern"));
static BOLD_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w_])__([^_\s](?:[^_\n]*[^_\s])?)__($|[^\w_])").expect("bold pattern")
});
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w*])\*([^*\s](?:[^*\n]*[^*\s])?)\*($|[^\w*])").expect("italic pattern")
});
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w_])_([^_\s](?:[^_\n]*[^_\s])?)_($|[^\w_])").expect("italic pattern")
});
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("inline code pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\([^)\n]*\)").expect("image pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\([^)\n]*\)").expect("link pattern"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*]|\d+\.)[ \t]+").expect("list pattern"));
static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$").expect("rule pattern")
});
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("newline pattern"));

/// Strip markdown markup from memory text, keeping plain prose.
///
/// Pipe characters are never treated as markup, so metadata suffixes such as
/// `"Igor is a CTO | Involving: Igor (CTO)"` pass through untouched. Italic
/// and underscore-bold markers are only removed when they are not glued to a
/// word character, which leaves identifiers like `my_variable_name` alone.
///
/// Every rewrite only deletes characters, so repeating the pass until the
/// text stops changing terminates, and the result is a fixed point:
/// `strip_markdown(&strip_markdown(x)) == strip_markdown(x)`.
pub fn strip_markdown(text: &str) -> String {
    let mut current = strip_pass(text);
    loop {
        let next = strip_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Apply every rewrite once, in order.
fn strip_pass(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "${1}");
    let text = HEADER.replace_all(&text, "");
    let text = BOLD_STAR.replace_all(&text, "${1}");
    let text = BOLD_UNDERSCORE.replace_all(&text, "${1}${2}${3}");
    let text = ITALIC_STAR.replace_all(&text, "${1}${2}${3}");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "${1}${2}${3}");
    let text = INLINE_CODE.replace_all(&text, "${1}");
    let text = IMAGE.replace_all(&text, "${1}");
    let text = LINK.replace_all(&text, "${1}");
    let text = LIST_MARKER.replace_all(&text, "");
    let text = HORIZONTAL_RULE.replace_all(&text, "");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::strip_markdown;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_headers_and_bold() {
        let stripped = strip_markdown("## Updated Knowledge\n\n**Key point**: Igor is CTO");
        assert_eq!(stripped.contains("##"), false);
        assert_eq!(stripped.contains("**"), false);
        assert!(stripped.contains("Key point: Igor is CTO"));
        assert_eq!(stripped, "Updated Knowledge\n\nKey point: Igor is CTO");
    }

    #[test]
    fn keeps_snake_case_identifiers() {
        assert_eq!(
            strip_markdown("use my_variable_name here"),
            "use my_variable_name here"
        );
        assert_eq!(strip_markdown("call __init__ twice"), "call init twice");
        assert_eq!(strip_markdown("the foo__bar__baz key"), "the foo__bar__baz key");
    }

    #[test]
    fn keeps_pipe_delimited_metadata() {
        let text = "Igor is a CTO | Involving: Igor (CTO)";
        assert_eq!(strip_markdown(text), text);
    }

    #[test]
    fn unwraps_code_fences_and_inline_code() {
        assert_eq!(
            strip_markdown("```python\nprint('hi')\n```"),
            "print('hi')"
        );
        assert_eq!(strip_markdown("```cargo build```"), "cargo build");
        assert_eq!(
            strip_markdown("run `cargo test` before pushing"),
            "run cargo test before pushing"
        );
    }

    #[test]
    fn removes_italics_links_and_images() {
        assert_eq!(
            strip_markdown("She *really* likes _green_ tea"),
            "She really likes green tea"
        );
        assert_eq!(
            strip_markdown("See [the docs](https://example.com) and ![diagram](d.png)"),
            "See the docs and diagram"
        );
        assert_eq!(strip_markdown("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn removes_list_markers_and_rules() {
        assert_eq!(
            strip_markdown("- first\n* second\n1. third"),
            "first\nsecond\nthird"
        );
        assert_eq!(strip_markdown("above\n\n---\n\nbelow"), "above\n\nbelow");
        assert_eq!(strip_markdown("a\n***\nb\n___\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn collapses_blank_lines_and_trims() {
        assert_eq!(strip_markdown("  one\n\n\n\n\ntwo  "), "one\n\ntwo");
        assert_eq!(strip_markdown(""), "");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "## Updated Knowledge\n\n**Key point**: Igor is CTO",
            "## # nested header",
            "***bold italic*** and **_mixed_**",
            "_a_ _b_ _c_",
            "- * nested bullet",
            "```\n```\n```",
            "Igor is a CTO | Involving: Igor (CTO)",
            "[**link**](url) `code` *x* __y__",
            "line\n\n\n\n- item\n\n\n---\n\n\ntail",
            "use my_variable_name here",
            "**unclosed bold and _unclosed italic",
        ];
        for sample in samples {
            let once = strip_markdown(sample);
            let twice = strip_markdown(&once);
            assert_eq!(twice, once, "not idempotent for {sample:?}");
        }
    }
}
