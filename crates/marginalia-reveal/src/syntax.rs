//! Literal markdown syntax for revealed constructs.
//!
//! Block markers (heading/quote/list prefixes and code fences) and inline
//! delimiters, built from focus descriptors.

use smol_str::{SmolStr, SmolStrBuilder, format_smolstr};

use crate::focus::{BlockquoteFocus, HeadingFocus, ListItemFocus};
use crate::tree::{ListKind, TextFormat, TextRun};

/// Closing code fence.
pub const CLOSE_FENCE: &str = "```";

/// `"#" × level` followed by a space.
pub fn heading_prefix(focus: &HeadingFocus) -> SmolStr {
    repeat_then_space('#', usize::from(focus.level))
}

/// `">" × depth` followed by a space.
pub fn quote_prefix(focus: &BlockquoteFocus) -> SmolStr {
    repeat_then_space('>', focus.depth)
}

/// Indent for nesting, then the bullet, number or checkbox.
pub fn list_prefix(focus: &ListItemFocus, indent: usize) -> SmolStr {
    let pad = " ".repeat(indent * focus.depth.saturating_sub(1));
    match focus.kind {
        ListKind::Bullet => format_smolstr!("{pad}- "),
        ListKind::Number => format_smolstr!("{pad}{}. ", focus.number()),
        ListKind::Check if focus.checked => format_smolstr!("{pad}- [x] "),
        ListKind::Check => format_smolstr!("{pad}- [ ] "),
    }
}

/// Opening fence with the language tag.
pub fn open_fence(language: &str) -> SmolStr {
    format_smolstr!("```{language}")
}

fn repeat_then_space(c: char, count: usize) -> SmolStr {
    let mut builder = SmolStrBuilder::new();
    for _ in 0..count {
        builder.push(c);
    }
    builder.push(' ');
    builder.finish()
}

/// Delimiters of the handled formats, outermost first.
const DELIMITERS: [(TextFormat, &str); 4] = [
    (TextFormat::STRIKETHROUGH, "~~"),
    (TextFormat::BOLD, "**"),
    (TextFormat::ITALIC, "*"),
    (TextFormat::CODE, "`"),
];

/// Opening delimiter for a format, e.g. `***` for bold italic.
pub fn open_delimiter(format: TextFormat) -> SmolStr {
    let mut builder = SmolStrBuilder::new();
    for (flag, delim) in DELIMITERS {
        if format.contains(flag) {
            builder.push_str(delim);
        }
    }
    builder.finish()
}

/// Closing delimiter: the opening delimiters in reverse order.
pub fn close_delimiter(format: TextFormat) -> SmolStr {
    let mut builder = SmolStrBuilder::new();
    for (flag, delim) in DELIMITERS.iter().rev() {
        if format.contains(*flag) {
            builder.push_str(delim);
        }
    }
    builder.finish()
}

/// A run written out as markdown source.
pub fn raw_markdown(run: &TextRun) -> String {
    format!(
        "{}{}{}",
        open_delimiter(run.format),
        run.text,
        close_delimiter(run.format)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ListKind, index: usize, depth: usize, checked: bool) -> ListItemFocus {
        ListItemFocus {
            key: "li".into(),
            kind,
            index,
            depth,
            checked,
            list_start: 1,
        }
    }

    #[test]
    fn test_heading_and_quote_prefixes() {
        let h = |level| HeadingFocus {
            key: "h".into(),
            level,
        };
        assert_eq!(heading_prefix(&h(1)), "# ");
        assert_eq!(heading_prefix(&h(6)), "###### ");

        let q = |depth| BlockquoteFocus {
            key: "q".into(),
            depth,
        };
        assert_eq!(quote_prefix(&q(1)), "> ");
        assert_eq!(quote_prefix(&q(2)), ">> ");
    }

    #[test]
    fn test_list_prefixes() {
        assert_eq!(list_prefix(&item(ListKind::Bullet, 1, 1, false), 2), "- ");
        assert_eq!(list_prefix(&item(ListKind::Number, 2, 1, false), 2), "2. ");
        assert_eq!(list_prefix(&item(ListKind::Check, 1, 1, false), 2), "- [ ] ");
        assert_eq!(list_prefix(&item(ListKind::Check, 1, 1, true), 2), "- [x] ");
        assert_eq!(list_prefix(&item(ListKind::Bullet, 1, 3, false), 2), "    - ");
        assert_eq!(list_prefix(&item(ListKind::Bullet, 1, 2, false), 4), "    - ");
    }

    #[test]
    fn test_numbered_prefix_honours_start() {
        let focus = ListItemFocus {
            list_start: 7,
            ..item(ListKind::Number, 3, 1, false)
        };
        assert_eq!(list_prefix(&focus, 2), "9. ");
    }

    #[test]
    fn test_fences() {
        assert_eq!(open_fence("python"), "```python");
        assert_eq!(open_fence(""), "```");
        assert_eq!(CLOSE_FENCE, "```");
    }

    #[test]
    fn test_inline_delimiters() {
        let bold_italic = TextFormat::BOLD | TextFormat::ITALIC;
        assert_eq!(open_delimiter(bold_italic), "***");
        assert_eq!(close_delimiter(bold_italic), "***");
        assert_eq!(
            raw_markdown(&TextRun::new("gone", TextFormat::STRIKETHROUGH | TextFormat::CODE)),
            "~~`gone`~~"
        );
        // Unhandled bits have no delimiter.
        assert_eq!(
            raw_markdown(&TextRun::new("u", TextFormat::UNDERLINE | TextFormat::BOLD)),
            "**u**"
        );
    }
}
