use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpan {
    pub text: String,
    /// fenced or indented code block rather than an inline span
    pub block: bool,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Code(CodeSpan),
}

impl Fragment {
    pub fn inline_code(&self) -> Option<&str> {
        match self {
            Fragment::Code(span) if !span.block => Some(&span.text),
            _ => None,
        }
    }
}

fn heading_level_to_usize(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Default)]
struct FragmentBuilder {
    fragments: Vec<Fragment>,
}

impl FragmentBuilder {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.fragments.last_mut() {
            Some(Fragment::Text(last)) => last.push_str(text),
            _ => self.fragments.push(Fragment::Text(text.to_string())),
        }
    }

    fn push_code(&mut self, span: CodeSpan) {
        self.fragments.push(Fragment::Code(span));
    }

    fn finish(mut self) -> Vec<Fragment> {
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            if last.is_empty() {
                self.fragments.pop();
            }
        }
        self.fragments
    }
}

pub fn parse_fragments(markdown: &str) -> Vec<Fragment> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = FragmentBuilder::default();
    let mut code_block: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, text)) = code_block.take() {
                    out.push_code(CodeSpan {
                        text,
                        block: true,
                        lang,
                    });
                    out.push_text("\n");
                }
            }
            Event::Text(text) => match code_block.as_mut() {
                Some((_, buffer)) => buffer.push_str(&text),
                None => out.push_text(&text),
            },
            Event::Code(code) => out.push_code(CodeSpan {
                text: code.into_string(),
                block: false,
                lang: None,
            }),
            Event::Start(Tag::Heading { level, .. }) => {
                out.push_text(&format!("{} ", "#".repeat(heading_level_to_usize(level))));
            }
            Event::Start(Tag::Item) => out.push_text("- "),
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Paragraph) => out.push_text("\n\n"),
            Event::End(TagEnd::Item) | Event::End(TagEnd::TableRow) => out.push_text("\n"),
            Event::End(TagEnd::TableCell) => out.push_text(" | "),
            Event::SoftBreak | Event::HardBreak => out.push_text("\n"),
            Event::Rule => out.push_text("---\n"),
            Event::Html(html) | Event::InlineHtml(html) => out.push_text(&html),
            Event::TaskListMarker(done) => out.push_text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_codes(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().filter_map(Fragment::inline_code).collect()
    }

    #[test]
    fn test_inline_code_spans_in_order() {
        let fragments = parse_fragments("The `first` and `second` term.");
        assert_eq!(inline_codes(&fragments), ["first", "second"]);
        assert_eq!(fragments[0], Fragment::Text("The ".to_string()));
    }

    #[test]
    fn test_code_block_is_not_inline() {
        let fragments = parse_fragments("```rust\nlet x = 1;\n```\n\nthen `y`");
        let block = fragments
            .iter()
            .find_map(|f| match f {
                Fragment::Code(span) if span.block => Some(span),
                _ => None,
            })
            .unwrap();
        assert_eq!(block.text, "let x = 1;\n");
        assert_eq!(block.lang.as_deref(), Some("rust"));
        assert_eq!(inline_codes(&fragments), ["y"]);
    }

    #[test]
    fn test_untagged_fence_is_still_a_block() {
        let fragments = parse_fragments("```\nplain\n```");
        assert!(inline_codes(&fragments).is_empty());
        assert!(matches!(&fragments[0], Fragment::Code(span) if span.block && span.lang.is_none()));
    }

    #[test]
    fn test_headings_and_lists_flatten() {
        let fragments = parse_fragments("## Title\n\n- one\n- `two`");
        let Fragment::Text(head) = &fragments[0] else {
            panic!("expected text first");
        };
        assert!(head.starts_with("## Title\n\n- one\n- "));
        assert_eq!(inline_codes(&fragments), ["two"]);
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let fragments = parse_fragments("text\n\n");
        assert_eq!(fragments, [Fragment::Text("text".to_string())]);
    }
}
