use super::reveal::RevealSession;
use super::spans::Fragment;

/// One rendered piece of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenView<'a> {
    Text(&'a str),
    CodeBlock {
        code: &'a str,
        lang: Option<&'a str>,
    },
    /// Inline token shown as plain text. `index` is unset on the static view.
    Shown { text: &'a str, index: Option<usize> },
    /// Inline token hidden behind an answer input.
    Blank { index: usize, answer: &'a str },
}

fn render_common<'f>(fragment: &'f Fragment) -> Option<TokenView<'f>> {
    match fragment {
        Fragment::Text(text) => Some(TokenView::Text(text)),
        Fragment::Code(span) if span.block => Some(TokenView::CodeBlock {
            code: &span.text,
            lang: span.lang.as_deref(),
        }),
        Fragment::Code(_) => None,
    }
}

/// First-paint view. Never produces a blank, so it is safe to show before
/// interactivity is confirmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticView;

impl StaticView {
    pub fn render<'f>(&self, fragments: &'f [Fragment]) -> Vec<TokenView<'f>> {
        fragments
            .iter()
            .map(|fragment| {
                render_common(fragment).unwrap_or_else(|| TokenView::Shown {
                    text: fragment.inline_code().unwrap_or_default(),
                    index: None,
                })
            })
            .collect()
    }
}

/// Live view. Inline tokens get their appearance index on first encounter
/// and are hidden or shown by the session's current seed and ratio.
#[derive(Debug)]
pub struct InteractiveView<'s> {
    session: &'s mut RevealSession,
}

impl<'s> InteractiveView<'s> {
    pub(crate) fn new(session: &'s mut RevealSession) -> Self {
        Self { session }
    }

    pub fn render<'f>(&mut self, fragments: &'f [Fragment]) -> Vec<TokenView<'f>> {
        fragments
            .iter()
            .enumerate()
            .map(|(position, fragment)| {
                if let Some(view) = render_common(fragment) {
                    return view;
                }
                let text = fragment.inline_code().unwrap_or_default();
                let index = self.session.index_for(position);
                if self.session.state().should_hide(text, index) {
                    TokenView::Blank {
                        index,
                        answer: text,
                    }
                } else {
                    TokenView::Shown {
                        text,
                        index: Some(index),
                    }
                }
            })
            .collect()
    }
}

/// Plain-text rendering for terminals. `blank` draws each hidden token.
pub fn render_text<F>(views: &[TokenView<'_>], mut blank: F) -> String
where
    F: FnMut(usize, &str) -> String,
{
    let mut out = String::new();
    for view in views {
        match view {
            TokenView::Text(text) => out.push_str(text),
            TokenView::CodeBlock { code, lang } => {
                out.push_str("```");
                out.push_str(lang.unwrap_or_default());
                out.push('\n');
                out.push_str(code);
                if !code.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("```");
            }
            TokenView::Shown { text, .. } => out.push_str(text),
            TokenView::Blank { index, answer } => out.push_str(&blank(*index, answer)),
        }
    }
    out
}

/// `[__3__]` style placeholder.
pub fn placeholder(index: usize, _answer: &str) -> String {
    format!("[__{index}__]")
}
