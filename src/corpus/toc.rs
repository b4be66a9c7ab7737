use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("valid heading regex"));
static INLINE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*`_~]").expect("valid markup regex"));
static TITLE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid title regex"));

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub id: String,
}

// Only h1..h3 make it into the table of contents. Ids are slugged with
// repeats disambiguated, matching the anchors a GitHub-style renderer emits.
pub fn table_of_contents(markdown: &str) -> Vec<Heading> {
    let mut slugger = github_slugger::Slugger::default();

    markdown
        .lines()
        .filter_map(|line| {
            let caps = HEADING.captures(line.trim())?;
            let text = INLINE_MARKUP.replace_all(&caps[2], "").trim().to_string();
            let mut id = slugger.slug(&text);
            if id.is_empty() {
                id = slugger.slug("section");
            }
            Some(Heading {
                level: caps[1].len(),
                text,
                id,
            })
        })
        .collect()
}

/// Text of the first level-one heading, if any.
pub fn first_title_heading(markdown: &str) -> Option<&str> {
    TITLE_HEADING
        .captures(markdown)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|title| !title.is_empty())
}
