use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// File extensions treated as study documents, compared case-insensitively.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx"];

const INDEX_STEMS: &[&str] = &["index", "readme"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(Vec<String>);

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub label: String,
    pub href: String,
}

/// NFC-normalize a single path segment, drop control and format characters,
/// collapse runs of whitespace into one space and trim the ends.
pub fn normalize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .nfc()
        .filter(|c| {
            !matches!(
                c.general_category(),
                GeneralCategory::Control | GeneralCategory::Format
            )
        })
        .map(|c| if c == '＆' { '&' } else { c })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn has_document_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// `notes.md` -> `notes`. Names without a document extension are returned as-is.
pub fn strip_document_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => file_name,
    }
}

fn is_index_stem(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    INDEX_STEMS.contains(&lower.as_str())
}

fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

fn encode_segments(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| urlencoding::encode(s))
        .collect::<Vec<_>>()
        .join("/")
}

/// `/study/<segment>/<segment>` with every segment re-encoded from its NFC form.
pub fn study_href<S: AsRef<str>>(segments: &[S]) -> String {
    let safe: Vec<String> = segments
        .iter()
        .filter(|s| !s.as_ref().is_empty())
        .map(|s| decode_segment(s.as_ref()).nfc().collect::<String>())
        .collect();
    format!("/study/{}", encode_segments(&safe))
}

impl Slug {
    /// Derive a slug from a path relative to the corpus root.
    ///
    /// Returns `None` when nothing survives normalization, e.g. a root-level
    /// `index.md`.
    pub fn from_relative_path(rel: &Path) -> Option<Self> {
        let mut parts: Vec<String> = rel
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let file_name = parts.pop()?;
        parts.push(strip_document_extension(&file_name).to_string());

        let mut segments: Vec<String> = parts
            .iter()
            .map(|part| normalize_segment(part))
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.last().is_some_and(|last| is_index_stem(last)) {
            segments.pop();
        }

        (!segments.is_empty()).then_some(Self(segments))
    }

    /// Parse a `/`-joined slug path such as the entries of a selection pool.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .map(normalize_segment)
                .filter(|segment| !segment.is_empty())
                .collect(),
        )
    }

    /// Parse a `/`-joined path whose segments are percent-encoded.
    /// Segments that fail to decode are kept verbatim.
    pub fn from_url_path(encoded: &str) -> Self {
        Self(
            encoded
                .split('/')
                .map(|segment| normalize_segment(&decode_segment(segment)))
                .filter(|segment| !segment.is_empty())
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// All segments but the last, `/`-joined. Empty for top-level documents.
    pub fn parent_label(&self) -> String {
        match self.0.split_last() {
            Some((_, parents)) => parents.join("/"),
            None => String::new(),
        }
    }

    pub fn to_url_path(&self) -> String {
        encode_segments(&self.0)
    }

    pub fn study_href(&self) -> String {
        study_href(&self.0)
    }

    /// Links to each proper ancestor of this slug, outermost first.
    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        (1..self.0.len())
            .map(|depth| Crumb {
                label: self.0[depth - 1].clone(),
                href: study_href(&self.0[..depth]),
            })
            .collect()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_segment_collapses_whitespace() {
        assert_eq!(normalize_segment("  hello \t  world  "), "hello world");
    }

    #[test]
    fn test_normalize_segment_strips_format_chars() {
        assert_eq!(normalize_segment("zero\u{200B}width\u{FEFF}"), "zerowidth");
        assert_eq!(normalize_segment("bell\u{0007}"), "bell");
    }

    #[test]
    fn test_normalize_segment_composes_hangul() {
        let decomposed = "\u{1100}\u{1161}\u{11A8}";
        assert_eq!(normalize_segment(decomposed), "각");
    }

    #[test]
    fn test_normalize_segment_fullwidth_ampersand() {
        assert_eq!(normalize_segment("A＆B"), "A&B");
    }

    #[test]
    fn test_from_relative_path_strips_extension() {
        let slug = Slug::from_relative_path(Path::new("a/b.md")).unwrap();
        assert_eq!(slug.segments(), ["a", "b"]);
        assert_eq!(slug.to_string(), "a/b");
        assert_eq!(slug.parent_label(), "a");
    }

    #[test]
    fn test_from_relative_path_extension_case_insensitive() {
        let slug = Slug::from_relative_path(Path::new("notes/Intro.MDX")).unwrap();
        assert_eq!(slug.to_string(), "notes/Intro");
    }

    #[test]
    fn test_from_relative_path_drops_index_and_readme() {
        let slug = Slug::from_relative_path(Path::new("topic/INDEX.md")).unwrap();
        assert_eq!(slug.to_string(), "topic");

        let slug = Slug::from_relative_path(Path::new("topic/sub/ReadMe.mdx")).unwrap();
        assert_eq!(slug.to_string(), "topic/sub");
    }

    #[test]
    fn test_from_relative_path_root_index_is_none() {
        assert!(Slug::from_relative_path(Path::new("index.md")).is_none());
    }

    #[test]
    fn test_from_relative_path_skips_blank_segments() {
        let path: PathBuf = ["\u{200B}", "b  c.md"].iter().collect();
        let slug = Slug::from_relative_path(&path).unwrap();
        assert_eq!(slug.segments(), ["b c"]);
    }

    #[test]
    fn test_url_path_round_trip() {
        let slug = Slug::parse("실무 정리/우선경보와 전층경보");
        let encoded = slug.to_url_path();
        assert!(!encoded.contains(' '));
        assert_eq!(encoded.matches('/').count(), 1);
        assert_eq!(Slug::from_url_path(&encoded), slug);
    }

    #[test]
    fn test_from_url_path_keeps_undecodable_segment() {
        let slug = Slug::from_url_path("%E0%A4%A/ok");
        assert_eq!(slug.segments(), ["%E0%A4%A", "ok"]);
    }

    #[test]
    fn test_study_href_renormalizes() {
        assert_eq!(study_href(&["a b", "c"]), "/study/a%20b/c");
        assert_eq!(study_href(&["a%20b"]), "/study/a%20b");
    }

    #[test]
    fn test_breadcrumbs() {
        let slug = Slug::parse("a/b/c");
        let crumbs = slug.breadcrumbs();
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[0].label, "a");
        assert_eq!(crumbs[0].href, "/study/a");
        assert_eq!(crumbs[1].href, "/study/a/b");
    }

    #[test]
    fn test_has_document_extension() {
        assert!(has_document_extension("x.md"));
        assert!(has_document_extension("x.MDX"));
        assert!(!has_document_extension("x.txt"));
        assert!(!has_document_extension("md"));
    }
}
