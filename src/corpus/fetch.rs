use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::frontmatter::{split_frontmatter, Frontmatter};
use super::slug::Slug;
use super::toc::first_title_heading;
use super::walk::collect_tree;
use crate::error::CorpusError;

const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone)]
pub struct Document {
    pub slug: Slug,
    pub frontmatter: Frontmatter,
    /// text after the front matter
    pub body: String,
    pub source: PathBuf,
}

impl Document {
    pub fn path_label(&self) -> String {
        self.slug.to_string()
    }

    /// Title shown above `shown_text`, which is the body or an excerpt of it.
    pub fn display_title(&self, shown_text: &str) -> String {
        display_title(&self.frontmatter, shown_text, &self.slug)
    }
}

/// Front matter title, else the first `# ` heading of `text`, else the last
/// slug segment.
pub fn display_title(frontmatter: &Frontmatter, text: &str, slug: &Slug) -> String {
    frontmatter
        .title()
        .or_else(|| first_title_heading(text))
        .or_else(|| slug.file_name())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn direct_candidates(root: &Path, slug: &Slug) -> Vec<PathBuf> {
    let base = slug
        .segments()
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment));
    ["mdx", "md"]
        .iter()
        .map(|ext| {
            let mut path = base.clone().into_os_string();
            path.push(".");
            path.push(ext);
            PathBuf::from(path)
        })
        .collect()
}

fn resolve_source(root: &Path, slug: &Slug) -> Result<PathBuf, CorpusError> {
    // hidden entries are never documents; this also keeps `..` from escaping the root
    if slug.is_empty() || slug.segments().iter().any(|s| s.starts_with('.')) {
        return Err(CorpusError::NotFound(slug.to_string()));
    }

    if let Some(path) = direct_candidates(root, slug)
        .into_iter()
        .find(|path| path.is_file())
    {
        return Ok(path);
    }

    debug!("no direct file for '{}', resolving through the tree", slug);
    collect_tree(root)?
        .find_file(slug)
        .map(|file| file.source.clone())
        .ok_or_else(|| CorpusError::NotFound(slug.to_string()))
}

/// Load the document behind `slug`.
///
/// Malformed front matter is logged and treated as absent so the body still
/// renders.
pub fn load_document(root: &Path, slug: &Slug) -> Result<Document, CorpusError> {
    let source = resolve_source(root, slug)?;
    let bytes = fs::read(&source).map_err(|source_err| CorpusError::Read {
        path: source.clone(),
        source: source_err,
    })?;
    let raw = String::from_utf8_lossy(&bytes);

    let (frontmatter, body) = match split_frontmatter(&raw) {
        Ok((frontmatter, body)) => (frontmatter, body.to_string()),
        Err(e) => {
            warn!(
                "{}",
                CorpusError::Frontmatter {
                    path: source.clone(),
                    source: e,
                }
            );
            (Frontmatter::default(), raw.to_string())
        }
    };

    Ok(Document {
        slug: slug.clone(),
        frontmatter,
        body,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_direct_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/b.md", "---\ntitle: Test\n---\nbody");

        let doc = load_document(dir.path(), &Slug::parse("a/b")).unwrap();
        assert_eq!(doc.frontmatter.title(), Some("Test"));
        assert_eq!(doc.body, "body");
        assert_eq!(doc.path_label(), "a/b");
    }

    #[test]
    fn test_mdx_wins_over_md() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "x.md", "md");
        write(dir.path(), "x.mdx", "mdx");

        let doc = load_document(dir.path(), &Slug::parse("x")).unwrap();
        assert_eq!(doc.body, "mdx");
    }

    #[test]
    fn test_load_index_document_through_tree() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "topic/README.md", "readme body");

        let doc = load_document(dir.path(), &Slug::parse("topic")).unwrap();
        assert_eq!(doc.body, "readme body");
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "x");

        let err = load_document(dir.path(), &Slug::parse("b")).unwrap_err();
        assert!(matches!(err, CorpusError::NotFound(ref slug) if slug == "b"));
    }

    #[test]
    fn test_malformed_front_matter_keeps_raw_body() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.md", "---\ntitle: [x\n---\nbody");

        let doc = load_document(dir.path(), &Slug::parse("bad")).unwrap();
        assert!(doc.frontmatter.is_empty());
        assert!(doc.body.ends_with("body"));
    }

    #[test]
    fn test_display_title_fallbacks() {
        let slug = Slug::parse("dir/file");
        let empty = Frontmatter::default();
        assert_eq!(display_title(&empty, "# Heading\ntext", &slug), "Heading");
        assert_eq!(display_title(&empty, "no heading", &slug), "file");
        assert_eq!(display_title(&empty, "", &Slug::default()), "Untitled");

        let (fm, _) = split_frontmatter("---\ntitle: Given\n---\n").unwrap();
        assert_eq!(display_title(&fm, "# Heading", &slug), "Given");
    }
}
