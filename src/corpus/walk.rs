use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::frontmatter::split_frontmatter;
use super::slug::{has_document_extension, strip_document_extension, Slug};
use crate::error::CorpusError;

#[derive(Debug, Clone, Serialize)]
pub struct StudyFile {
    /// front matter title, else the file name without extension
    pub title: String,

    /// unique within the corpus
    pub slug: Slug,

    /// slug segments except the last, `/`-joined
    pub rel_dir: String,

    #[serde(skip)]
    pub source: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Folder {
    pub name: String,

    /// `/`-joined ancestor names, empty for the root
    pub path: String,

    pub folders: Vec<Folder>,
    pub files: Vec<StudyFile>,
}

/// Ordering used for folder names and file titles: case-insensitive first,
/// then by code point so the order stays total.
pub fn title_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn read_document(path: &Path) -> Result<String, CorpusError> {
    let bytes = fs::read(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn title_from_content(raw: &str, path: &Path, fallback: &str) -> String {
    match split_frontmatter(raw) {
        Ok((frontmatter, _)) => frontmatter
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
        Err(e) => {
            warn!("ignoring front matter of {}: {}", path.display(), e);
            fallback.to_string()
        }
    }
}

/// Walk `root` into a folder tree.
///
/// A missing root yields an empty tree. Any unreadable entry aborts the walk.
pub fn collect_tree(root: &Path) -> Result<Folder, CorpusError> {
    if !root.is_dir() {
        info!("corpus root {} does not exist", root.display());
        return Ok(Folder::default());
    }

    let tree = walk(root, Path::new(""))?;
    let (folders, files) = tree.count();
    info!(
        "indexed {} documents in {} folders under {}",
        files,
        folders,
        root.display()
    );
    Ok(tree)
}

fn walk(dir: &Path, rel: &Path) -> Result<Folder, CorpusError> {
    let mut folders = Vec::new();
    let mut files = Vec::new();

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in entries {
        let entry = entry.map_err(|source| CorpusError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let entry_rel = rel.join(entry.file_name());

        if entry.file_type().is_dir() {
            folders.push(walk(entry.path(), &entry_rel)?);
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file() || !has_document_extension(&file_name) {
            continue;
        }

        let raw = read_document(entry.path())?;
        let title = title_from_content(&raw, entry.path(), strip_document_extension(&file_name));
        let Some(slug) = Slug::from_relative_path(&entry_rel) else {
            debug!("no slug for {}, skipping", entry_rel.display());
            continue;
        };

        debug!("found '{}' at {}", title, slug);
        files.push(StudyFile {
            title,
            rel_dir: slug.parent_label(),
            slug,
            source: entry.path().to_path_buf(),
        });
    }

    folders.sort_by(|a, b| title_order(&a.name, &b.name));
    files.sort_by(|a, b| title_order(&a.title, &b.title));

    let path = rel
        .iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(Folder {
        name: rel
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path,
        folders,
        files,
    })
}

impl Folder {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Own files first, then each child folder's files, recursively.
    pub fn flatten_files(&self) -> Vec<&StudyFile> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a StudyFile>) {
        out.extend(self.files.iter());
        for folder in &self.folders {
            folder.collect_files(out);
        }
    }

    /// Slug paths of every file at or below this folder.
    pub fn slug_paths(&self) -> Vec<String> {
        self.flatten_files()
            .into_iter()
            .map(|file| file.slug.to_string())
            .collect()
    }

    /// Descendant folder count and file count at or below this node.
    pub fn count(&self) -> (usize, usize) {
        self.folders
            .iter()
            .map(Folder::count)
            .fold((self.folders.len(), self.files.len()), |acc, (f, d)| {
                (acc.0 + f, acc.1 + d)
            })
    }

    pub fn find_file(&self, slug: &Slug) -> Option<&StudyFile> {
        self.flatten_files().into_iter().find(|file| &file.slug == slug)
    }

    /// Fail on the first slug that two different source files share.
    pub fn check_unique_slugs(&self) -> Result<(), CorpusError> {
        let mut seen: HashMap<&Slug, &Path> = HashMap::new();
        for file in self.flatten_files() {
            if let Some(first) = seen.insert(&file.slug, file.source.as_path()) {
                return Err(CorpusError::DuplicateSlug {
                    slug: file.slug.to_string(),
                    first: first.to_path_buf(),
                    second: file.source.clone(),
                });
            }
        }
        Ok(())
    }
}
