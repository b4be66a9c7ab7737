use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use super::slug::Slug;
use super::walk::Folder;

/// Upper bound on items returned by [`search`].
pub const SEARCH_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyIndexItem {
    pub title: String,
    pub slug: Slug,
    pub full_path_label: String,
}

impl StudyIndexItem {
    pub fn href(&self) -> String {
        self.slug.study_href()
    }

    fn haystack(&self) -> String {
        normalize_for_search(&format!("{} {}", self.title, self.full_path_label))
    }
}

pub fn build_study_index(tree: &Folder) -> Vec<StudyIndexItem> {
    tree.flatten_files()
        .into_iter()
        .map(|file| StudyIndexItem {
            title: file.title.clone(),
            full_path_label: file.slug.to_string(),
            slug: file.slug.clone(),
        })
        .collect()
}

/// Lowercase, decompose, drop combining diacritics and all whitespace.
pub fn normalize_for_search(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Substring search over `title + " " + full_path_label`.
///
/// Items are ranked by the UTF-16 offset of the first match, earlier first,
/// with ties kept in index order. An empty query returns the head of the index.
pub fn search<'a>(items: &'a [StudyIndexItem], query: &str) -> Vec<&'a StudyIndexItem> {
    if query.is_empty() {
        return items.iter().take(SEARCH_LIMIT).collect();
    }

    let needle = normalize_for_search(query);
    let mut scored: Vec<(usize, &StudyIndexItem)> = items
        .iter()
        .filter_map(|item| {
            let hay = item.haystack();
            hay.find(&needle)
                .map(|byte| (hay[..byte].encode_utf16().count(), item))
        })
        .collect();

    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .map(|(_, item)| item)
        .take(SEARCH_LIMIT)
        .collect()
}
