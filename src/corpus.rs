mod fetch;
mod frontmatter;
mod index;
mod slug;
mod toc;
mod walk;

pub use fetch::{display_title, load_document, Document};
pub use frontmatter::{split_frontmatter, Frontmatter};
pub use index::{build_study_index, normalize_for_search, search, StudyIndexItem, SEARCH_LIMIT};
pub use slug::{normalize_segment, study_href, Crumb, Slug, DOCUMENT_EXTENSIONS};
pub use toc::{table_of_contents, Heading};
pub use walk::{collect_tree, title_order, Folder, StudyFile};
