//! Selection pool and "next problem" navigation, carried entirely in the href.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{Folder, Slug, StudyFile};

pub const RANDOM_ROUTE: &str = "/random";

const NONCE_LEN: usize = 10;
const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// User-selected slug paths. Membership is what matters; order is kept only
/// so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pool(Vec<String>);

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, slug_path: &str) -> bool {
        self.0.iter().any(|s| s == slug_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn insert(&mut self, slug_path: impl Into<String>) {
        let slug_path = slug_path.into();
        if !self.contains(&slug_path) {
            self.0.push(slug_path);
        }
    }

    pub fn toggle_file(&mut self, file: &StudyFile) {
        let id = file.slug.to_string();
        if self.contains(&id) {
            self.0.retain(|s| s != &id);
        } else {
            self.0.push(id);
        }
    }

    /// True when the folder has files and every one of them is selected.
    pub fn is_folder_selected(&self, folder: &Folder) -> bool {
        let all = folder.slug_paths();
        !all.is_empty() && all.iter().all(|id| self.contains(id))
    }

    /// Deselect everything under `folder` if it is fully selected, otherwise
    /// select all of it.
    pub fn toggle_folder(&mut self, folder: &Folder) {
        let all = folder.slug_paths();
        if self.is_folder_selected(folder) {
            self.0.retain(|s| !all.contains(s));
        } else {
            for id in all {
                self.insert(id);
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode the `files` query value. Anything that is not a JSON array of
    /// strings yields an empty pool.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(slugs) => slugs.into_iter().fold(Self::default(), |mut pool, s| {
                pool.insert(s);
                pool
            }),
            Err(e) => {
                debug!("ignoring malformed pool '{}': {}", raw, e);
                Self::default()
            }
        }
    }

    fn choose<R: Rng + ?Sized>(&self, rng: &mut R, skip: Option<&str>) -> Option<&str> {
        let candidates: Vec<&str> = match skip {
            Some(current) if self.len() > 1 && self.contains(current) => {
                self.iter().filter(|s| *s != current).collect()
            }
            _ => self.iter().collect(),
        };
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

impl FromIterator<String> for Pool {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut pool, s| {
            pool.insert(s);
            pool
        })
    }
}

/// Where "start" or "next" sends the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub slug: Slug,
    pub pool: Pool,
    pub nonce: Option<String>,
}

impl NavTarget {
    pub fn href(&self) -> String {
        let mut href = format!(
            "{}/{}?files={}",
            RANDOM_ROUTE,
            self.slug.to_url_path(),
            urlencoding::encode(&self.pool.to_json())
        );
        if let Some(nonce) = &self.nonce {
            href.push_str("&r=");
            href.push_str(nonce);
        }
        href
    }

    /// Decode an href produced by [`NavTarget::href`]. Returns `None` when the
    /// path is not a random-study route with a slug.
    pub fn from_href(href: &str) -> Option<Self> {
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        let slug = Slug::from_url_path(path.strip_prefix(RANDOM_ROUTE)?.strip_prefix('/')?);
        if slug.is_empty() {
            return None;
        }

        let mut files = None;
        let mut nonce = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value).map(|v| v.into_owned()).ok();
            match key {
                // the first occurrence wins, as with a repeated query parameter
                "files" if files.is_none() => files = value,
                "r" if nonce.is_none() => nonce = value,
                _ => {}
            }
        }

        Some(Self {
            slug,
            pool: Pool::decode(files.as_deref()),
            nonce,
        })
    }
}

fn nonce<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

/// First problem of a session: a uniform pick from the pool. `None` when the
/// pool is empty.
pub fn start<R: Rng + ?Sized>(pool: &Pool, rng: &mut R) -> Option<NavTarget> {
    let slug = pool.choose(rng, None)?;
    Some(NavTarget {
        slug: Slug::parse(slug),
        pool: pool.clone(),
        nonce: None,
    })
}

/// Another uniform pick from the pool, with replacement unless
/// `exclude_current` is set and another member exists. Each target carries a
/// new nonce.
pub fn next<R: Rng + ?Sized>(
    pool: &Pool,
    current: Option<&str>,
    exclude_current: bool,
    rng: &mut R,
) -> Option<NavTarget> {
    let skip = current.filter(|_| exclude_current);
    let slug = pool.choose(rng, skip)?;
    Some(NavTarget {
        slug: Slug::parse(slug),
        pool: pool.clone(),
        nonce: Some(nonce(rng)),
    })
}

/// Href for the "next problem" button: a fresh target, or the pool chooser
/// when nothing is selected.
pub fn next_href<R: Rng + ?Sized>(pool: &Pool, rng: &mut R) -> String {
    next(pool, None, false, rng)
        .map(|target| target.href())
        .unwrap_or_else(|| RANDOM_ROUTE.to_string())
}
