//! Static tag dataset.
//!
//! Loaded once at startup and never mutated; handlers only read from it.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ProxyError;
use crate::models::{Tag, TagPage, TagSummary};

pub const TAGS_PER_PAGE: usize = 10;

#[derive(Debug, Default)]
pub struct TagStore {
    tags: Vec<Tag>,
    by_id: HashMap<u64, usize>,
}

impl TagStore {
    pub fn from_tags(tags: Vec<Tag>) -> Self {
        let by_id = tags.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        Self { tags, by_id }
    }

    pub fn from_json(content: &str) -> Result<Self, ProxyError> {
        let tags: Vec<Tag> = serde_json::from_str(content)?;
        Ok(Self::from_tags(tags))
    }

    pub fn load(path: &Path) -> Result<Self, ProxyError> {
        let content = fs::read_to_string(path)?;
        let store = Self::from_json(&content)?;
        log::info!("Loaded {} tags from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Tag> {
        self.by_id.get(&id).map(|&i| &self.tags[i])
    }

    /// Resolve a comma-separated id list, keeping input order.
    /// A missing list (or the literal `"undefined"`) yields nothing.
    pub fn by_ids(&self, list: Option<&str>) -> Result<Vec<TagSummary>, ProxyError> {
        let list = match list {
            None | Some("") | Some("undefined") => return Ok(Vec::new()),
            Some(l) => l,
        };
        list.split(',')
            .map(|raw| {
                let id = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ProxyError::invalid("list", raw))?;
                self.get(id)
                    .map(TagSummary::from)
                    .ok_or(ProxyError::TagNotFound(id))
            })
            .collect()
    }

    /// Tags whose name or any alias matches `pattern`, one page at a time.
    /// Pages start at 1; `last_visible_page` counts matching tags only.
    pub fn search(&self, pattern: Option<&str>, page: usize) -> Result<TagPage, ProxyError> {
        let re = Regex::new(pattern.unwrap_or(""))?;
        let matches: Vec<&Tag> = self
            .tags
            .iter()
            .filter(|t| re.is_match(&t.name) || t.aliases.iter().any(|a| re.is_match(a)))
            .collect();

        let offset = page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(TAGS_PER_PAGE));
        let data = match offset {
            Some(offset) => matches
                .iter()
                .skip(offset)
                .take(TAGS_PER_PAGE)
                .map(|t| TagSummary::from(*t))
                .collect(),
            None => Vec::new(),
        };

        Ok(TagPage {
            data,
            last_visible_page: matches.len().div_ceil(TAGS_PER_PAGE),
        })
    }
}
