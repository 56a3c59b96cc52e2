use std::fmt::{Display, Formatter};

use crate::category::CategorySlugs;
use crate::text_utils::{format_file_stem, parse_general, parse_iso_lexical, FallbackZone};

pub const DEFAULT_POSTS_ROOT: &str = "content/posts";

/// Stem produced when the timestamp cannot be read at all. Callers are expected
/// to reject such timestamps before a path is derived from them.
pub const UNPARSEABLE_STEM: &str = "NaNNaNNaN-NaNNaN";

#[derive(Debug, Clone, PartialEq)]
pub struct DeriverOptions {
    pub posts_root: String,
    pub category_routing: bool,
    pub strict_iso_dates: bool,
    pub fallback_zone: FallbackZone,
}

impl Default for DeriverOptions {
    fn default() -> Self {
        Self {
            posts_root: DEFAULT_POSTS_ROOT.to_string(),
            category_routing: true,
            strict_iso_dates: true,
            fallback_zone: FallbackZone::Local,
        }
    }
}

/// Repository relative path of a post, e.g. `content/posts/meals/20250819-1330.md`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedPath(String);

impl DerivedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DerivedPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct FilenameDeriver {
    categories: CategorySlugs,
    options: DeriverOptions,
}

impl FilenameDeriver {
    pub fn new(categories: CategorySlugs, options: DeriverOptions) -> Self {
        Self {
            categories,
            options,
        }
    }

    pub fn categories(&self) -> &CategorySlugs {
        &self.categories
    }

    /// `YYYYMMDD-HHmm`, or `None` when the timestamp cannot be read.
    ///
    /// Strict ISO input keeps its written wall-clock fields. Anything else goes through the
    /// general parser and is read in the fallback zone, so its result depends on that zone.
    pub fn file_stem(&self, timestamp: &str) -> Option<String> {
        if self.options.strict_iso_dates {
            if let Some(stamp) = parse_iso_lexical(timestamp) {
                return Some(stamp.file_stem());
            }
        }

        parse_general(timestamp, &self.options.fallback_zone)
            .map(|date_time| format_file_stem(&date_time))
    }

    pub fn file_name(&self, timestamp: &str) -> String {
        let stem = self.file_stem(timestamp)
            .unwrap_or_else(|| UNPARSEABLE_STEM.to_string());
        format!("{}.md", stem)
    }

    pub fn derive(&self, timestamp: &str, category: Option<&str>) -> DerivedPath {
        let root = self.options.posts_root.trim_end_matches('/');
        let file_name = self.file_name(timestamp);

        if !self.options.category_routing {
            return DerivedPath(format!("{}/{}", root, file_name));
        }

        let slug = self.categories.slug_for(category.unwrap_or(""));
        DerivedPath(format!("{}/{}/{}", root, slug, file_name))
    }
}
