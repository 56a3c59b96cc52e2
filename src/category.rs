use std::collections::HashMap;

pub const DEFAULT_SLUG: &str = "misc";

const BUILTIN_CATEGORIES: [(&str, &str); 3] = [
    ("雑記", "misc"),
    ("食事", "meals"),
    ("フィットネス", "fitness"),
];

/// Maps human readable category labels to the directory names used under the posts root.
/// Built once at start-up and shared read-only by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySlugs {
    slugs: HashMap<String, String>,
    default_slug: String,
}

impl Default for CategorySlugs {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategorySlugs {
    pub fn builtin() -> Self {
        let slugs = BUILTIN_CATEGORIES.iter()
            .map(|(label, slug)| (label.to_string(), slug.to_string()))
            .collect();

        Self {
            slugs,
            default_slug: DEFAULT_SLUG.to_string(),
        }
    }

    /// Built-in table with `overrides` layered on top. An entry named `default` replaces the fallback slug.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table = Self::builtin();
        for (label, slug) in overrides.iter() {
            if label == "default" {
                table.default_slug = slug.clone();
            } else {
                table.slugs.insert(label.clone(), slug.clone());
            }
        }
        table
    }

    pub fn slug_for(&self, label: &str) -> &str {
        self.slugs.get(label)
            .map(|slug| slug.as_str())
            .unwrap_or(self.default_slug.as_str())
    }

    pub fn default_slug(&self) -> &str {
        &self.default_slug
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }
}
