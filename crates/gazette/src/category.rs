//! Category registry.
//!
//! The category table is a two-level tree (root sections and their
//! subcategories) that ships with the site. It is built once at startup and
//! never changes afterwards; every lookup is a pure function over it.

use crate::{Error, Result};
use indexmap::IndexMap;

/// Color used when a slug has no definition.
pub const FALLBACK_COLOR: &str = "#6B7280";

/// Icon used when a slug has no definition.
pub const FALLBACK_ICON: &str = "folder";

/// One category definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Position in the definition table, starting at 1
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub display_name: String,
    pub description: Option<String>,
    /// `None` for root categories
    pub parent_slug: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_slug.is_none()
    }
}

/// Input for [`CategoryRegistry::new`]. The id is assigned by the registry.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDef {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub parent: Option<&'static str>,
    pub icon: &'static str,
    pub color: &'static str,
    pub sort_order: i32,
}

macro_rules! def {
    ($slug:literal, $display:literal, $desc:literal, $parent:expr, $icon:literal, $color:literal, $order:literal) => {
        CategoryDef {
            slug: $slug,
            display_name: $display,
            description: $desc,
            parent: $parent,
            icon: $icon,
            color: $color,
            sort_order: $order,
        }
    };
}

/// The site's shipped category table.
pub const BUILTIN_CATEGORIES: &[CategoryDef] = &[
    def!("news", "Latest News", "Breaking news and current events from across Africa", None, "newspaper", "#3B82F6", 1),
    def!("politics", "Politics", "Political news and analysis", Some("news"), "government", "#EF4444", 1),
    def!("economy", "Economy", "Economic news and financial updates", Some("news"), "chart-line", "#10B981", 2),
    def!("health", "Health", "Health news and medical updates", Some("news"), "heart", "#F59E0B", 3),
    def!("technology", "Technology", "Tech news and innovation", Some("news"), "laptop", "#8B5CF6", 4),
    def!("culture", "Culture", "African culture, traditions, and heritage", None, "palette", "#F97316", 2),
    def!("arts", "Arts", "Visual arts, literature, and creative expression", Some("culture"), "paint-brush", "#EC4899", 1),
    def!("african-history", "African History", "Historical stories and heritage", Some("culture"), "book-open", "#6B7280", 2),
    def!("animated-folktales", "Animated Folktales", "Animated stories and tales", Some("culture"), "video", "#F59E0B", 3),
    def!("historical-sites", "Historical Sites", "Famous landmarks and historical locations", Some("culture"), "landmark", "#059669", 4),
    def!("fun-facts", "Fun Facts About Africa", "Interesting and surprising facts", Some("culture"), "lightbulb", "#8B5CF6", 5),
    def!("sport", "Sports", "Sports news and updates", None, "football", "#22C55E", 3),
    def!("basketball", "Basketball", "Basketball news and updates", Some("sport"), "basketball", "#F97316", 1),
    def!("athletics", "Athletics", "Track and field events", Some("sport"), "running", "#3B82F6", 2),
    def!("tennis", "Tennis", "Tennis news and updates", Some("sport"), "tennis-ball", "#10B981", 3),
    def!("olympics", "Olympics", "Olympic games and events", Some("sport"), "trophy", "#F59E0B", 4),
    def!("entertainment", "Entertainment", "Entertainment news and updates", None, "star", "#EC4899", 4),
    def!("music", "Music", "Music news, reviews, and artist updates", Some("entertainment"), "music", "#8B5CF6", 1),
    def!("celebrity-gossip", "Celebrity Gossip", "Celebrity news and gossip", Some("entertainment"), "users", "#F59E0B", 2),
    def!("travel", "Travel", "Travel guides and destination features", Some("entertainment"), "plane", "#3B82F6", 3),
    def!("lifestyle", "Lifestyle", "Lifestyle tips and features", Some("entertainment"), "home", "#10B981", 4),
];

/// Root categories in order, and each root's children in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryHierarchy<'a> {
    pub mains: Vec<&'a Category>,
    pub subs_by_parent: IndexMap<&'a str, Vec<&'a Category>>,
}

/// Immutable category table with slug lookups.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    /// Definition order
    categories: Vec<Category>,
    by_slug: IndexMap<String, usize>,
}

impl CategoryRegistry {
    /// Build the registry from the shipped table.
    pub fn builtin() -> Self {
        // The shipped table is covered by tests; a failure here is a bug in
        // BUILTIN_CATEGORIES itself.
        match Self::new(BUILTIN_CATEGORIES) {
            Ok(registry) => registry,
            Err(e) => panic!("builtin category table is invalid: {}", e),
        }
    }

    /// Build a registry, checking that slugs are unique and that every
    /// parent is an existing root category.
    pub fn new(defs: &[CategoryDef]) -> Result<Self> {
        let mut categories = Vec::with_capacity(defs.len());
        let mut by_slug = IndexMap::with_capacity(defs.len());

        for (idx, def) in defs.iter().enumerate() {
            if by_slug.insert(def.slug.to_string(), idx).is_some() {
                return Err(Error::InvalidCategoryTable(format!(
                    "duplicate slug '{}'",
                    def.slug
                )));
            }
            categories.push(Category {
                id: idx as u32 + 1,
                name: def.slug.to_string(),
                slug: def.slug.to_string(),
                display_name: def.display_name.to_string(),
                description: Some(def.description.to_string()).filter(|d| !d.is_empty()),
                parent_slug: def.parent.map(str::to_string),
                icon: Some(def.icon.to_string()).filter(|i| !i.is_empty()),
                color: Some(def.color.to_string()).filter(|c| !c.is_empty()),
                sort_order: def.sort_order,
                is_active: true,
            });
        }

        for category in &categories {
            let Some(parent) = &category.parent_slug else {
                continue;
            };
            match by_slug.get(parent).map(|&i| &categories[i]) {
                None => {
                    return Err(Error::InvalidCategoryTable(format!(
                        "'{}' refers to unknown parent '{}'",
                        category.slug, parent
                    )));
                }
                Some(p) if !p.is_root() => {
                    return Err(Error::InvalidCategoryTable(format!(
                        "'{}' is nested under '{}', which is not a root category",
                        category.slug, parent
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            categories,
            by_slug,
        })
    }

    pub fn get(&self, slug: &str) -> Option<&Category> {
        self.by_slug.get(slug).map(|&i| &self.categories[i])
    }

    pub fn category_exists(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    /// Display name for a slug, or the slug itself when it is unknown.
    pub fn display_name<'a>(&'a self, slug: &'a str) -> &'a str {
        self.get(slug)
            .map(|c| c.display_name.as_str())
            .unwrap_or(slug)
    }

    pub fn color<'a>(&'a self, slug: &str) -> &'a str {
        self.get(slug)
            .and_then(|c| c.color.as_deref())
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn icon<'a>(&'a self, slug: &str) -> &'a str {
        self.get(slug)
            .and_then(|c| c.icon.as_deref())
            .unwrap_or(FALLBACK_ICON)
    }

    /// Root categories by sort order, ties kept in definition order.
    pub fn main_categories(&self) -> Vec<&Category> {
        self.sorted(|c| c.is_root())
    }

    /// Children of `parent_slug` by sort order. Empty for unknown parents.
    pub fn subcategories(&self, parent_slug: &str) -> Vec<&Category> {
        self.sorted(|c| c.parent_slug.as_deref() == Some(parent_slug))
    }

    /// Categories shown in the site navigation.
    pub fn navigation(&self) -> Vec<&Category> {
        self.main_categories()
    }

    /// Every category, flat, by sort order.
    pub fn all(&self) -> Vec<&Category> {
        self.sorted(|_| true)
    }

    pub fn hierarchy(&self) -> CategoryHierarchy<'_> {
        let mains = self.main_categories();
        let mut subs_by_parent: IndexMap<&str, Vec<&Category>> = IndexMap::new();
        for category in self.all() {
            if let Some(parent) = category.parent_slug.as_deref() {
                subs_by_parent.entry(parent).or_default().push(category);
            }
        }
        CategoryHierarchy {
            mains,
            subs_by_parent,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn sorted(&self, keep: impl Fn(&Category) -> bool) -> Vec<&Category> {
        let mut out: Vec<&Category> = self.categories.iter().filter(|c| keep(*c)).collect();
        // sort_by_key is stable, so equal sort orders keep definition order
        out.sort_by_key(|c| c.sort_order);
        out
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
