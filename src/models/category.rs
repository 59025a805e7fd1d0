use serde::{Deserialize, Serialize};

use super::channel::ChannelRecord;

/// Default capacity of a keyword category bucket
pub const DEFAULT_CATEGORY_CAPACITY: usize = 50;
/// Default capacity of the catch-all bucket
pub const DEFAULT_CATCH_ALL_CAPACITY: usize = 100;

fn default_category_capacity() -> usize {
    DEFAULT_CATEGORY_CAPACITY
}

fn default_catch_all_capacity() -> usize {
    DEFAULT_CATCH_ALL_CAPACITY
}

/// One keyword category of the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    /// Lower-cased substrings matched against channel name and group
    pub keywords: Vec<String>,
    #[serde(default = "default_category_capacity")]
    pub capacity: usize,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str], capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            capacity,
        }
    }

    /// True if any keyword is a substring of either lower-cased field
    pub fn matches(&self, lower_name: &str, lower_group: &str) -> bool {
        self.keywords
            .iter()
            .any(|kw| lower_name.contains(kw.as_str()) || lower_group.contains(kw.as_str()))
    }
}

/// Fallback bucket for channels that match no keyword category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchAllRule {
    pub name: String,
    #[serde(default = "default_catch_all_capacity")]
    pub capacity: usize,
}

#[derive(Deserialize)]
struct TaxonomyDef {
    categories: Vec<CategoryRule>,
    catch_all: CatchAllRule,
}

impl From<TaxonomyDef> for Taxonomy {
    fn from(def: TaxonomyDef) -> Self {
        Taxonomy::new(def.categories, def.catch_all)
    }
}

/// Ordered category taxonomy plus catch-all.
///
/// Category order is significant: a channel goes to the first category
/// whose keywords match. Keywords are lower-cased on construction, so
/// matching is case-insensitive regardless of how the taxonomy was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaxonomyDef")]
pub struct Taxonomy {
    categories: Vec<CategoryRule>,
    catch_all: CatchAllRule,
}

impl Taxonomy {
    pub fn new(categories: Vec<CategoryRule>, catch_all: CatchAllRule) -> Self {
        let categories = categories
            .into_iter()
            .map(|mut rule| {
                let declared = rule.keywords.len();
                rule.keywords = rule
                    .keywords
                    .iter()
                    .map(|kw| kw.to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .collect();

                // An empty keyword would match every channel
                let dropped = declared - rule.keywords.len();
                if dropped > 0 {
                    tracing::warn!(
                        "Category '{}': ignoring {} empty keyword(s)",
                        rule.name,
                        dropped
                    );
                }
                rule
            })
            .collect();

        Self {
            categories,
            catch_all,
        }
    }

    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    pub fn catch_all(&self) -> &CatchAllRule {
        &self.catch_all
    }

    /// Bucket names in display order (catch-all last)
    pub fn bucket_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .chain(std::iter::once(self.catch_all.name.as_str()))
            .collect()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        let cap = DEFAULT_CATEGORY_CAPACITY;
        Taxonomy::new(
            vec![
                CategoryRule::new(
                    "أطفال",
                    &["kids", "children", "cartoon", "kids+", "bein kids", "spacetoon", "baraem", "jeem"],
                    cap,
                ),
                CategoryRule::new(
                    "مسلسلات",
                    &["series", "drama", "مسلسل", "show", "fiction", "دراما"],
                    cap,
                ),
                CategoryRule::new(
                    "رياضة",
                    &["sport", "sports", "football", "soccer", "كورة", "الدوري", "champions", "nba", "boxing", "الرياضة"],
                    cap,
                ),
                CategoryRule::new("أفلام", &["movie", "cinema", "film", "films", "hd", "أفلام"], cap),
                CategoryRule::new("أخبار", &["news", "news+", "cnn", "bbc", "العربية", "الجزيرة"], cap),
                CategoryRule::new("موسيقى", &["music", "song", "mtv", "موسيقى"], cap),
                CategoryRule::new("ترفيه", &["entertainment", "variety", "show", "تلفزيون"], cap),
                CategoryRule::new(
                    "توثيقي",
                    &["documentary", "documentary+", "nat geo", "animal", "discovery"],
                    cap,
                ),
                CategoryRule::new("دين", &["islamic", "quran", "مستودع", "دين", "إسلام"], cap),
            ],
            CatchAllRule {
                name: "أخرى".to_string(),
                capacity: DEFAULT_CATCH_ALL_CAPACITY,
            },
        )
    }
}

/// Bounded bucket of channels, stored as indices into the unique collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket {
    pub name: String,
    pub capacity: usize,
    pub channels: Vec<usize>,
}

impl CategoryBucket {
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            channels: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.channels.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Resolve stored indices against the collection they were built from
    pub fn resolve<'a>(&self, channels: &'a [ChannelRecord]) -> Vec<&'a ChannelRecord> {
        self.channels.iter().filter_map(|&i| channels.get(i)).collect()
    }
}

/// Category name to bucket mapping, in taxonomy order with catch-all last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizedChannels {
    pub buckets: Vec<CategoryBucket>,
}

impl CategorizedChannels {
    pub fn get(&self, name: &str) -> Option<&CategoryBucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryBucket> {
        self.buckets.iter()
    }

    /// Number of channels placed in any bucket
    pub fn total_categorized(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_lowercased() {
        let taxonomy = Taxonomy::new(
            vec![CategoryRule::new("News", &["CNN", "", "Bbc"], 2)],
            CatchAllRule {
                name: "Other".to_string(),
                capacity: 5,
            },
        );
        assert_eq!(taxonomy.categories()[0].keywords, vec!["cnn", "bbc"]);
        assert_eq!(taxonomy.bucket_names(), vec!["News", "Other"]);
    }

    #[test]
    fn test_empty_keywords_never_match_everything() {
        let taxonomy = Taxonomy::new(
            vec![CategoryRule::new("Broken", &["", ""], 2)],
            CatchAllRule {
                name: "Other".to_string(),
                capacity: 5,
            },
        );
        let rule = &taxonomy.categories()[0];

        assert!(rule.keywords.is_empty());
        assert!(!rule.matches("cnn", "news"));
    }

    #[test]
    fn test_taxonomy_from_json() {
        let json = r#"{
            "categories": [
                { "name": "Sports", "keywords": ["ESPN", "Sport"] },
                { "name": "News", "keywords": ["news"], "capacity": 3 }
            ],
            "catch_all": { "name": "Other" }
        }"#;
        let taxonomy: Taxonomy = serde_json::from_str(json).unwrap();

        assert_eq!(taxonomy.categories().len(), 2);
        assert_eq!(taxonomy.categories()[0].keywords, vec!["espn", "sport"]);
        assert_eq!(taxonomy.categories()[0].capacity, DEFAULT_CATEGORY_CAPACITY);
        assert_eq!(taxonomy.categories()[1].capacity, 3);
        assert_eq!(taxonomy.catch_all().capacity, DEFAULT_CATCH_ALL_CAPACITY);
    }

    #[test]
    fn test_default_taxonomy_order() {
        let taxonomy = Taxonomy::default();
        let names = taxonomy.bucket_names();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "أطفال");
        assert_eq!(names[9], "أخرى");
    }

    #[test]
    fn test_bucket_capacity() {
        let mut bucket = CategoryBucket::new("News", 1);
        assert!(!bucket.is_full());
        bucket.channels.push(0);
        assert!(bucket.is_full());
    }
}
