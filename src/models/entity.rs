use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A clinical mention found by the entity extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Surface text, trimmed and non-empty
    pub text: String,
    /// Type label from the extractor's vocabulary (e.g. "Sign_symptom")
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Score in [0, 1], rounded to 3 decimals
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(
        text: impl Into<String>,
        entity_type: impl Into<String>,
        confidence: f64,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            text: text.into(),
            entity_type: entity_type.into(),
            confidence: round3(confidence.clamp(0.0, 1.0)),
            start,
            end: end.max(start),
        }
    }
}

/// Round to three decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Entities grouped by category, in configured category order.
///
/// Every configured category is present, including the catch-all, even when
/// its list is empty. Serializes as a JSON object keyed by category name.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedEntities {
    buckets: Vec<(String, Vec<Entity>)>,
}

impl CategorizedEntities {
    /// Create empty buckets for the given category names
    pub fn with_categories<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut buckets: Vec<(String, Vec<Entity>)> = Vec::new();
        for name in names {
            if !buckets.iter().any(|(existing, _)| existing == name) {
                buckets.push((name.to_string(), Vec::new()));
            }
        }
        Self { buckets }
    }

    /// Append an entity to a category; returns false if the category is unknown
    pub fn push(&mut self, category: &str, entity: Entity) -> bool {
        match self.buckets.iter_mut().find(|(name, _)| name == category) {
            Some((_, list)) => {
                list.push(entity);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, category: &str) -> Option<&[Entity]> {
        self.buckets
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, list)| list.as_slice())
    }

    /// Iterate categories in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entity])> {
        self.buckets
            .iter()
            .map(|(name, list)| (name.as_str(), list.as_slice()))
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(name, _)| name.as_str())
    }

    /// Total number of entities across all categories
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, list)| list.len()).sum()
    }

    /// Per-category counts in category order
    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts(
            self.buckets
                .iter()
                .map(|(name, list)| (name.clone(), list.len()))
                .collect(),
        )
    }
}

impl Serialize for CategorizedEntities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (name, list) in &self.buckets {
            map.serialize_entry(name, list)?;
        }
        map.end()
    }
}

/// Category name to entity count, in category order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounts(pub Vec<(String, usize)>);

impl CategoryCounts {
    pub fn get(&self, category: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Aggregates derived from an entity list and its categorization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStatistics {
    pub total: usize,
    pub by_category: CategoryCounts,
    /// Mean confidence rounded to 3 decimals, 0.0 when there are no entities
    pub average_confidence: f64,
}

impl EntityStatistics {
    pub fn compute(entities: &[Entity], categorized: &CategorizedEntities) -> Self {
        let average_confidence = if entities.is_empty() {
            0.0
        } else {
            round3(entities.iter().map(|e| e.confidence).sum::<f64>() / entities.len() as f64)
        };

        Self {
            total: entities.len(),
            by_category: categorized.counts(),
            average_confidence,
        }
    }
}

/// The entities section of the composite result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitiesBlock {
    pub all_entities: Vec<Entity>,
    pub categorized: CategorizedEntities,
    pub statistics: EntityStatistics,
}
