use tracing::{info, warn};

use crate::config::{EntityCategory, EntityCategoryConfig};
use crate::inference::EntityExtractor;
use crate::models::{CategorizedEntities, EntitiesBlock, Entity, EntityStatistics};

/// Maps entity type labels onto the configured clinical categories
#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: Vec<EntityCategory>,
    default_category: String,
}

impl Categorizer {
    pub fn new(config: &EntityCategoryConfig) -> Self {
        // Keywords are compared against upper-cased type labels
        let categories = config
            .categories
            .iter()
            .map(|category| EntityCategory {
                name: category.name.clone(),
                keywords: category.keywords.iter().map(|k| k.to_uppercase()).collect(),
            })
            .collect();

        Self {
            categories,
            default_category: config.default_category.clone(),
        }
    }

    /// Name of the category an entity type belongs to
    pub fn category_for(&self, entity_type: &str) -> &str {
        let label = entity_type.to_uppercase();
        self.categories
            .iter()
            .find(|category| category.keywords.iter().any(|k| label.contains(k.as_str())))
            .map(|category| category.name.as_str())
            .unwrap_or(&self.default_category)
    }

    /// Partition entities into categories.
    ///
    /// Categories are tried in declaration order and the first whose keyword
    /// occurs in the upper-cased type label wins. Every category, including
    /// the catch-all, appears in the result.
    pub fn categorize(&self, entities: &[Entity]) -> CategorizedEntities {
        let mut categorized = CategorizedEntities::with_categories(
            self.categories
                .iter()
                .map(|c| c.name.as_str())
                .chain(std::iter::once(self.default_category.as_str())),
        );

        for entity in entities {
            let category = self.category_for(&entity.entity_type);
            categorized.push(category, entity.clone());
        }

        let summary: Vec<String> = categorized
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, list)| format!("{} {}", list.len(), name))
            .collect();
        if summary.is_empty() {
            warn!("No entities categorized");
        } else {
            info!("Categorized: {}", summary.join(", "));
        }

        categorized
    }

    /// Build the entities block: flat list, categories and statistics
    pub fn build_block(&self, entities: Vec<Entity>) -> EntitiesBlock {
        let categorized = self.categorize(&entities);
        let statistics = EntityStatistics::compute(&entities, &categorized);

        EntitiesBlock {
            all_entities: entities,
            categorized,
            statistics,
        }
    }
}

/// Execute the entity stage.
///
/// Extraction failures degrade to an empty entity list; categorization and
/// statistics are always produced.
pub async fn execute_entity_stage(
    extractor: &dyn EntityExtractor,
    categorizer: &Categorizer,
    text: &str,
) -> EntitiesBlock {
    let entities = match extractor.extract(text).await {
        Ok(entities) => {
            info!("Extracted {} entities", entities.len());
            entities
        }
        Err(e) => {
            warn!(stage = "entities", "Entity extraction failed, using no entities: {}", e);
            Vec::new()
        }
    };

    categorizer.build_block(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;

    struct FixedExtractor(Vec<Entity>);

    #[async_trait]
    impl EntityExtractor for FixedExtractor {
        async fn extract(&self, _text: &str) -> Result<Vec<Entity>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl EntityExtractor for FailingExtractor {
        async fn extract(&self, _text: &str) -> Result<Vec<Entity>, CollaboratorError> {
            Err(CollaboratorError::Request("connection refused".into()))
        }
    }

    fn categorizer() -> Categorizer {
        Categorizer::new(&EntityCategoryConfig::default())
    }

    fn sample_entities() -> Vec<Entity> {
        vec![
            Entity::new("headache", "Sign_symptom", 0.99, 0, 8),
            Entity::new("ibuprofen", "Medication", 0.91, 10, 19),
            Entity::new("neck", "Biological_structure", 0.85, 20, 24),
            Entity::new("whiplash", "Disease_disorder", 0.97, 25, 33),
            Entity::new("physiotherapy", "Therapeutic_procedure", 0.88, 34, 47),
            Entity::new("ten sessions", "Dosage", 0.82, 48, 60),
        ]
    }

    #[test]
    fn test_scenario_b_symptom() {
        let entity = Entity::new("fever", "SYMPTOM", 0.95, 0, 5);
        let block = categorizer().build_block(vec![entity.clone()]);

        assert_eq!(block.categorized.get("symptoms"), Some(&[entity][..]));
        assert_eq!(block.statistics.total, 1);
        assert_eq!(block.statistics.average_confidence, 0.95);
        assert_eq!(block.statistics.by_category.get("symptoms"), Some(1));
    }

    #[test]
    fn test_categorize_by_keyword_substring() {
        let c = categorizer();
        let categorized = c.categorize(&sample_entities());

        assert_eq!(categorized.get("symptoms").unwrap()[0].text, "headache");
        assert_eq!(categorized.get("medications").unwrap()[0].text, "ibuprofen");
        assert_eq!(categorized.get("diseases").unwrap()[0].text, "whiplash");
        assert_eq!(categorized.get("treatments").unwrap()[0].text, "physiotherapy");

        let other: Vec<&str> = categorized
            .get("other")
            .unwrap()
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(other, vec!["neck", "ten sessions"]);
        assert!(categorized.get("anatomy").unwrap().is_empty());
    }

    #[test]
    fn test_first_matching_category_wins() {
        // "SIGN" (symptoms) and "DRUG" (medications) both occur
        let c = categorizer();
        assert_eq!(c.category_for("drug_sign"), "symptoms");
        assert_eq!(c.category_for("body_part"), "anatomy");
        assert_eq!(c.category_for("Lab_value"), "other");
    }

    #[test]
    fn test_partition_is_exact() {
        let entities = sample_entities();
        let categorized = categorizer().categorize(&entities);

        assert_eq!(categorized.total(), entities.len());
        for entity in &entities {
            let hits = categorized
                .iter()
                .filter(|(_, list)| list.contains(entity))
                .count();
            assert_eq!(hits, 1, "{} should be in exactly one category", entity.text);
        }
    }

    #[test]
    fn test_all_categories_present_when_empty() {
        let categorized = categorizer().categorize(&[]);
        let names: Vec<&str> = categorized.category_names().collect();

        assert_eq!(
            names,
            vec!["symptoms", "diseases", "treatments", "anatomy", "medications", "other"]
        );
        assert_eq!(categorized.total(), 0);
    }

    #[test]
    fn test_lowercase_keywords_in_config() {
        let config = EntityCategoryConfig {
            categories: vec![EntityCategory {
                name: "labs".to_string(),
                keywords: vec!["lab_value".to_string()],
            }],
            default_category: "misc".to_string(),
        };
        let c = Categorizer::new(&config);
        assert_eq!(c.category_for("Lab_value"), "labs");
        assert_eq!(c.category_for("Dosage"), "misc");
    }

    #[tokio::test]
    async fn test_entity_stage_uses_extractor() {
        let block =
            execute_entity_stage(&FixedExtractor(sample_entities()), &categorizer(), "text").await;
        assert_eq!(block.all_entities.len(), 6);
        assert_eq!(block.statistics.total, 6);
    }

    #[tokio::test]
    async fn test_entity_stage_degrades_on_failure() {
        let block = execute_entity_stage(&FailingExtractor, &categorizer(), "text").await;

        assert!(block.all_entities.is_empty());
        assert_eq!(block.statistics.total, 0);
        assert_eq!(block.statistics.average_confidence, 0.0);
        assert_eq!(block.categorized.category_names().count(), 6);
        assert_eq!(block.statistics.by_category.get("symptoms"), Some(0));
    }
}
