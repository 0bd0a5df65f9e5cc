//! Two-level category taxonomy derived from the event collection.

use std::collections::HashMap;

use serde::Serialize;

use hearth_common::{subcategory_id, Event};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
    pub subcategories: Vec<SubcategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryCount {
    /// Composite `"<category>-<subcategory>"` id.
    pub id: String,
    pub name: String,
    pub count: usize,
}

impl Taxonomy {
    /// Count categories and subcategories across `events`. Both levels are
    /// ordered by descending count; equal counts keep first-seen order.
    pub fn build(events: &[Event]) -> Self {
        let mut categories: Vec<CategoryCount> = Vec::new();
        let mut category_pos: HashMap<String, usize> = HashMap::new();
        let mut sub_pos: HashMap<String, usize> = HashMap::new();

        for category in events.iter().filter_map(Event::category) {
            let name = category.primary_name();
            let pos = *category_pos.entry(name.to_string()).or_insert_with(|| {
                categories.push(CategoryCount {
                    name: name.to_string(),
                    count: 0,
                    subcategories: Vec::new(),
                });
                categories.len() - 1
            });

            let entry = &mut categories[pos];
            entry.count += 1;

            if let Some(sub) = category.sub_name() {
                let id = subcategory_id(name, sub);
                let sub_idx = *sub_pos.entry(id.clone()).or_insert_with(|| {
                    entry.subcategories.push(SubcategoryCount {
                        id,
                        name: sub.to_string(),
                        count: 0,
                    });
                    entry.subcategories.len() - 1
                });
                entry.subcategories[sub_idx].count += 1;
            }
        }

        // sort_by is stable, so ties keep first-seen order
        categories.sort_by(|a, b| b.count.cmp(&a.count));
        for category in &mut categories {
            category.subcategories.sort_by(|a, b| b.count.cmp(&a.count));
        }

        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryCount> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Look up a subcategory by its composite id.
    pub fn subcategory(&self, id: &str) -> Option<&SubcategoryCount> {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::Category;

    fn event_with(category: Option<Category>) -> Event {
        let mut e = Event::new("e", "x", "2025-01-01");
        e.category = category;
        e
    }

    #[test]
    fn bare_and_structured_categories_share_a_bucket() {
        let events = vec![
            event_with(Some(Category::bare("Tech"))),
            event_with(Some(Category::structured("Tech", "AI"))),
            event_with(Some(Category::structured("Tech", "AI"))),
        ];
        let taxonomy = Taxonomy::build(&events);

        let tech = taxonomy.category("Tech").unwrap();
        assert_eq!(tech.count, 3);
        assert_eq!(tech.subcategories.len(), 1);

        let ai = taxonomy.subcategory("Tech-AI").unwrap();
        assert_eq!(ai.count, 2);
        assert_eq!(ai.name, "AI");
    }

    #[test]
    fn sorted_by_descending_count_with_stable_ties() {
        let events = vec![
            event_with(Some(Category::bare("Music"))),
            event_with(Some(Category::bare("Art"))),
            event_with(Some(Category::bare("Tech"))),
            event_with(Some(Category::bare("Tech"))),
            event_with(Some(Category::bare("Art"))),
            event_with(Some(Category::bare("Food"))),
        ];
        let taxonomy = Taxonomy::build(&events);
        let names: Vec<&str> = taxonomy
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Art", "Tech", "Music", "Food"]);
    }

    #[test]
    fn subcategories_sorted_within_category() {
        let events = vec![
            event_with(Some(Category::structured("Sport", "Running"))),
            event_with(Some(Category::structured("Sport", "Climbing"))),
            event_with(Some(Category::structured("Sport", "Climbing"))),
            event_with(Some(Category::structured("Sport", "Chess"))),
        ];
        let taxonomy = Taxonomy::build(&events);
        let subs: Vec<&str> = taxonomy.categories[0]
            .subcategories
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(subs, vec!["Sport-Climbing", "Sport-Running", "Sport-Chess"]);
    }

    #[test]
    fn uncategorized_events_are_skipped() {
        let events = vec![
            event_with(None),
            event_with(Some(Category::bare("  "))),
            event_with(Some(Category::bare("Tech"))),
        ];
        let taxonomy = Taxonomy::build(&events);
        assert_eq!(taxonomy.categories.len(), 1);
        assert_eq!(taxonomy.categories[0].count, 1);
    }

    #[test]
    fn empty_collection_gives_empty_taxonomy() {
        assert!(Taxonomy::build(&[]).is_empty());
    }
}
