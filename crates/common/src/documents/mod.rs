//! Pipeline document types
//!
//! Typed records for the JSONB documents a draft accumulates as it moves
//! through the pipeline: the SERP snapshot and gap analysis produced by the
//! strategy stage, the article outline produced by the outline stage, and the
//! SEO score computed after content assembly. Workers validate these at the
//! job boundary instead of trusting dynamic shapes.

use serde::{Deserialize, Serialize};

/// One organic search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerpResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub rank: i32,
}

/// A "people also ask" entry returned alongside organic results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeopleAlsoAsk {
    pub question: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Raw research snapshot for a keyword
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SerpSnapshot {
    pub organic: Vec<SerpResult>,
    pub people_also_ask: Vec<PeopleAlsoAsk>,
    #[serde(default)]
    pub related_searches: Vec<String>,
}

impl SerpSnapshot {
    /// The top organic results whose pages get scraped for headings
    pub fn top_competitors(&self, count: usize) -> &[SerpResult] {
        &self.organic[..self.organic.len().min(count)]
    }
}

/// Structured result of the LLM gap analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapAnalysis {
    /// One of: Listicle, How-to Guide, Deep-Dive Essay, Comparison, Tutorial
    pub target_format: String,
    pub information_gain_angle: String,
    #[serde(default)]
    pub competitor_headings: Vec<String>,
    #[serde(default)]
    pub recommended_approach: String,
}

/// The strategy document persisted on a draft after analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyDocument {
    pub target_format: String,
    pub information_gain_angle: String,
    /// Flattened heading list across all scraped competitors
    pub competitor_headings: Vec<String>,
    pub recommended_approach: String,
    /// Raw research snapshot the analysis was based on
    pub serp: SerpSnapshot,
}

/// One planned section of the article outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineSection {
    pub heading: String,
    pub intent: String,
    #[serde(default)]
    pub keywords_to_include: Vec<String>,
}

/// The outline document persisted on a draft, awaiting approval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleOutline {
    pub title: String,
    pub sections: Vec<OutlineSection>,
}

/// SEO score summary for compiled content
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeoScore {
    pub keyword_in_h1: bool,
    pub keyword_in_first_paragraph: bool,
    pub keyword_in_h2: bool,
    /// Keyword occurrences per hundred words, rounded to 2 decimals
    pub entity_density: f64,
    pub word_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_document_round_trip() {
        let doc = StrategyDocument {
            target_format: "How-to Guide".to_string(),
            information_gain_angle: "Field-tested durability data".to_string(),
            competitor_headings: vec!["Fit and Sizing".to_string()],
            recommended_approach: "Lead with test data".to_string(),
            serp: SerpSnapshot {
                organic: vec![SerpResult {
                    title: "Best Hiking Boots".to_string(),
                    url: "https://example.com/boots".to_string(),
                    snippet: "Our top picks".to_string(),
                    rank: 1,
                }],
                people_also_ask: vec![PeopleAlsoAsk {
                    question: "Are hiking boots worth it?".to_string(),
                    ..Default::default()
                }],
                related_searches: vec!["hiking boots for women".to_string()],
            },
        };

        let json = serde_json::to_value(&doc).unwrap();
        let parsed: StrategyDocument = serde_json::from_value(json).unwrap();
        assert_eq!(doc, parsed);
    }

    #[test]
    fn test_outline_tolerates_missing_keywords() {
        // LLM output sometimes omits the keyword list entirely
        let json = serde_json::json!({
            "title": "Best Hiking Boots in 2026",
            "sections": [
                { "heading": "Fit Basics", "intent": "explain sizing" }
            ]
        });
        let outline: ArticleOutline = serde_json::from_value(json).unwrap();
        assert_eq!(outline.sections.len(), 1);
        assert!(outline.sections[0].keywords_to_include.is_empty());
    }

    #[test]
    fn test_outline_sections_stored_verbatim() {
        // A seven-section outline survives the JSONB round trip intact
        let outline = ArticleOutline {
            title: "Best Hiking Boots in 2026".to_string(),
            sections: (0..7)
                .map(|i| OutlineSection {
                    heading: format!("Heading {}", i + 1),
                    intent: format!("intent {}", i + 1),
                    keywords_to_include: vec![format!("kw{}", i + 1)],
                })
                .collect(),
        };

        let json = serde_json::to_value(&outline).unwrap();
        let parsed: ArticleOutline = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.sections.len(), 7);
        assert_eq!(parsed, outline);
    }

    #[test]
    fn test_top_competitors_bounded_by_results() {
        let snapshot = SerpSnapshot {
            organic: vec![SerpResult {
                title: "only one".to_string(),
                url: "https://example.com".to_string(),
                snippet: String::new(),
                rank: 1,
            }],
            ..Default::default()
        };
        assert_eq!(snapshot.top_competitors(3).len(), 1);
        assert!(snapshot.top_competitors(0).is_empty());
    }
}
