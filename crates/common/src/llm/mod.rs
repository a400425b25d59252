//! Text generation abstraction
//!
//! Provides a unified interface over the text-generation provider plus the
//! typed pipeline operations built on it: gap analysis, outline generation,
//! and the introduction/section/conclusion prose calls.
//!
//! Gap analysis and outline generation demand strict JSON back from the
//! model; a response that does not parse is a hard failure for that job
//! attempt and surfaces as `MalformedGeneration`.

use crate::config::LlmConfig;
use crate::documents::{ArticleOutline, GapAnalysis, PeopleAlsoAsk};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt under a system instruction
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Gemini generateContent client
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiTurn>,
}

#[derive(Serialize)]
struct GeminiTurn {
    role: String,
    #[serde(flatten)]
    content: GeminiContent,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    /// Create a new Gemini generator
    pub fn new(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            max_retries: config.max_retries,
        }
    }

    /// Make request with retry
    async fn request_with_retry(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(250 * (2_u64.pow(attempt)));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(prompt, system_instruction).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Generation request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::GenerationError {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![GeminiTurn {
                role: "user".to_string(),
                content: GeminiContent {
                    parts: vec![GeminiPart {
                        text: prompt.to_string(),
                    }],
                },
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationError {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GeminiResponse =
            response.json().await.map_err(|e| AppError::GenerationError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text: String = result
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AppError::GenerationError {
                message: "Empty response from model".to_string(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        self.request_with_retry(prompt, system_instruction).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Create a text generator from configuration
pub fn create_generator(config: &LlmConfig) -> Arc<dyn TextGenerator> {
    Arc::new(GeminiGenerator::new(config))
}

/// A competitor summary fed into gap analysis
#[derive(Debug, Clone)]
pub struct CompetitorSummary {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub headings: Vec<String>,
}

/// Typed pipeline operations over a text generator
pub struct LlmService {
    generator: Arc<dyn TextGenerator>,
}

impl LlmService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze the SERP to identify format and content gaps
    pub async fn analyze_gap(
        &self,
        keyword: &str,
        competitors: &[CompetitorSummary],
        paa_questions: &[PeopleAlsoAsk],
    ) -> Result<GapAnalysis> {
        let prompt = build_gap_prompt(keyword, competitors, paa_questions);
        let system = "You are an expert SEO content strategist. Always respond with valid JSON only.";

        let response = self.generator.generate(&prompt, system).await?;
        parse_json_response(&response)
    }

    /// Generate a structured outline based on the strategy
    pub async fn generate_outline(
        &self,
        keyword: &str,
        target_format: &str,
        information_gain_angle: &str,
        paa_questions: &[PeopleAlsoAsk],
    ) -> Result<ArticleOutline> {
        let prompt =
            build_outline_prompt(keyword, target_format, information_gain_angle, paa_questions);
        let system = "You are an expert SEO content writer. Always respond with valid JSON only.";

        let response = self.generator.generate(&prompt, system).await?;
        parse_json_response(&response)
    }

    /// Generate the article introduction
    pub async fn generate_introduction(
        &self,
        keyword: &str,
        title: &str,
        information_gain_angle: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Write a compelling introduction for an article with the title: \"{title}\"\n\n\
             Primary Keyword: {keyword}\n\
             Information Gain Angle: {information_gain_angle}\n\n\
             Requirements:\n\
             - Include the primary keyword in the first paragraph naturally\n\
             - Hook the reader with a compelling opening\n\
             - Explain what unique value this article provides\n\
             - Set expectations for what they'll learn\n\
             - Keep it engaging and conversational\n\
             - Length: 150-200 words\n\n\
             Write in markdown format."
        );
        let system = "You are an expert content writer. Write engaging, SEO-optimized content.";

        self.generator.generate(&prompt, system).await
    }

    /// Generate one body section
    pub async fn generate_section(
        &self,
        heading: &str,
        intent: &str,
        keywords_to_include: &[String],
        previous_excerpt: &str,
        information_gain_angle: &str,
        article_title: &str,
    ) -> Result<String> {
        let keywords_list = keywords_to_include.join(", ");
        let context = if previous_excerpt.is_empty() {
            "This is the first section after introduction"
        } else {
            previous_excerpt
        };

        let prompt = format!(
            "Write a comprehensive section for an article.\n\n\
             Article Title: {article_title}\n\
             Section Title: {heading}\n\
             Section Intent: {intent}\n\
             Keywords to Include: {keywords_list}\n\
             Information Gain Angle: {information_gain_angle}\n\
             Previous Section Context: {context}\n\n\
             Requirements:\n\
             - Write in markdown format\n\
             - Use the section title as an H2 heading\n\
             - Include the specified keywords naturally\n\
             - Provide deep, valuable information\n\
             - Address the section intent thoroughly\n\
             - Maintain consistency with the information gain angle\n\
             - Length: 300-500 words\n\
             - Use H3 subheadings where appropriate\n\
             - Include examples, tips, or actionable insights\n\n\
             Write the full section content in markdown."
        );
        let system =
            "You are an expert content writer. Write comprehensive, SEO-optimized long-form content.";

        self.generator.generate(&prompt, system).await
    }

    /// Generate the article conclusion
    pub async fn generate_conclusion(
        &self,
        article_title: &str,
        keyword: &str,
        article_summary: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Write a compelling conclusion for an article.\n\n\
             Article Title: {article_title}\n\
             Primary Keyword: {keyword}\n\
             Article Summary: {article_summary}\n\n\
             Requirements:\n\
             - Summarize key takeaways\n\
             - Reinforce the main value proposition\n\
             - Include a clear call-to-action (CTA)\n\
             - Include the primary keyword naturally\n\
             - Keep it engaging and actionable\n\
             - Length: 150-200 words\n\
             - Write in markdown format\n\n\
             Write the conclusion content."
        );
        let system = "You are an expert content writer. Write engaging conclusions with strong CTAs.";

        self.generator.generate(&prompt, system).await
    }
}

fn build_gap_prompt(
    keyword: &str,
    competitors: &[CompetitorSummary],
    paa_questions: &[PeopleAlsoAsk],
) -> String {
    let competitor_analysis = competitors
        .iter()
        .enumerate()
        .map(|(index, c)| {
            let headings_text = if c.headings.is_empty() {
                "\nHeadings: (Not available)".to_string()
            } else {
                let list = c
                    .headings
                    .iter()
                    .enumerate()
                    .map(|(i, h)| format!("  {}. {}", i + 1, h))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("\nHeadings:\n{}", list)
            };
            format!(
                "Competitor {}:\nTitle: {}\nSnippet: {}\nLink: {}{}",
                index + 1,
                c.title,
                c.snippet,
                c.url,
                headings_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let paa_list = paa_questions
        .iter()
        .map(|q| q.question.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an SEO content strategist. Analyze the SERP for the keyword \"{keyword}\".\n\n\
         Competitor Analysis:\n{competitor_analysis}\n\n\
         People Also Ask Questions:\n{paa_list}\n\n\
         Based on this analysis:\n\
         1. Identify the dominant content format (Listicle, How-to Guide, Deep-Dive Essay, Comparison, or Tutorial)\n\
         2. Analyze the headings structure of each competitor to understand their content organization\n\
         3. Determine what specific sub-topic or expert perspective is MISSING that would provide \"Information Gain\" for readers\n\
         4. Recommend a unique angle that competitors haven't covered, considering both their titles/snippets and heading structures\n\n\
         Respond in JSON format:\n\
         {{\n\
           \"target_format\": \"Listicle|How-to Guide|Deep-Dive Essay|Comparison|Tutorial\",\n\
           \"information_gain_angle\": \"specific angle that provides unique value\",\n\
           \"competitor_headings\": [\"heading1\", \"heading2\", \"heading3\"],\n\
           \"recommended_approach\": \"brief explanation of the recommended content approach\"\n\
         }}"
    )
}

fn build_outline_prompt(
    keyword: &str,
    target_format: &str,
    information_gain_angle: &str,
    paa_questions: &[PeopleAlsoAsk],
) -> String {
    let paa_list = paa_questions
        .iter()
        .map(|q| q.question.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create a comprehensive SEO-optimized article outline for the keyword \"{keyword}\".\n\n\
         Target Format: {target_format}\n\
         Information Gain Angle: {information_gain_angle}\n\
         People Also Ask Questions:\n{paa_list}\n\n\
         Generate a structured outline with:\n\
         - A keyword-optimized title (include the primary keyword naturally)\n\
         - Multiple sections (H2 headings) that:\n\
           * Address the information gain angle\n\
           * Answer the PAA questions\n\
           * Include supporting keywords naturally\n\
           * Follow the target format structure\n\n\
         Respond in JSON format:\n\
         {{\n\
           \"title\": \"SEO-optimized title with primary keyword\",\n\
           \"sections\": [\n\
             {{\n\
               \"heading\": \"H2 heading\",\n\
               \"intent\": \"what this section aims to achieve\",\n\
               \"keywords_to_include\": [\"keyword1\", \"keyword2\"]\n\
             }}\n\
           ]\n\
         }}\n\n\
         Ensure the outline has at least 6-8 sections for a comprehensive long-form article."
    )
}

/// Parse a strict-JSON model response, tolerating markdown code fences.
///
/// Anything that does not deserialize into `T` is a MalformedGeneration:
/// the job attempt fails and the queue runtime retries it.
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T> {
    let trimmed = response.trim();

    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the fence language tag and the closing fence
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.trim_start_matches(['\r', '\n'])
            .trim_end()
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    serde_json::from_str(body).map_err(|e| AppError::MalformedGeneration {
        message: format!("{}: {}", e, truncate(body, 200)),
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator {
        response: String,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String> {
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_parse_json_response_plain() {
        let analysis: GapAnalysis = parse_json_response(
            r#"{"target_format": "Listicle", "information_gain_angle": "angle"}"#,
        )
        .unwrap();
        assert_eq!(analysis.target_format, "Listicle");
        assert!(analysis.competitor_headings.is_empty());
    }

    #[test]
    fn test_parse_json_response_fenced() {
        let response = "```json\n{\"target_format\": \"Comparison\", \"information_gain_angle\": \"a\"}\n```";
        let analysis: GapAnalysis = parse_json_response(response).unwrap();
        assert_eq!(analysis.target_format, "Comparison");
    }

    #[test]
    fn test_parse_json_response_malformed() {
        let result: Result<GapAnalysis> = parse_json_response("I could not produce JSON, sorry.");
        assert!(matches!(
            result,
            Err(AppError::MalformedGeneration { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_gap_parses_typed_result() {
        let service = LlmService::new(Arc::new(CannedGenerator {
            response: r#"{
                "target_format": "How-to Guide",
                "information_gain_angle": "trail-tested data",
                "competitor_headings": ["Fit", "Price"],
                "recommended_approach": "lead with data"
            }"#
            .to_string(),
        }));

        let analysis = service.analyze_gap("best hiking boots", &[], &[]).await.unwrap();
        assert_eq!(analysis.target_format, "How-to Guide");
        assert_eq!(analysis.competitor_headings.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_outline_rejects_prose() {
        let service = LlmService::new(Arc::new(CannedGenerator {
            response: "Here is your outline: 1. Intro 2. Body".to_string(),
        }));

        let result = service
            .generate_outline("best hiking boots", "Listicle", "angle", &[])
            .await;
        assert!(matches!(result, Err(AppError::MalformedGeneration { .. })));
    }

    #[test]
    fn test_gap_prompt_includes_competitor_headings() {
        let competitors = vec![CompetitorSummary {
            title: "Best Boots".to_string(),
            snippet: "tested".to_string(),
            url: "https://example.com".to_string(),
            headings: vec!["Sizing".to_string()],
        }];
        let prompt = build_gap_prompt("best hiking boots", &competitors, &[]);
        assert!(prompt.contains("Competitor 1:"));
        assert!(prompt.contains("1. Sizing"));
        assert!(prompt.contains("best hiking boots"));
    }

    #[test]
    fn test_gap_prompt_marks_missing_headings() {
        let competitors = vec![CompetitorSummary {
            title: "Guide".to_string(),
            snippet: String::new(),
            url: "https://example.org".to_string(),
            headings: vec![],
        }];
        let prompt = build_gap_prompt("kw", &competitors, &[]);
        assert!(prompt.contains("Headings: (Not available)"));
    }
}
