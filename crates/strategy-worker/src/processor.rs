//! Strategy processor
//!
//! Core logic for the strategy stage: SERP research, competitor heading
//! scraping, LLM gap analysis, and persisting the strategy document. The
//! final persistence advances the draft to OUTLINE_PENDING and enqueues the
//! outline job.

use draftforge_common::db::models::DraftStatus;
use draftforge_common::documents::StrategyDocument;
use draftforge_common::drafts::DraftService;
use draftforge_common::errors::{AppError, Result};
use draftforge_common::llm::{CompetitorSummary, LlmService};
use draftforge_common::metrics;
use draftforge_common::queue::StrategyJob;
use draftforge_common::research::ResearchClient;
use draftforge_common::scraper::HeadingScraper;
use draftforge_common::COMPETITOR_SCRAPE_COUNT;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Coarse progress milestones reported while a multi-minute analysis runs
const PROGRESS_CLAIMED: i32 = 10;
const PROGRESS_SERP_FETCHED: i32 = 30;
const PROGRESS_HEADINGS_SCRAPED: i32 = 60;
const PROGRESS_ANALYZING_GAP: i32 = 70;
const PROGRESS_GAP_ANALYZED: i32 = 85;
const PROGRESS_DONE: i32 = 100;

/// Strategy stage processor
pub struct StrategyProcessor {
    drafts: DraftService,
    research: Arc<ResearchClient>,
    scraper: Arc<HeadingScraper>,
    llm: LlmService,
}

impl StrategyProcessor {
    pub fn new(
        drafts: DraftService,
        research: Arc<ResearchClient>,
        scraper: Arc<HeadingScraper>,
        llm: LlmService,
    ) -> Self {
        Self {
            drafts,
            research,
            scraper,
            llm,
        }
    }

    /// Process one strategy job.
    ///
    /// Any failure before the strategy is persisted leaves the draft in
    /// ANALYZING; the error propagates so the queue runtime retries the job.
    #[instrument(skip(self, job), fields(draft_id = %job.draft_id, keyword = %job.keyword))]
    pub async fn process_job(&self, job: StrategyJob) -> Result<()> {
        info!("Processing strategy analysis");

        let repo = self.drafts.repository();

        // Claim the stage. A lost claim is either a retry of a failed
        // attempt (draft already ANALYZING, proceed) or a duplicate job for
        // a draft whose analysis already completed (skip without effect).
        let claimed = repo
            .try_claim_status(job.draft_id, DraftStatus::Researching, DraftStatus::Analyzing)
            .await?;
        if !claimed {
            let draft = repo
                .find_draft_by_id(job.draft_id)
                .await?
                .ok_or_else(|| AppError::DraftNotFound {
                    id: job.draft_id.to_string(),
                })?;
            match draft.draft_status() {
                DraftStatus::Analyzing => {
                    info!("Resuming analysis after a failed attempt");
                }
                status => {
                    warn!(status = ?status, "Strategy stage already ran for draft, skipping job");
                    return Ok(());
                }
            }
        }
        self.drafts
            .update_progress(job.draft_id, PROGRESS_CLAIMED)
            .await?;

        // Step 1: fetch SERP data
        info!("Fetching SERP data");
        let serp = match self.research.search_results(&job.keyword).await {
            Ok(serp) => {
                metrics::record_research("serp", true);
                serp
            }
            Err(e) => {
                metrics::record_research("serp", false);
                return Err(e);
            }
        };
        self.drafts
            .update_progress(job.draft_id, PROGRESS_SERP_FETCHED)
            .await?;

        // Step 2: scrape headings from the top competitors concurrently.
        // Individual page failures degrade to empty heading lists.
        let competitors = serp.top_competitors(COMPETITOR_SCRAPE_COUNT);
        let urls: Vec<String> = competitors.iter().map(|c| c.url.clone()).collect();
        info!(count = urls.len(), "Scraping competitor pages");

        let headings_by_url = self.scraper.headings(&urls).await;
        metrics::record_pages_scraped(urls.len());
        self.drafts
            .update_progress(job.draft_id, PROGRESS_HEADINGS_SCRAPED)
            .await?;

        // Flatten headings in competitor rank order
        let all_headings: Vec<String> = urls
            .iter()
            .flat_map(|url| headings_by_url.get(url).cloned().unwrap_or_default())
            .collect();

        // Step 3: gap analysis
        info!("Analyzing content gaps");
        self.drafts
            .update_progress(job.draft_id, PROGRESS_ANALYZING_GAP)
            .await?;

        let summaries: Vec<CompetitorSummary> = competitors
            .iter()
            .map(|c| CompetitorSummary {
                title: c.title.clone(),
                snippet: c.snippet.clone(),
                url: c.url.clone(),
                headings: headings_by_url.get(&c.url).cloned().unwrap_or_default(),
            })
            .collect();

        let started = std::time::Instant::now();
        let gap = self
            .llm
            .analyze_gap(&job.keyword, &summaries, &serp.people_also_ask)
            .await;
        metrics::record_generation("gap_analysis", started.elapsed().as_secs_f64(), gap.is_ok());
        let gap = gap?;

        self.drafts
            .update_progress(job.draft_id, PROGRESS_GAP_ANALYZED)
            .await?;

        // Step 4: persist the strategy; this advances the draft to
        // OUTLINE_PENDING and enqueues the outline job
        let strategy = StrategyDocument {
            target_format: gap.target_format,
            information_gain_angle: gap.information_gain_angle,
            competitor_headings: all_headings,
            recommended_approach: gap.recommended_approach,
            serp,
        };

        self.drafts
            .save_strategy(job.draft_id, &job.keyword, strategy)
            .await?;
        self.drafts
            .update_progress(job.draft_id, PROGRESS_DONE)
            .await?;

        info!("Strategy analysis completed");
        Ok(())
    }
}
