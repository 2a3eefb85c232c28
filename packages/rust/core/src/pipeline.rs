//! Batch orchestration: filter → dedup-check → download → extract → sync →
//! dedup-commit, with per-article failure isolation.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use articlesync_coze::CozeClient;
use articlesync_dedup::DedupStore;
use articlesync_extract::{ArticleDom, extract_full_text, extract_references, extract_snippet};
use articlesync_fetch::Downloader;
use articlesync_shared::{
    AppConfig, ArticleBatch, ArticleRef, ArticleSyncError, Result, Whitelist, article_sn,
    resolve_api_token, synthetic_id,
};

// ---------------------------------------------------------------------------
// Targets / outcomes
// ---------------------------------------------------------------------------

/// Per-purpose knowledge-base ids documents are routed to.
#[derive(Debug, Clone)]
pub struct KbTargets {
    /// Hot/incremental knowledge base receiving snippet documents.
    pub snippet: String,
    /// Full-text knowledge base. Full-text sync is skipped silently when unset.
    pub fulltext: Option<String>,
    /// Knowledge base receiving one document per cited reference.
    pub references: String,
}

/// Why an article was skipped without being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source channel is not whitelisted.
    ChannelNotWhitelisted,
    /// URL carries no `sn` identifier, so the article cannot be deduplicated.
    MissingIdentifier,
    /// Identifier already committed by an earlier run.
    AlreadyProcessed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ChannelNotWhitelisted => "channel not whitelisted",
            Self::MissingIdentifier => "url has no sn identifier",
            Self::AlreadyProcessed => "already processed",
        };
        f.write_str(s)
    }
}

/// Outcome of one article run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// Synchronization was attempted (individual uploads may still have failed).
    Synced,
    /// Article was skipped before any network/CPU was spent on it.
    Skipped(SkipReason),
}

/// Counts for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Articles that reached the synchronization stage.
    pub synced: usize,
    /// Articles skipped by filter/dedup/identifier checks.
    pub skipped: usize,
    /// Articles that failed mid-pipeline (download, extraction, bad item).
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives batches of article references through the full pipeline.
///
/// All collaborators are owned and constructed once at startup; nothing is
/// read from the environment at processing time.
pub struct Pipeline {
    whitelist: Whitelist,
    downloader: Downloader,
    coze: CozeClient,
    dedup: DedupStore,
    kbs: KbTargets,
}

impl Pipeline {
    /// Assemble a pipeline from pre-built collaborators.
    pub fn new(
        whitelist: Whitelist,
        downloader: Downloader,
        coze: CozeClient,
        dedup: DedupStore,
        kbs: KbTargets,
    ) -> Self {
        Self {
            whitelist,
            downloader,
            coze,
            dedup,
            kbs,
        }
    }

    /// Build the pipeline from a validated config: resolves the API token,
    /// opens the dedup log, and constructs the HTTP clients.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let token = resolve_api_token(&config.coze)?;

        let whitelist = Whitelist::new(config.pipeline.whitelist.iter().cloned());
        if whitelist.is_empty() {
            warn!("whitelist is empty, every article will be rejected");
        }

        let downloader = Downloader::new(config.pipeline.fetch_timeout_secs)?;
        let coze = CozeClient::new(&config.coze.api_base, &token, config.coze.timeout_secs)?;
        let dedup = DedupStore::load(std::path::Path::new(&config.pipeline.dedup_log))?;

        let kbs = KbTargets {
            snippet: config.coze.snippet_kb_id.clone(),
            fulltext: config.coze.fulltext_kb_id.clone(),
            references: config.coze.references_kb_id.clone(),
        };

        Ok(Self::new(whitelist, downloader, coze, dedup, kbs))
    }

    /// Process one batch, strictly sequentially. Never returns an error:
    /// every per-article failure is logged and isolated so one bad article
    /// cannot abort the rest of the batch.
    #[instrument(skip_all, fields(batch_id = %Uuid::now_v7(), articles = batch.data.len()))]
    pub async fn process_batch(&self, batch: &ArticleBatch) -> BatchSummary {
        info!("processing batch");
        let mut summary = BatchSummary::default();

        for article in &batch.data {
            match self.process_article(article).await {
                Ok(ArticleOutcome::Synced) => summary.synced += 1,
                Ok(ArticleOutcome::Skipped(reason)) => {
                    info!(title = %article.title, %reason, "article skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(title = %article.title, error = %e, "article failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            synced = summary.synced,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch complete"
        );
        summary
    }

    /// Run one article through filter → dedup-check → download → extract →
    /// sync → dedup-commit.
    async fn process_article(&self, article: &ArticleRef) -> Result<ArticleOutcome> {
        if !self.whitelist.accepts(&article.source_channel) {
            return Ok(ArticleOutcome::Skipped(SkipReason::ChannelNotWhitelisted));
        }

        // Resolve the HTML body and the dedup identifier. URL items are
        // gated on `sn` and membership before any download; inline items
        // carry their HTML and stay outside deduplication.
        let (html, sn) = match (&article.url, &article.content) {
            (Some(url), _) => {
                let Some(sn) = article_sn(url) else {
                    return Ok(ArticleOutcome::Skipped(SkipReason::MissingIdentifier));
                };
                if self.dedup.is_member(&sn).await {
                    return Ok(ArticleOutcome::Skipped(SkipReason::AlreadyProcessed));
                }
                let html = self.downloader.fetch(url).await?;
                (html, Some(sn))
            }
            (None, Some(content)) => {
                let id = article.msg_id.as_deref().map(synthetic_id);
                debug!(
                    synthetic_id = id.as_deref().unwrap_or("-"),
                    "processing inline article"
                );
                (content.clone(), None)
            }
            (None, None) => {
                return Err(ArticleSyncError::malformed(
                    "article has neither url nor content",
                ));
            }
        };

        // Parse and extract in one synchronous pass. The parsed DOM is not
        // `Send` and must be dropped before the first upload await.
        let content = extract_content(&html, &article.title, self.kbs.fulltext.is_some())?;

        self.sync_article(article, &content).await;

        // Commit after the sync attempts regardless of their outcome, so a
        // document-store outage cannot cause a permanent reprocessing loop.
        if let Some(sn) = sn {
            if let Err(e) = self.dedup.commit(&sn).await {
                warn!(%sn, error = %e, "dedup commit failed, article may be reprocessed");
            }
        }

        Ok(ArticleOutcome::Synced)
    }

    /// Steps 7–9: snippet, optional full text, references. Upload failures
    /// are logged and isolated from each other.
    async fn sync_article(&self, article: &ArticleRef, content: &ExtractedContent) {
        let url = article.url.as_deref().unwrap_or("");
        let body = format!(
            "---\n文章URL: {url}\n文章标题: {}\n文章摘要: {}\n---",
            article.title, content.snippet
        );
        if let Err(e) = self
            .coze
            .create_document(&self.kbs.snippet, &article.title, &body)
            .await
        {
            warn!(title = %article.title, error = %e, "snippet sync failed");
        }

        if let (Some(fulltext_kb), Some(text)) = (&self.kbs.fulltext, &content.full_text) {
            if let Err(e) = self
                .coze
                .create_document(fulltext_kb, &article.title, text)
                .await
            {
                warn!(title = %article.title, error = %e, "full-text sync failed");
            }
        }

        if !content.references.is_empty() {
            info!(count = content.references.len(), "syncing references");
        }
        for entry in &content.references {
            let body = format!("---\n文献标题: {}\n文献链接: {}\n---", entry.title, entry.link);
            if let Err(e) = self
                .coze
                .create_document(&self.kbs.references, &entry.title, &body)
                .await
            {
                warn!(link = %entry.link, error = %e, "reference sync failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction pass
// ---------------------------------------------------------------------------

/// Everything derived from one article's HTML; transient, consumed by the
/// sync steps.
struct ExtractedContent {
    snippet: String,
    /// `None` when the full-text KB is unconfigured or extraction failed.
    full_text: Option<String>,
    references: Vec<articlesync_shared::ReferenceEntry>,
}

/// Run all extraction rules over the HTML in one pass.
///
/// An unextractable snippet aborts the article before any upload: never
/// sync an empty or partial document. A full-text extraction failure only
/// drops the optional full-text document.
fn extract_content(html: &str, title: &str, want_full_text: bool) -> Result<ExtractedContent> {
    let dom = ArticleDom::parse(html);

    let snippet = extract_snippet(&dom)?;

    let full_text = if want_full_text {
        match extract_full_text(&dom) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(title = %title, error = %e, "full-text extraction failed");
                None
            }
        }
    } else {
        None
    };

    let references = extract_references(&dom, title);

    Ok(ExtractedContent {
        snippet,
        full_text,
        references,
    })
}
