//! Per-sub-question corrective retrieval cycle
//!
//! An explicit finite-state machine:
//! `Retrieve -> Grade -> {Generate | WebSearch -> Generate} -> Done`.
//! Each state variant carries exactly the data that is legal in that state,
//! so an ungraded retrieved document can never reach generation.

use std::sync::Arc;

use tracing::{debug, info};

use super::steps;
use crate::domain::{
    AnswerGenerator, Document, DomainError, RelevanceGrader, RequestContext, Retriever, TraceLog,
    WebSearchProvider,
};

/// Cycle tuning
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Trusted domains OR-ed into the web search query in card mode
    pub trusted_sites: Vec<String>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            trusted_sites: [
                "ecoinvent.org",
                "openlca.org",
                "unep.org",
                "sciencebasedtargets.org",
                "climate-data.org",
                "ipcc.ch",
                "world.openfoodfacts.org",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// States of the corrective retrieval cycle
#[derive(Debug)]
enum CycleState {
    Retrieve,
    Grade { documents: Vec<Document> },
    WebSearch { kept: Vec<Document> },
    Generate { documents: Vec<Document> },
    Done { answer: String },
}

/// The CRAG cycle over injected collaborators.
///
/// One `run` serves exactly one sub-question and owns every document it
/// fetches; nothing is shared across sub-questions except the trace log.
#[derive(Debug)]
pub struct CragCycle {
    retriever: Arc<dyn Retriever>,
    grader: Arc<dyn RelevanceGrader>,
    web_search: Arc<dyn WebSearchProvider>,
    generator: Arc<dyn AnswerGenerator>,
    config: CycleConfig,
}

impl CragCycle {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        grader: Arc<dyn RelevanceGrader>,
        web_search: Arc<dyn WebSearchProvider>,
        generator: Arc<dyn AnswerGenerator>,
        config: CycleConfig,
    ) -> Self {
        Self {
            retriever,
            grader,
            web_search,
            generator,
            config,
        }
    }

    /// Run the cycle for one sub-question to completion
    pub async fn run(
        &self,
        question: &str,
        ctx: &RequestContext,
        trace: &mut TraceLog,
    ) -> Result<String, DomainError> {
        info!(question, "handling sub-question");

        let mut state = CycleState::Retrieve;

        loop {
            state = match state {
                CycleState::Retrieve => self.retrieve(question, trace).await?,
                CycleState::Grade { documents } => {
                    self.grade(question, documents, trace).await?
                }
                CycleState::WebSearch { kept } => {
                    self.web_search(question, ctx, kept, trace).await?
                }
                CycleState::Generate { documents } => {
                    self.generate(question, ctx, documents, trace).await?
                }
                CycleState::Done { answer } => return Ok(answer),
            };
        }
    }

    async fn retrieve(
        &self,
        question: &str,
        trace: &mut TraceLog,
    ) -> Result<CycleState, DomainError> {
        trace.push(steps::RETRIEVE_DOCUMENTS);

        let documents = self.retriever.retrieve(question).await?;
        debug!(count = documents.len(), "retrieved documents");

        Ok(CycleState::Grade { documents })
    }

    /// Grade every retrieved document. One irrelevant hit forces web
    /// supplementation even when other hits were kept; an empty retrieval
    /// trivially needs it.
    async fn grade(
        &self,
        question: &str,
        documents: Vec<Document>,
        trace: &mut TraceLog,
    ) -> Result<CycleState, DomainError> {
        trace.push(steps::GRADE_DOCUMENTS);

        let mut kept = Vec::with_capacity(documents.len());
        let mut discarded = 0usize;

        for document in documents {
            let verdict = self.grader.grade(question, &document.content).await?;

            if verdict.is_relevant() {
                kept.push(document);
            } else {
                discarded += 1;
            }
        }

        let needs_search = discarded > 0 || kept.is_empty();
        debug!(kept = kept.len(), discarded, needs_search, "graded retrieval");

        if needs_search {
            Ok(CycleState::WebSearch { kept })
        } else {
            Ok(CycleState::Generate { documents: kept })
        }
    }

    async fn web_search(
        &self,
        question: &str,
        ctx: &RequestContext,
        mut kept: Vec<Document>,
        trace: &mut TraceLog,
    ) -> Result<CycleState, DomainError> {
        trace.push(steps::WEB_SEARCH);

        let query = self.search_query(question, ctx);
        let hits = self.web_search.search(&query).await?;
        debug!(hits = hits.len(), "web search complete");

        // Web results are appended after the kept set, ungraded by policy
        kept.extend(
            hits.into_iter()
                .map(|hit| Document::from_web(hit.content, hit.url)),
        );

        Ok(CycleState::Generate { documents: kept })
    }

    async fn generate(
        &self,
        question: &str,
        ctx: &RequestContext,
        documents: Vec<Document>,
        trace: &mut TraceLog,
    ) -> Result<CycleState, DomainError> {
        trace.push(steps::GENERATING_SUB_ANSWER);

        let answer = self.generator.answer(question, &documents, ctx).await?;

        Ok(CycleState::Done { answer })
    }

    fn search_query(&self, question: &str, ctx: &RequestContext) -> String {
        if !ctx.mode.is_card() || self.config.trusted_sites.is_empty() {
            return question.to_string();
        }

        let filter = self
            .config
            .trusted_sites
            .iter()
            .map(|site| format!("site:{}", site))
            .collect::<Vec<_>>()
            .join(" OR ");

        format!("{} {}", question, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::crag::{MockAnswerGenerator, MockRelevanceGrader};
    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::search::mock::MockWebSearchProvider;
    use crate::domain::{AnswerMode, Provenance, RelevanceVerdict, WebSearchHit};

    struct Fixture {
        retriever: Arc<MockRetriever>,
        grader: Arc<MockRelevanceGrader>,
        web_search: Arc<MockWebSearchProvider>,
        generator: Arc<MockAnswerGenerator>,
    }

    impl Fixture {
        fn cycle(&self) -> CragCycle {
            CragCycle::new(
                self.retriever.clone(),
                self.grader.clone(),
                self.web_search.clone(),
                self.generator.clone(),
                CycleConfig::default(),
            )
        }
    }

    fn fixture(
        retriever: MockRetriever,
        grader: MockRelevanceGrader,
        web_search: MockWebSearchProvider,
    ) -> Fixture {
        Fixture {
            retriever: Arc::new(retriever),
            grader: Arc::new(grader),
            web_search: Arc::new(web_search),
            generator: Arc::new(MockAnswerGenerator::new()),
        }
    }

    fn two_passages() -> Vec<Document> {
        vec![
            Document::retrieved("relevant passage", 0.9),
            Document::retrieved("other passage", 0.8),
        ]
    }

    #[tokio::test]
    async fn test_all_relevant_skips_web_search() {
        let fx = fixture(
            MockRetriever::new().with_results(two_passages()),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new(),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        let answer = fx.cycle().run("q", &ctx, &mut trace).await.unwrap();

        assert_eq!(answer, "answer to: q");
        assert_eq!(fx.web_search.search_count(), 0);
        assert_eq!(fx.grader.grade_count(), 2);
        assert_eq!(
            trace.steps(),
            &[
                steps::RETRIEVE_DOCUMENTS,
                steps::GRADE_DOCUMENTS,
                steps::GENERATING_SUB_ANSWER,
            ]
        );
        // Both kept documents reach generation
        assert_eq!(fx.generator.seen_documents()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_one_irrelevant_forces_exactly_one_search() {
        let fx = fixture(
            MockRetriever::new().with_results(two_passages()),
            MockRelevanceGrader::all_relevant().push_verdict(RelevanceVerdict::Irrelevant),
            MockWebSearchProvider::new()
                .with_hits(vec![WebSearchHit::new("web content", "https://unep.org/a")]),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        fx.cycle().run("q", &ctx, &mut trace).await.unwrap();

        assert_eq!(fx.web_search.search_count(), 1);
        assert_eq!(
            trace.steps(),
            &[
                steps::RETRIEVE_DOCUMENTS,
                steps::GRADE_DOCUMENTS,
                steps::WEB_SEARCH,
                steps::GENERATING_SUB_ANSWER,
            ]
        );

        // Web results are appended to the kept set, not a replacement
        let seen = &fx.generator.seen_documents()[0];
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0].provenance, Provenance::Retrieved { .. }));
        assert!(seen[1].is_web_result());
    }

    #[tokio::test]
    async fn test_empty_retrieval_goes_to_web_search() {
        let fx = fixture(
            MockRetriever::new(),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new()
                .with_hits(vec![WebSearchHit::new("web content", "https://ipcc.ch/b")]),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        fx.cycle().run("q", &ctx, &mut trace).await.unwrap();

        assert_eq!(fx.grader.grade_count(), 0);
        assert_eq!(fx.web_search.search_count(), 1);
        assert_eq!(fx.generator.seen_documents()[0].len(), 1);
    }

    #[tokio::test]
    async fn test_card_mode_constrains_search_to_trusted_sites() {
        let fx = fixture(
            MockRetriever::new(),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new(),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Card);
        fx.cycle().run("is glass recyclable", &ctx, &mut trace).await.unwrap();

        let query = &fx.web_search.queries()[0];
        assert!(query.starts_with("is glass recyclable site:ecoinvent.org OR "));
        assert!(query.contains("site:ipcc.ch"));
    }

    #[tokio::test]
    async fn test_markdown_mode_uses_plain_query() {
        let fx = fixture(
            MockRetriever::new(),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new(),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        fx.cycle().run("is glass recyclable", &ctx, &mut trace).await.unwrap();

        assert_eq!(fx.web_search.queries()[0], "is glass recyclable");
    }

    #[tokio::test]
    async fn test_retriever_failure_aborts_cycle() {
        let fx = fixture(
            MockRetriever::new().with_error("index offline"),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new(),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        let result = fx.cycle().run("q", &ctx, &mut trace).await;

        assert!(result.is_err());
        assert_eq!(trace.steps(), &[steps::RETRIEVE_DOCUMENTS]);
    }

    #[tokio::test]
    async fn test_grader_failure_aborts_cycle() {
        let fx = fixture(
            MockRetriever::new().with_results(two_passages()),
            MockRelevanceGrader::all_relevant().with_error("grader down"),
            MockWebSearchProvider::new(),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        let result = fx.cycle().run("q", &ctx, &mut trace).await;

        assert!(result.is_err());
        assert_eq!(fx.web_search.search_count(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_cycle() {
        let fx = fixture(
            MockRetriever::new(),
            MockRelevanceGrader::all_relevant(),
            MockWebSearchProvider::new().with_error("search down"),
        );

        let mut trace = TraceLog::new();
        let ctx = RequestContext::new(AnswerMode::Markdown);
        let result = fx.cycle().run("q", &ctx, &mut trace).await;

        assert!(result.is_err());
        assert_eq!(fx.generator.answer_count(), 0);
    }
}
