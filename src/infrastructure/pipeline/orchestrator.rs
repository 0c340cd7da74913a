//! Outer orchestration: decompose, iterate CRAG cycles, consolidate, format

use std::sync::Arc;

use tracing::{debug, info};

use super::steps;
use crate::domain::{
    AnswerGenerator, DomainError, FinalResponse, QAPair, QueryDecomposer, RequestContext,
    ResponseFormatter, TraceLog,
};

use super::CragCycle;

/// The request-scoped ask pipeline.
///
/// Straight-line control flow: decompose the query, run one CRAG cycle per
/// sub-question strictly in order, zip the answers into QAPairs, generate the
/// consolidated answer, and in card mode reshape it through the formatter.
#[derive(Debug)]
pub struct AskPipeline {
    decomposer: Arc<dyn QueryDecomposer>,
    cycle: CragCycle,
    generator: Arc<dyn AnswerGenerator>,
    formatter: Arc<dyn ResponseFormatter>,
}

impl AskPipeline {
    pub fn new(
        decomposer: Arc<dyn QueryDecomposer>,
        cycle: CragCycle,
        generator: Arc<dyn AnswerGenerator>,
        formatter: Arc<dyn ResponseFormatter>,
    ) -> Self {
        Self {
            decomposer,
            cycle,
            generator,
            formatter,
        }
    }

    /// Answer one user query end to end
    pub async fn ask(
        &self,
        query: &str,
        ctx: &RequestContext,
        trace: &mut TraceLog,
    ) -> Result<FinalResponse, DomainError> {
        let query = query.trim();

        if query.is_empty() {
            return Err(DomainError::validation("query must not be empty"));
        }

        info!(mode = ?ctx.mode, "processing query");

        trace.push(steps::TRANSFORM_QUERY);
        let outcome = self.decomposer.decompose(query, ctx.mode).await?;
        let sub_questions = outcome.into_sub_questions(query);
        debug!(count = sub_questions.len(), "sub-questions resolved");

        trace.push(steps::ENTERING_CRAG);
        let mut sub_answers = Vec::with_capacity(sub_questions.len());

        for question in &sub_questions {
            let answer = self.cycle.run(question, ctx, trace).await?;
            sub_answers.push(answer);
        }

        let qa_pairs = QAPair::zip(&sub_questions, &sub_answers);

        trace.push(steps::GENERATING_FINAL_ANSWER);
        let consolidated = self.generator.consolidate(query, &qa_pairs, ctx).await?;

        if ctx.mode.is_card() {
            let card = self.formatter.format_card(&consolidated).await?;
            Ok(FinalResponse::Card(card))
        } else {
            Ok(FinalResponse::Markdown(consolidated))
        }
    }
}
