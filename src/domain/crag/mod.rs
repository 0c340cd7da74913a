//! Corrective RAG domain: grading, decomposition and generation contracts
//!
//! The traits here are the seams between the CRAG control flow and the
//! language-model-backed services implementing it; each has a test mock.

mod decomposer;
mod generator;
mod grader;

pub use decomposer::{DecompositionOutcome, QueryDecomposer};
pub use generator::{AnswerGenerator, QAPair};
pub use grader::{RelevanceGrader, RelevanceVerdict};

#[cfg(test)]
pub use decomposer::mock::MockQueryDecomposer;
#[cfg(test)]
pub use generator::mock::MockAnswerGenerator;
#[cfg(test)]
pub use grader::mock::MockRelevanceGrader;
