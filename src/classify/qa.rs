use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use super::error::ClassifyError;
use super::prompt::format_context;
use super::{complete_bounded, rerank_passages};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::retrieval::{HybridRetriever, RetrievalError};
use crate::rules::Region;
use crate::scoring::PassageReranker;
use crate::vectordb::LawStore;

/// Fixed reply when the context does not contain the answer.
pub const NO_ANSWER: &str = "I don't know from the provided context.";

pub const QA_SYSTEM: &str = "You are a compliance analyst.
Answer using ONLY the provided context. If the answer is not in the context, say:
\"I don't know from the provided context.\"

Cite using bracket numbers that correspond to the context items: [1], [2], [3]...
Be concise and accurate.";

/// Builds the grounded-question user message over a [`format_context`] block.
pub fn build_qa_prompt(question: &str, context: &str) -> String {
    format!(
        "Question:\n{question}\n\nContext:\n{context}\n\n\
         Provide a short answer (max 6 concise bullet points) with bracket citations like [1], [2] where relevant.\n\
         If the context does not contain the answer, say exactly:\n\"{NO_ANSWER}\""
    )
}

/// Grounded question answering over the classifier's retriever, reranker and model.
///
/// One filtered (or unfiltered) query, no cascade. The model reply is returned as plain text.
pub struct QaChain<'a, S, M> {
    retriever: &'a HybridRetriever<S>,
    reranker: &'a PassageReranker,
    llm: &'a Arc<M>,
    llm_timeout: Option<Duration>,
}

impl<'a, S: LawStore, M: LanguageModel> QaChain<'a, S, M> {
    pub(super) fn new(
        retriever: &'a HybridRetriever<S>,
        reranker: &'a PassageReranker,
        llm: &'a Arc<M>,
        llm_timeout: Option<Duration>,
    ) -> Self {
        Self {
            retriever,
            reranker,
            llm,
            llm_timeout,
        }
    }

    /// Answers `question` from the top `k` passages, filtered to `regions` when non-empty.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn answer(
        &self,
        question: &str,
        k: usize,
        mmr: bool,
        regions: Option<&[Region]>,
    ) -> Result<String, ClassifyError> {
        let started = Instant::now();
        let k = k.max(1);

        let passages = self
            .retriever
            .retrieve(question, k, mmr, regions)
            .await
            .map_err(|e| match e {
                RetrievalError::Timeout { after_ms } => ClassifyError::Timeout {
                    stage: "law store search",
                    after_ms,
                },
                other => ClassifyError::Retrieval(other),
            })?;
        let (passages, _) = rerank_passages(self.reranker, question, passages, k).await?;

        let context = format_context(&passages);
        let request = CompletionRequest::new(QA_SYSTEM, build_qa_prompt(question, &context));
        let answer = complete_bounded(&**self.llm, self.llm_timeout, request).await?;

        info!(
            passages = passages.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Question answered"
        );
        Ok(answer.trim().to_string())
    }
}
