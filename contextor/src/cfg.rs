//! Per-turn retrieval knobs, taken from the user's knowledgebase settings.

use user_store::KnowledgebaseSettings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalParams {
    /// Candidates requested from the vector store.
    pub top_k: usize,
    /// Documents requested from the reranker.
    pub top_n: usize,
    /// Inclusive minimum relevance, `0.0..=1.0`.
    pub threshold: f32,
}

impl RetrievalParams {
    pub fn from_settings(s: &KnowledgebaseSettings) -> Self {
        Self {
            top_k: s.top_k.max(1) as usize,
            top_n: s.top_n.max(1) as usize,
            threshold: s.threshold(),
        }
    }
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self::from_settings(&KnowledgebaseSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_threshold_is_scaled() {
        let p = RetrievalParams::from_settings(&KnowledgebaseSettings {
            top_k: 0,
            top_n: 3,
            reranking_threshold: 25,
        });
        assert_eq!(p.top_k, 1);
        assert_eq!(p.top_n, 3);
        assert!((p.threshold - 0.25).abs() < f32::EPSILON);
    }
}
