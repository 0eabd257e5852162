use super::corpus::{TemplateCorpus, TemplateRecord};
use super::vector::VectorIndex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ranks corpus templates against a free-text query
///
/// Tries the vector index first when one is attached and populated, then
/// falls back to keyword scoring, then to the corpus default. The result is
/// never empty.
#[derive(Clone)]
pub struct TemplateRetriever {
    corpus: Arc<TemplateCorpus>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl TemplateRetriever {
    pub fn new(corpus: Arc<TemplateCorpus>, index: Option<Arc<dyn VectorIndex>>) -> Self {
        Self { corpus, index }
    }

    /// Keyword scoring only
    pub fn keyword_only(corpus: Arc<TemplateCorpus>) -> Self {
        Self::new(corpus, None)
    }

    pub fn corpus(&self) -> &TemplateCorpus {
        &self.corpus
    }

    /// Up to `k` templates, best first; `k == 0` is treated as 1
    pub async fn search(&self, query: &str, k: usize) -> Vec<TemplateRecord> {
        let k = k.max(1);

        if let Some(records) = self.vector_search(query, k).await {
            return records;
        }

        let matched = self.keyword_search(query, k);
        if !matched.is_empty() {
            return matched;
        }

        debug!("No template matched {:?}, using default", query);
        vec![self.corpus.default_template().clone()]
    }

    async fn vector_search(&self, query: &str, k: usize) -> Option<Vec<TemplateRecord>> {
        let index = self.index.as_ref().filter(|index| !index.is_empty())?;

        match index.nearest(query, k).await {
            Ok(ids) => {
                let records: Vec<TemplateRecord> = ids
                    .iter()
                    .filter_map(|id| self.corpus.get(id).cloned())
                    .take(k)
                    .collect();
                if records.is_empty() {
                    None
                } else {
                    Some(records)
                }
            }
            Err(e) => {
                warn!("Vector search failed, using keyword scoring: {}", e);
                None
            }
        }
    }

    /// Deterministic keyword ranking; may return fewer than `k` or none
    pub fn keyword_search(&self, query: &str, k: usize) -> Vec<TemplateRecord> {
        let query_lower = query.to_lowercase();
        let words: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<(&TemplateRecord, u32)> = self
            .corpus
            .all()
            .iter()
            .map(|t| (t, keyword_score(t, query, &query_lower, &words)))
            .filter(|(_, score)| *score > 0)
            .collect();

        // sort_by is stable, so ties keep corpus order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(t, _)| t.clone())
            .collect()
    }
}

fn keyword_score(template: &TemplateRecord, query: &str, query_lower: &str, words: &[&str]) -> u32 {
    let mut score = 0;

    if query.contains(template.name.as_str()) {
        score += 5;
    }

    score += 2 * template
        .keywords
        .iter()
        .filter(|keyword| query_lower.contains(keyword.as_str()))
        .count() as u32;

    let description = template.description.to_lowercase();
    score += words.iter().filter(|word| description.contains(*word)).count() as u32;

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::vector::VectorIndexError;
    use async_trait::async_trait;

    fn retriever() -> TemplateRetriever {
        TemplateRetriever::keyword_only(Arc::new(TemplateCorpus::with_defaults()))
    }

    struct FixedIndex(Result<Vec<String>, ()>);

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn nearest(&self, _query: &str, _k: usize) -> Result<Vec<String>, VectorIndexError> {
            self.0
                .clone()
                .map_err(|_| VectorIndexError::Unavailable("offline".to_string()))
        }

        fn len(&self) -> usize {
            6
        }
    }

    #[test]
    fn test_score_components() {
        let corpus = TemplateCorpus::with_defaults();
        let brick = corpus.get("brick_breaker").unwrap();

        // three keywords plus three description hits
        let query = "挡板 球 砖块";
        let lower = query.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        assert_eq!(keyword_score(brick, query, &lower, &words), 9);

        // name match
        let query = "我想玩打砖块";
        let lower = query.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        assert!(keyword_score(brick, query, &lower, &words) >= 5);
    }

    #[tokio::test]
    async fn test_brick_breaker_ranks_first() {
        let results = retriever().search("挡板 球 砖块", 3).await;
        assert!(!results.is_empty() && results.len() <= 3);
        assert_eq!(results[0].id, "brick_breaker");
    }

    #[tokio::test]
    async fn test_no_match_returns_default() {
        let results = retriever().search("zzz qqq", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "snake_game");
    }

    #[tokio::test]
    async fn test_zero_k_returns_one() {
        let results = retriever().search("经典", 0).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_corpus_order() {
        // "经典" is a keyword of snake, brick_breaker and tetris; descriptions
        // of snake and tetris also contain it
        let results = retriever().search("经典", 6).await;
        let ids: Vec<&str> = results.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["snake_game", "tetris", "brick_breaker"]);
    }

    #[tokio::test]
    async fn test_keyword_search_is_deterministic() {
        let r = retriever();
        let a = r.search("休闲 简单 游戏", 3).await;
        let b = r.search("休闲 简单 游戏", 3).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_vector_results_used_when_available() {
        let index: Arc<dyn VectorIndex> =
            Arc::new(FixedIndex(Ok(vec!["tetris".to_string(), "unknown".to_string()])));
        let r = TemplateRetriever::new(Arc::new(TemplateCorpus::with_defaults()), Some(index));

        let results = r.search("挡板 球 砖块", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tetris");
    }

    #[tokio::test]
    async fn test_vector_failure_falls_back_to_keywords() {
        let index: Arc<dyn VectorIndex> = Arc::new(FixedIndex(Err(())));
        let r = TemplateRetriever::new(Arc::new(TemplateCorpus::with_defaults()), Some(index));

        let results = r.search("挡板 球 砖块", 3).await;
        assert_eq!(results[0].id, "brick_breaker");
    }

    #[tokio::test]
    async fn test_empty_vector_result_falls_back_to_keywords() {
        let index: Arc<dyn VectorIndex> = Arc::new(FixedIndex(Ok(Vec::new())));
        let r = TemplateRetriever::new(Arc::new(TemplateCorpus::with_defaults()), Some(index));

        let results = r.search("俄罗斯方块", 3).await;
        assert_eq!(results[0].id, "tetris");
    }
}
