//! Payload filters and their conversion to Qdrant `Filter`.
//!
//! Only keyword equality is needed: every condition must hold (`must`), and
//! every filter built by the backend starts from the owning `userId`.

use qdrant_client::qdrant::{Condition, Filter};
use serde_json::{Map, Value};
use tracing::trace;

use crate::metadata::KEY_USER_ID;

/// Conjunction of `field == value` keyword conditions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadFilter {
    pub must: Vec<(String, String)>,
}

impl PayloadFilter {
    /// Filter scoped to one user's points.
    pub fn for_user(user_id: &str) -> Self {
        Self {
            must: vec![(KEY_USER_ID.to_string(), user_id.to_string())],
        }
    }

    /// Adds another equality condition.
    pub fn and(mut self, field: &str, value: &str) -> Self {
        self.must.push((field.to_string(), value.to_string()));
        self
    }

    /// Evaluates the filter against a flattened payload.
    pub fn matches(&self, payload: &Map<String, Value>) -> bool {
        self.must
            .iter()
            .all(|(k, v)| payload.get(k).and_then(Value::as_str) == Some(v.as_str()))
    }
}

/// Converts [`PayloadFilter`] to Qdrant [`Filter`] with `must` semantics.
pub fn to_qdrant_filter(f: &PayloadFilter) -> Filter {
    trace!(target: "rag_store::qdrant", conditions = f.must.len(), "filters::to_qdrant_filter");
    Filter::must(
        f.must
            .iter()
            .map(|(field, value)| Condition::matches(field.clone(), value.clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_condition_always_first() {
        let f = PayloadFilter::for_user("u1").and("url", "https://x");
        assert_eq!(f.must[0], ("userId".to_string(), "u1".to_string()));
        assert_eq!(to_qdrant_filter(&f).must.len(), 2);
        assert!(to_qdrant_filter(&f).should.is_empty());
    }

    #[test]
    fn matches_requires_every_condition() {
        let f = PayloadFilter::for_user("u1").and("filename", "a.pdf");
        let hit = json!({"userId": "u1", "filename": "a.pdf"});
        let other_user = json!({"userId": "u2", "filename": "a.pdf"});
        assert!(f.matches(hit.as_object().unwrap()));
        assert!(!f.matches(other_user.as_object().unwrap()));
    }
}
