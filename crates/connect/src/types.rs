//! Wire types for the progress service API.

use serde::{Deserialize, Serialize};

use stridequest_core::challenges::ProgressRecord;
use stridequest_core::sync::UserProgress;

/// One user's progress document as the service stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub progress: ProgressRecord,
}

impl From<ProgressDocument> for UserProgress {
    fn from(doc: ProgressDocument) -> Self {
        Self {
            user_id: doc.user_id,
            username: doc.username,
            record: doc.progress,
        }
    }
}

/// Envelope for `GET /v1/progress`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProgressResponse {
    pub documents: Vec<ProgressDocument>,
}

/// Error body the service returns on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridequest_core::challenges::ProgressSnapshot;

    #[test]
    fn document_serializes_without_null_username() {
        let doc = ProgressDocument {
            user_id: "u1".to_string(),
            username: None,
            progress: ProgressRecord::from(&ProgressSnapshot::default_session()),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.starts_with(r#"{"userId":"u1","progress":{"#));
        assert!(!json.contains("username"));
    }

    #[test]
    fn document_converts_to_user_progress() {
        let doc = ProgressDocument {
            user_id: "u2".to_string(),
            username: Some("Dana".to_string()),
            progress: ProgressRecord::from(&ProgressSnapshot::default_session()),
        };
        let progress = UserProgress::from(doc.clone());
        assert_eq!(progress.user_id, "u2");
        assert_eq!(progress.username.as_deref(), Some("Dana"));
        assert_eq!(progress.record, doc.progress);
    }
}
