//! Inbound evaluation request.

use serde::{Deserialize, Serialize};

use super::error::{GradeError, Result};

/// A request to grade one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub repository_url: String,
}

impl EvaluationRequest {
    pub fn new(repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
        }
    }

    /// Shape check performed by the inbound surface before the pipeline runs.
    ///
    /// Host allow-listing happens later, in [`RepoLocator::parse`](crate::fetch::RepoLocator::parse).
    pub fn validate(&self) -> Result<()> {
        let url = self.repository_url.trim();
        if url.is_empty() {
            return Err(GradeError::InvalidRequest(
                "repositoryUrl must not be empty".to_string(),
            ));
        }
        url::Url::parse(url).map_err(|e| {
            GradeError::InvalidRequest(format!("repositoryUrl is not a valid URL: {e}"))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_and_garbage() {
        assert!(EvaluationRequest::new("").validate().is_err());
        assert!(EvaluationRequest::new("   ").validate().is_err());
        assert!(EvaluationRequest::new("not a url").validate().is_err());
    }

    #[test]
    fn test_validate_accepts_url() {
        assert!(EvaluationRequest::new("https://github.com/acme/app")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_deserializes_camel_case() {
        let req: EvaluationRequest =
            serde_json::from_str(r#"{"repositoryUrl":"https://github.com/a/b"}"#).unwrap();
        assert_eq!(req.repository_url, "https://github.com/a/b");
    }
}
