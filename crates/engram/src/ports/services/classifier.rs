//! Importance Classifier Port
//!
//! Abstract interface for the external collaborator that judges whether an
//! interaction is worth remembering. The scoring model lives outside Engram;
//! adapters only translate text in and a `ClassificationResult` out.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, ClassificationResult};

/// Importance classifier interface
///
/// Receives request/response text already truncated by the admission gate.
/// Adapters should build their result with [`ClassificationResult::sanitized`]
/// so every bound holds. Errors (network, timeout, unparsable output) are
/// absorbed by the gate as a rejection.
///
/// # Example
///
/// ```rust,ignore
/// use engram::ports::ImportanceClassifier;
///
/// struct KeywordClassifier;
///
/// #[async_trait]
/// impl ImportanceClassifier for KeywordClassifier {
///     async fn classify(&self, request: &str, response: &str)
///         -> Result<ClassificationResult, DomainError> {
///         // Score the interaction
///     }
/// }
/// ```
#[async_trait]
pub trait ImportanceClassifier: Send + Sync {
    /// Classify one interaction
    async fn classify(
        &self,
        request: &str,
        response: &str,
    ) -> Result<ClassificationResult, DomainError>;

    /// Identifier for logs (e.g. the model name)
    fn name(&self) -> &str {
        "classifier"
    }
}
