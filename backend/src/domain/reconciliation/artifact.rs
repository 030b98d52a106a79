//! Output artifact bundling redline and summary with a content digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{NegotiationSummary, RedlinedDocument};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

/// Derived, regenerable output of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub redline: RedlinedDocument,
    pub summary: NegotiationSummary,
    /// Latest stored finalization time of the sessions involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<Timestamp>,
    /// Hex SHA-256 over the canonical JSON of `redline` and `summary`.
    pub digest: String,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    redline: &'a RedlinedDocument,
    summary: &'a NegotiationSummary,
}

impl OutputArtifact {
    pub fn new(
        redline: RedlinedDocument,
        summary: NegotiationSummary,
        finalized_at: Option<Timestamp>,
    ) -> Result<Self, DomainError> {
        let digest = Self::compute_digest(&redline, &summary)?;
        Ok(Self {
            redline,
            summary,
            finalized_at,
            digest,
        })
    }

    fn compute_digest(
        redline: &RedlinedDocument,
        summary: &NegotiationSummary,
    ) -> Result<String, DomainError> {
        let canonical = serde_json::to_vec(&DigestInput { redline, summary }).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize artifact: {}", e),
            )
        })?;
        Ok(format!("{:x}", Sha256::digest(&canonical)))
    }

    /// Canonical JSON bytes of the whole artifact.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize artifact: {}", e),
            )
        })
    }
}
