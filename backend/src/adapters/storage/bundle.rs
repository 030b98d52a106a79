//! Clause Bundle Loader
//!
//! Reads the output of the upstream ingestion pipeline: documents, their
//! segmented clauses with risk labels, and reference chunks for grounding.
//! YAML (`.yaml`/`.yml`) and JSON are both accepted.
//!
//! ```yaml
//! documents:
//!   - id: lease-2024
//!     title: Residential Lease
//!     text: "Rent is due monthly. Deposit is 2 months."
//!     clauses:
//!       - id: deposit
//!         text: "Deposit is 2 months."
//!         risk: high
//!         term: "2 months"
//!         section_title: "4. Security Deposit"
//!         pages: [2, 2]
//! grounding:
//!   - source: state-statute
//!     text: "A deposit may not exceed one month of rent."
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

use crate::adapters::retrieval::GroundingChunk;
use crate::domain::clause::{Clause, PageRange, RiskLabel, SourceDocument, TextSpan};
use crate::domain::foundation::{ClauseId, DocumentId, ValidationError};

/// Errors raised while loading a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("Failed to read bundle {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse bundle: {0}")]
    Parse(String),

    #[error("Invalid record {record}: {message}")]
    Invalid { record: String, message: String },
}

impl BundleError {
    fn invalid(record: impl Into<String>, err: ValidationError) -> Self {
        Self::Invalid {
            record: record.into(),
            message: err.to_string(),
        }
    }
}

/// Documents, clauses and grounding chunks ready for the in-memory stores.
#[derive(Debug, Clone, Default)]
pub struct ClauseBundle {
    pub documents: Vec<SourceDocument>,
    pub clauses: Vec<Clause>,
    pub grounding: Vec<GroundingChunk>,
}

impl ClauseBundle {
    /// Loads a bundle from disk, picking the parser from the file extension.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).await.map_err(|e| BundleError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let bundle = if is_yaml {
            Self::from_yaml_str(&raw)?
        } else {
            Self::from_json_str(&raw)?
        };

        tracing::info!(
            path = %path.display(),
            documents = bundle.documents.len(),
            clauses = bundle.clauses.len(),
            grounding = bundle.grounding.len(),
            "Loaded clause bundle"
        );
        Ok(bundle)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, BundleError> {
        let file: BundleFile =
            serde_yaml::from_str(raw).map_err(|e| BundleError::Parse(e.to_string()))?;
        file.into_bundle()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, BundleError> {
        let file: BundleFile =
            serde_json::from_str(raw).map_err(|e| BundleError::Parse(e.to_string()))?;
        file.into_bundle()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// File records
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct BundleFile {
    #[serde(default)]
    documents: Vec<DocumentRecord>,
    #[serde(default)]
    grounding: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: String,
    #[serde(default)]
    title: Option<String>,
    text: String,
    #[serde(default)]
    clauses: Vec<ClauseRecord>,
}

#[derive(Debug, Deserialize)]
struct ClauseRecord {
    id: String,
    text: String,
    /// Byte offset into the document; located by search when absent.
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    risk: Option<RiskLabel>,
    #[serde(default = "default_negotiable")]
    negotiable: bool,
    #[serde(default)]
    term: Option<String>,
    #[serde(default)]
    section_title: Option<String>,
    #[serde(default)]
    pages: Option<(u32, u32)>,
}

fn default_negotiable() -> bool {
    true
}

impl BundleFile {
    fn into_bundle(self) -> Result<ClauseBundle, BundleError> {
        let mut bundle = ClauseBundle {
            grounding: self.grounding,
            ..ClauseBundle::default()
        };

        for record in self.documents {
            let document_id =
                DocumentId::new(&record.id).map_err(|e| BundleError::invalid(&record.id, e))?;
            let document = SourceDocument::new(
                document_id.clone(),
                record.title.unwrap_or_else(|| record.id.clone()),
                record.text,
            )
            .map_err(|e| BundleError::invalid(&record.id, e))?;

            for clause_record in record.clauses {
                let label = format!("{}/{}", record.id, clause_record.id);
                let clause = clause_record
                    .into_clause(&document, &document_id)
                    .map_err(|e| BundleError::invalid(&label, e))?;
                document
                    .verify_clause(&clause)
                    .map_err(|e| BundleError::invalid(&label, e))?;
                bundle.clauses.push(clause);
            }

            bundle.documents.push(document);
        }

        Ok(bundle)
    }
}

impl ClauseRecord {
    fn into_clause(
        self,
        document: &SourceDocument,
        document_id: &DocumentId,
    ) -> Result<Clause, ValidationError> {
        let start = match self.start {
            Some(start) => start,
            None => document.text().find(&self.text).ok_or_else(|| {
                ValidationError::invalid_format("text", "clause text not found in document")
            })?,
        };
        let span = TextSpan::new(start, start + self.text.len())?;

        let mut clause = Clause::new(
            ClauseId::new(self.id)?,
            document_id.clone(),
            self.text,
            span,
            self.risk.unwrap_or(RiskLabel::Standard),
            self.negotiable,
        )?;
        if let Some(term) = self.term {
            clause = clause.with_term(&term)?;
        }
        if let Some(title) = self.section_title {
            clause = clause.with_section_title(title);
        }
        if let Some((first, last)) = self.pages {
            clause = clause.with_pages(PageRange::new(first, last)?);
        }
        Ok(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
documents:
  - id: lease
    title: Residential Lease
    text: "Rent is due monthly. Deposit is 2 months."
    clauses:
      - id: rent
        text: "Rent is due monthly."
        start: 0
        negotiable: false
      - id: deposit
        text: "Deposit is 2 months."
        risk: high
        term: "2 months"
        section_title: "4. Security Deposit"
        pages: [2, 2]
grounding:
  - source: statute
    text: "A deposit may not exceed one month of rent."
"#;

    #[test]
    fn parses_yaml_and_locates_clauses() {
        let bundle = ClauseBundle::from_yaml_str(YAML).unwrap();

        assert_eq!(bundle.documents.len(), 1);
        assert_eq!(bundle.clauses.len(), 2);
        assert_eq!(bundle.grounding.len(), 1);

        let deposit = &bundle.clauses[1];
        assert_eq!(deposit.span().start(), 21);
        assert_eq!(deposit.term(), "2 months");
        assert_eq!(deposit.risk(), RiskLabel::High);
        assert_eq!(deposit.section_title(), Some("4. Security Deposit"));
        assert!(!bundle.clauses[0].is_negotiable());
    }

    #[test]
    fn parses_json() {
        let raw = r#"{"documents":[{"id":"d","text":"Pay 5 dollars.","clauses":[{"id":"c","text":"Pay 5 dollars."}]}]}"#;
        let bundle = ClauseBundle::from_json_str(raw).unwrap();
        assert_eq!(bundle.clauses[0].risk(), RiskLabel::Standard);
        assert_eq!(bundle.documents[0].title(), "d");
    }

    #[test]
    fn misplaced_offset_is_rejected() {
        let raw = r#"{"documents":[{"id":"d","text":"Pay 5 dollars. Pay 5 dollars.","clauses":[{"id":"c","text":"Pay 5 dollars.","start":3}]}]}"#;
        let err = ClauseBundle::from_json_str(raw).unwrap_err();
        assert!(matches!(err, BundleError::Invalid { ref record, .. } if record == "d/c"));
    }

    #[test]
    fn missing_text_is_rejected() {
        let raw = r#"{"documents":[{"id":"d","text":"Pay 5 dollars.","clauses":[{"id":"c","text":"Pay 6 dollars."}]}]}"#;
        assert!(ClauseBundle::from_json_str(raw).is_err());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ClauseBundle::from_json_str("not json"),
            Err(BundleError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn load_picks_parser_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let bundle = ClauseBundle::load(file.path()).await.unwrap();
        assert_eq!(bundle.clauses.len(), 2);
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = ClauseBundle::load("/nonexistent/bundle.json").await.unwrap_err();
        assert!(matches!(err, BundleError::Io { .. }));
    }
}
