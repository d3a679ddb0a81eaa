use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{ExportError, ExportResult};

/// Raw report payload as submitted by the form collaborator.
///
/// Field names mirror the JSON body, so this type deserializes straight from
/// the request. Nothing here is trusted until it passes through
/// [`ReportModel::from_request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub title: String,
    pub subject_name: String,
    pub faculty_name: String,
    /// ISO-8601 calendar date, e.g. "2024-03-15". No timezone semantics.
    pub date: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: String,
    #[serde(default)]
    pub participation_data: ParticipationData,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
    /// Dereferenceable image URLs, in presentation order.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationData {
    pub total_students: u32,
    pub material_provided: u32,
    pub participated: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub roll_no: String,
    pub expectation: String,
}

/// Validated in-memory report, the shared input to both generators.
///
/// Constructed once per export and read-only from then on. Participation
/// counts carry no cross-field invariant (`participated` may exceed
/// `total_students`); enforcing one is a collaborator's decision.
#[derive(Debug, Clone)]
pub struct ReportModel {
    pub title: String,
    pub subject_name: String,
    pub faculty_name: String,
    pub date: NaiveDate,
    pub objectives: Vec<String>,
    pub learning_outcomes: String,
    pub participation: ParticipationData,
    pub feedback: Vec<FeedbackEntry>,
    pub images: Vec<String>,
}

impl ReportModel {
    /// Validating constructor: fails fast before anything reaches a
    /// generator.
    pub fn from_request(request: ReportRequest) -> ExportResult<Self> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(ExportError::Validation("title must not be empty".into()));
        }

        let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
            .map_err(|e| ExportError::Validation(format!("invalid date '{}': {}", request.date, e)))?;

        Ok(ReportModel {
            title,
            subject_name: request.subject_name,
            faculty_name: request.faculty_name,
            date,
            objectives: request.objectives,
            learning_outcomes: request.learning_outcomes,
            participation: request.participation_data,
            feedback: request.feedback,
            images: request.images,
        })
    }

    /// Re-check invariants on an already-built model. Generators assume this
    /// has passed.
    pub fn validate(&self) -> ExportResult<()> {
        if self.title.trim().is_empty() {
            return Err(ExportError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    /// Output filename stem: whitespace runs collapsed to underscores.
    pub fn file_stem(&self) -> String {
        self.title.split_whitespace().collect::<Vec<_>>().join("_")
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Attendance figure for the header lines; zero renders as "N/A".
    pub fn attendance_label(&self) -> String {
        if self.participation.total_students == 0 {
            "N/A".to_string()
        } else {
            self.participation.total_students.to_string()
        }
    }
}
