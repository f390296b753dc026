//! Incident service data models
//!
//! Type definitions for the analyze/refine request and response payloads.
//! Field-level invariants are enforced through the `Validate` trait at both
//! boundary crossings: before a document is accepted from the upstream call
//! and again before it is echoed back inside a refinement request.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ServiceError};

/// Transcript length bounds accepted by the analyze endpoint
const TRANSCRIPT_MIN_CHARS: usize = 50;
const TRANSCRIPT_MAX_CHARS: usize = 50_000;

/// Optional context length ceiling
const CONTEXT_MAX_CHARS: usize = 5_000;

/// Feedback length bounds accepted by the refine endpoint
const FEEDBACK_MIN_CHARS: usize = 5;
const FEEDBACK_MAX_CHARS: usize = 2_000;

const DESCRIPTION_MIN_CHARS: usize = 10;
const SUBJECT_MIN_CHARS: usize = 5;
const BODY_MIN_CHARS: usize = 20;

/// Field-level invariant checks, applied identically on both sides of the
/// service boundary.
pub trait Validate {
    /// Check every invariant without mutating the value
    fn validate(&self) -> Result<()>;
}

/// Which section of a generated document a refinement targets.
///
/// The policy analysis and source quotes are never targeted on their own;
/// they are regenerated as a byproduct of any edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    All,
    IncidentForm,
    DraftEmail,
}

impl SectionType {
    /// Wire name of the section
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::All => "all",
            SectionType::IncidentForm => "incident_form",
            SectionType::DraftEmail => "draft_email",
        }
    }
}

/// Request payload for submitting a transcript for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRequest {
    /// The transcript text to analyze
    pub transcript: String,

    /// Optional additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl TranscriptRequest {
    /// Create a request, trimming surrounding whitespace.
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into().trim().to_string(),
            additional_context: None,
        }
    }

    /// Attach additional context, trimmed.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into().trim().to_string());
        self
    }
}

impl Validate for TranscriptRequest {
    fn validate(&self) -> Result<()> {
        let chars = self.transcript.trim().chars().count();
        if chars < TRANSCRIPT_MIN_CHARS {
            return Err(ServiceError::validation(format!(
                "transcript must be at least {} characters",
                TRANSCRIPT_MIN_CHARS
            )));
        }
        if chars > TRANSCRIPT_MAX_CHARS {
            return Err(ServiceError::validation(format!(
                "transcript must be at most {} characters",
                TRANSCRIPT_MAX_CHARS
            )));
        }

        if let Some(ref context) = self.additional_context {
            if context.chars().count() > CONTEXT_MAX_CHARS {
                return Err(ServiceError::validation(format!(
                    "additional_context must be at most {} characters",
                    CONTEXT_MAX_CHARS
                )));
            }
        }

        Ok(())
    }
}

/// Generated incident report form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentForm {
    /// When the incident occurred, ISO 8601 with a time component
    pub date_and_time_of_incident: String,

    /// Name of the service user involved
    pub service_user_name: String,

    /// Where the incident occurred
    pub location_of_incident: String,

    /// Category of incident
    pub type_of_incident: String,

    /// Detailed description of what happened
    pub description_of_incident: String,

    /// Actions taken immediately after the incident
    pub immediate_actions_taken: String,

    /// Whether first aid was given
    pub was_first_aid_administered: bool,

    /// Whether emergency services were called
    pub were_emergency_services_contacted: bool,

    /// People notified about the incident
    pub who_was_notified: String,

    /// Witnesses to the incident
    #[serde(default = "default_witnesses")]
    pub witnesses: String,

    /// Agreed follow-up actions
    pub agreed_next_steps: String,

    /// Whether a risk assessment is required
    pub risk_assessment_needed: bool,

    /// Type of risk assessment, when one is needed
    #[serde(default)]
    pub if_yes_which_risk_assessment: String,
}

fn default_witnesses() -> String {
    "None".to_string()
}

impl Validate for IncidentForm {
    fn validate(&self) -> Result<()> {
        if !is_iso_datetime(&self.date_and_time_of_incident) {
            return Err(ServiceError::validation(
                "date_and_time_of_incident must be ISO 8601 with a time component \
                 (e.g. \"2025-01-31T14:30:00\")",
            ));
        }

        require_non_empty("service_user_name", &self.service_user_name)?;
        require_non_empty("location_of_incident", &self.location_of_incident)?;
        require_non_empty("type_of_incident", &self.type_of_incident)?;
        require_min_chars(
            "description_of_incident",
            &self.description_of_incident,
            DESCRIPTION_MIN_CHARS,
        )?;
        require_non_empty("immediate_actions_taken", &self.immediate_actions_taken)?;
        require_non_empty("who_was_notified", &self.who_was_notified)?;
        require_non_empty("agreed_next_steps", &self.agreed_next_steps)?;

        Ok(())
    }
}

/// Requires the `T` separator so a bare date is rejected; accepts both
/// offset (including `Z`) and naive forms.
fn is_iso_datetime(value: &str) -> bool {
    if !value.contains('T') {
        return false;
    }
    DateTime::parse_from_rfc3339(value).is_ok() || value.parse::<NaiveDateTime>().is_ok()
}

/// Analysis of the transcript against policies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyAnalysis {
    /// Policy sections relevant to this incident
    #[serde(default)]
    pub relevant_policies: Vec<String>,

    /// What was done correctly per policy
    #[serde(default)]
    pub policy_compliance: Vec<String>,

    /// Actions that should be taken per policy
    #[serde(default)]
    pub recommended_actions: Vec<String>,

    /// Concerns or red flags identified
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl PolicyAnalysis {
    /// Trim every item and drop empty ones, preserving order.
    pub fn sanitize(&mut self) {
        for list in [
            &mut self.relevant_policies,
            &mut self.policy_compliance,
            &mut self.recommended_actions,
            &mut self.concerns,
        ] {
            list.retain_mut(|item| {
                let trimmed = item.trim();
                if trimmed.is_empty() {
                    false
                } else {
                    if trimmed.len() != item.len() {
                        *item = trimmed.to_string();
                    }
                    true
                }
            });
        }
    }
}

impl Validate for PolicyAnalysis {
    fn validate(&self) -> Result<()> {
        for (name, list) in [
            ("relevant_policies", &self.relevant_policies),
            ("policy_compliance", &self.policy_compliance),
            ("recommended_actions", &self.recommended_actions),
            ("concerns", &self.concerns),
        ] {
            if list.iter().any(|item| item.trim().is_empty()) {
                return Err(ServiceError::validation(format!(
                    "{} must not contain empty entries",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Draft email generated from the incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEmail {
    /// Email recipients; a bare string on the wire becomes a one-element list
    #[serde(deserialize_with = "string_or_list")]
    pub to: Vec<String>,

    /// CC recipients, if any
    #[serde(default, deserialize_with = "optional_string_or_list")]
    pub cc: Option<Vec<String>>,

    /// Email subject line
    pub subject: String,

    /// Email body content
    pub body: String,
}

impl Validate for DraftEmail {
    fn validate(&self) -> Result<()> {
        if self.to.is_empty() {
            return Err(ServiceError::validation(
                "draft_email.to must have at least one recipient",
            ));
        }
        if self.to.iter().any(|addr| addr.trim().is_empty()) {
            return Err(ServiceError::validation(
                "draft_email.to must not contain empty addresses",
            ));
        }

        if let Some(ref cc) = self.cc {
            if cc.iter().any(|addr| addr.trim().is_empty()) {
                return Err(ServiceError::validation(
                    "draft_email.cc must not contain empty addresses",
                ));
            }
        }

        require_min_chars("draft_email.subject", &self.subject, SUBJECT_MIN_CHARS)?;
        require_min_chars("draft_email.body", &self.body, BODY_MIN_CHARS)?;

        Ok(())
    }
}

/// Complete response from analyzing a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Generated incident report form
    pub incident_form: IncidentForm,

    /// Analysis against policies
    pub policy_analysis: PolicyAnalysis,

    /// Draft notification email
    pub draft_email: DraftEmail,

    /// Verbatim transcript excerpts keyed by field name, for fact-checking
    #[serde(default)]
    pub source_quotes: HashMap<String, String>,
}

impl AnalysisResponse {
    /// Normalize a freshly ingested document before validation.
    pub fn sanitize(&mut self) {
        self.policy_analysis.sanitize();
    }
}

impl Validate for AnalysisResponse {
    fn validate(&self) -> Result<()> {
        self.incident_form.validate()?;
        self.policy_analysis.validate()?;
        self.draft_email.validate()?;
        Ok(())
    }
}

/// Request payload for refining generated content with feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// The document the refinement mutates
    pub original_response: AnalysisResponse,

    /// Free-text feedback describing the requested changes
    pub feedback: String,

    /// Which section to edit
    pub section_to_edit: SectionType,
}

impl FeedbackRequest {
    /// Create a refinement request, trimming the feedback.
    pub fn new(
        original_response: AnalysisResponse,
        feedback: impl Into<String>,
        section_to_edit: SectionType,
    ) -> Self {
        Self {
            original_response,
            feedback: feedback.into().trim().to_string(),
            section_to_edit,
        }
    }
}

impl Validate for FeedbackRequest {
    fn validate(&self) -> Result<()> {
        let chars = self.feedback.trim().chars().count();
        if chars < FEEDBACK_MIN_CHARS {
            return Err(ServiceError::validation(format!(
                "feedback must be at least {} characters",
                FEEDBACK_MIN_CHARS
            )));
        }
        if chars > FEEDBACK_MAX_CHARS {
            return Err(ServiceError::validation(format!(
                "feedback must be at most {} characters",
                FEEDBACK_MAX_CHARS
            )));
        }

        // The echoed document must still satisfy every invariant; a stale or
        // hand-edited base is rejected before any network traffic.
        self.original_response.validate()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
}

/// Policies document, as served by the read-only endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliciesResponse {
    pub policies: String,
}

/// Incident form template, as served by the read-only endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTemplateResponse {
    pub template: serde_json::Value,
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn require_min_chars(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().is_empty() || value.chars().count() < min {
        return Err(ServiceError::validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

/// Accept either a bare string or a list of strings on the wire.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Wire::deserialize(deserializer)? {
        Wire::One(value) => vec![value],
        Wire::Many(values) => values,
    })
}

/// `string_or_list`, but tolerating an absent or null field.
fn optional_string_or_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Wire>::deserialize(deserializer)?.map(|wire| match wire {
        Wire::One(value) => vec![value],
        Wire::Many(values) => values,
    }))
}
