//! Result presentation: the final artifact, its export, and step rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::export::{FILE_NAME, MIME_TYPE, RESULT_HEADING};
use crate::events::{StepEvent, StepKind};

/// Final text of a crew run. Never reformatted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultArtifact {
    pub run_id: Uuid,
    pub text: String,
    pub finished_at: DateTime<Utc>,
}

impl ResultArtifact {
    pub fn new(run_id: Uuid, text: String) -> Self {
        Self { run_id, text, finished_at: Utc::now() }
    }
}

/// A downloadable file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub body: Vec<u8>,
}

/// The artifact as offered for download: raw bytes, fixed name and type.
pub fn export(artifact: &ResultArtifact) -> ExportFile {
    ExportFile {
        file_name: FILE_NAME,
        mime_type: MIME_TYPE,
        body: artifact.text.as_bytes().to_vec(),
    }
}

/// What the result view shows.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedResult {
    pub heading: &'static str,
    pub run_id: Uuid,
    pub finished_at: DateTime<Utc>,
    /// The artifact text, shown as markdown
    pub markdown: String,
    pub download_name: &'static str,
    pub download_mime: &'static str,
}

pub fn render(artifact: &ResultArtifact) -> RenderedResult {
    RenderedResult {
        heading: RESULT_HEADING,
        run_id: artifact.run_id,
        finished_at: artifact.finished_at,
        markdown: artifact.text.clone(),
        download_name: FILE_NAME,
        download_mime: MIME_TYPE,
    }
}

fn render_observation(text: &str) -> String {
    let mut out = String::from("**Observation**\n");
    for line in text.lines() {
        let rendered = if let Some(rest) = line.strip_prefix("Title: ") {
            format!("**Title:** {}", rest)
        } else if let Some(rest) = line.strip_prefix("Link: ") {
            format!("**Link:** {}", rest)
        } else if let Some(rest) = line.strip_prefix("Snippet: ") {
            format!("**Snippet:** {}", rest)
        } else {
            line.to_string()
        };
        out.push_str(&rendered);
        out.push('\n');
    }
    out
}

/// Markdown for one step, as shown in the live progress view.
pub fn render_step(step: &StepEvent) -> String {
    let body = match &step.kind {
        StepKind::Action { tool, tool_input, log } => format!(
            "# Action\n**Tool:** {}\n**Tool Input** {}\n**Log:** {}\n**Action Input:** ```json\n{}\n```\n",
            tool, tool_input, log, tool_input
        ),
        StepKind::Observation { text } => render_observation(text),
        StepKind::Thought { text } => format!("**Thought:** {}\n", text),
        StepKind::Delegation { coworker, request } => {
            format!("**Delegating to {}:** {}\n", coworker, request)
        }
        StepKind::TaskFinished { output } => format!("**Task finished**\n{}\n", output),
    };
    format!("---\n_{}_\n{}", step.agent, body)
}
