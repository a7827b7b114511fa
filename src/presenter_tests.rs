//! Unit tests for the result artifact, its export and step rendering.

#[cfg(test)]
mod presenter_tests {
    use uuid::Uuid;

    use crate::events::{StepEvent, StepKind};
    use crate::presenter::*;

    #[test]
    fn test_export_is_byte_identical() {
        let text = "# Meeting prep 🚀\n\n| Startup | URL |\n|---|---|\n| Acme | https://acme.ai |\n\n  trailing spaces  \n";
        let artifact = ResultArtifact::new(Uuid::new_v4(), text.to_string());

        let file = export(&artifact);

        assert_eq!(file.file_name, "meeting_prep.md");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.body, text.as_bytes());
    }

    #[test]
    fn test_export_empty_artifact() {
        let artifact = ResultArtifact::new(Uuid::new_v4(), String::new());
        assert!(export(&artifact).body.is_empty());
    }

    #[test]
    fn test_render_passes_markdown_through() {
        let artifact = ResultArtifact::new(Uuid::new_v4(), "## Heading\n- item".to_string());
        let rendered = render(&artifact);

        assert_eq!(rendered.heading, "Your requested analysis is ready");
        assert_eq!(rendered.markdown, artifact.text);
        assert_eq!(rendered.run_id, artifact.run_id);
        assert_eq!(rendered.download_name, "meeting_prep.md");
        assert_eq!(rendered.download_mime, "text/plain");
    }

    // ============= Step Rendering Tests =============

    #[test]
    fn test_render_action_step() {
        let step = StepEvent::new(
            "Researcher",
            StepKind::Action {
                tool: "DuckDuckGoSearch".to_string(),
                tool_input: "ai startups".to_string(),
                log: "Thought: search".to_string(),
            },
        );
        let markdown = render_step(&step);

        assert!(markdown.starts_with("---\n_Researcher_\n# Action\n"));
        assert!(markdown.contains("**Tool:** DuckDuckGoSearch"));
        assert!(markdown.contains("**Action Input:** ```json\nai startups\n```"));
    }

    #[test]
    fn test_render_observation_bolds_search_fields() {
        let step = StepEvent::new(
            "Researcher",
            StepKind::Observation { text: "Title: Acme\nLink: https://acme.ai\nSnippet: Seed round\n\n-----------------".to_string() },
        );
        let markdown = render_step(&step);

        assert!(markdown.contains("**Title:** Acme\n**Link:** https://acme.ai\n**Snippet:** Seed round\n"));
        assert!(markdown.contains("-----------------"));
    }

    #[test]
    fn test_render_task_finished() {
        let step = StepEvent::new("Tech content autor", StepKind::TaskFinished { output: "# Post".to_string() });
        assert_eq!(render_step(&step), "---\n_Tech content autor_\n**Task finished**\n# Post\n");
    }
}
