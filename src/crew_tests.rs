//! Unit tests for crew assembly, the runner, the built-in engine and its tools.

#[cfg(test)]
mod crew_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::agents::{AgentSlot, MaxIterations, ToolKind};
    use crate::catalog::ModelCatalog;
    use crate::config::SearchConfig;
    use crate::crew::sequential::*;
    use crate::crew::tools::*;
    use crate::crew::*;
    use crate::error::{CompletionError, ConfigurationError, RunError, ToolError};
    use crate::events::{StepEvent, StepKind};
    use crate::tasks::{TaskDescription, TaskStore};
    use crate::test_support::{agents, catalog, RecordingEngine, ScriptedLlm};

    fn tasks() -> Vec<TaskDescription> {
        TaskStore::with_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).tasks().to_vec()
    }

    fn crew() -> CrewRun {
        CrewRun::assemble(&agents(), &tasks(), &catalog()).unwrap()
    }

    fn finished_outputs(steps: &[StepEvent]) -> Vec<String> {
        steps
            .iter()
            .filter_map(|s| match &s.kind {
                StepKind::TaskFinished { output } => Some(output.clone()),
                _ => None,
            })
            .collect()
    }

    // ============= Assembly Tests =============

    #[test]
    fn test_assemble_uses_execution_order() {
        let run = crew();
        let order: Vec<AgentSlot> = run.members.iter().map(|m| m.agent.slot).collect();

        assert_eq!(order, vec![AgentSlot::Researcher, AgentSlot::Consultant, AgentSlot::Author]);
        for member in &run.members {
            assert_eq!(member.task.owner, member.agent.slot);
        }
        assert!(run.members[2].tools.is_empty());
        assert!(run.members[0].allow_delegation);
    }

    #[test]
    fn test_assemble_rejects_unknown_model() {
        let mut agents = agents();
        agents[1].model_id = "phi3:latest".to_string();

        let err = CrewRun::assemble(&agents, &tasks(), &catalog()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownModel { slot: AgentSlot::Author, model: "phi3:latest".to_string() }
        );
    }

    #[test]
    fn test_assemble_requires_every_task() {
        let tasks: Vec<TaskDescription> = tasks().into_iter().filter(|t| t.owner != AgentSlot::Consultant).collect();
        assert!(matches!(
            CrewRun::assemble(&agents(), &tasks, &catalog()),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_coworkers_of() {
        let run = crew();
        let coworkers: Vec<AgentSlot> = run.coworkers_of(AgentSlot::Researcher).iter().map(|m| m.agent.slot).collect();
        assert_eq!(coworkers, vec![AgentSlot::Consultant, AgentSlot::Author]);
    }

    // ============= CrewRunner Tests =============

    #[tokio::test]
    async fn test_runner_submits_in_order_and_returns_artifact() {
        let engine = Arc::new(RecordingEngine::succeeding("# Meeting prep"));
        let runner = CrewRunner::new(engine.clone(), None);
        let sink = CollectingSink::new();

        let artifact = runner.run(&agents(), &tasks(), &catalog(), &sink).await.unwrap();

        assert_eq!(artifact.text, "# Meeting prep");
        assert_eq!(engine.seen(), vec![AgentSlot::Researcher, AgentSlot::Consultant, AgentSlot::Author]);
        assert_eq!(sink.steps().len(), 3);
    }

    #[tokio::test]
    async fn test_runner_failure_yields_no_artifact() {
        let engine = Arc::new(RecordingEngine::failing("model crashed"));
        let runner = CrewRunner::new(engine, None);

        let result = runner.run(&agents(), &tasks(), &catalog(), &CollectingSink::new()).await;
        assert!(matches!(result, Err(RunError::Engine(reason)) if reason == "model crashed"));
    }

    #[tokio::test]
    async fn test_runner_configuration_error_skips_engine() {
        let engine = Arc::new(RecordingEngine::succeeding("unused"));
        let runner = CrewRunner::new(engine.clone(), None);

        let result = runner.run(&agents(), &tasks(), &ModelCatalog::default(), &CollectingSink::new()).await;

        assert!(matches!(result, Err(RunError::Configuration(_))));
        assert!(engine.seen().is_empty());
    }

    #[tokio::test]
    async fn test_runner_timeout() {
        let engine = Arc::new(RecordingEngine::slow("late", Duration::from_secs(5)));
        let runner = CrewRunner::new(engine, Some(Duration::from_millis(50)));

        let result = runner.run(&agents(), &tasks(), &catalog(), &CollectingSink::new()).await;
        assert!(matches!(result, Err(RunError::Timeout(_))));
    }

    // ============= Reply Parsing Tests =============

    #[test]
    fn test_parse_final_answer() {
        let reply = parse_reply("Thought: I now know the final answer\nFinal Answer: Ten startups.");
        assert_eq!(
            reply,
            ParsedReply::Final {
                thought: "I now know the final answer".to_string(),
                answer: "Ten startups.".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_action_cuts_hallucinated_observation() {
        let reply = parse_reply(
            "Thought: look it up\nAction: DuckDuckGoSearch\nAction Input: ai startups\nObservation: made up\nFinal Answer: nope",
        );
        assert_eq!(
            reply,
            ParsedReply::Action {
                thought: "look it up".to_string(),
                tool: "DuckDuckGoSearch".to_string(),
                input: "ai startups".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unparsed() {
        assert_eq!(parse_reply("  just prose  "), ParsedReply::Unparsed("just prose".to_string()));
    }

    // ============= SequentialEngine Tests =============

    struct FakeSearch {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Tool for FakeSearch {
        fn name(&self) -> &str {
            "Search the internet"
        }

        fn description(&self) -> &str {
            "fake"
        }

        async fn call(&self, input: &str) -> Result<String, ToolError> {
            self.inputs.lock().unwrap().push(normalize_query(input));
            Ok("Title: Acme AI\nLink: https://acme.ai\nSnippet: Raised a seed round".to_string())
        }
    }

    #[tokio::test]
    async fn test_engine_runs_members_with_context() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "Thought: I know\nFinal Answer: research notes",
            "Final Answer: investment memo",
            "# The article\nBody",
        ]));
        let engine = SequentialEngine::new(llm.clone(), ToolBox::new());
        let sink = CollectingSink::new();

        let output = engine.execute(&crew(), &sink).await.unwrap();

        // the author has no tools, so plain prose is its answer
        assert_eq!(output, "# The article\nBody");
        let calls = llm.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].model, "openhermes:latest");
        assert_eq!(calls[2].model, "mistral:latest");
        assert!(calls[2].prompt.contains("research notes"));
        assert!(calls[2].prompt.contains("investment memo"));
        assert_eq!(
            finished_outputs(&sink.steps()),
            vec!["research notes", "investment memo", "# The article\nBody"]
        );
    }

    #[tokio::test]
    async fn test_engine_calls_tools() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "Thought: I should search\nAction: Search the internet\nAction Input: {\"query\": \"ai startups\"}",
            "Final Answer: found Acme",
            "Final Answer: memo",
            "article",
        ]));
        let search = Arc::new(FakeSearch { inputs: Mutex::new(Vec::new()) });
        let engine = SequentialEngine::new(llm.clone(), ToolBox::new().with(ToolKind::InternetSearch, search.clone()));
        let sink = CollectingSink::new();

        engine.execute(&crew(), &sink).await.unwrap();

        assert_eq!(*search.inputs.lock().unwrap(), vec!["ai startups".to_string()]);
        assert!(llm.calls()[1].prompt.starts_with("Observation: Title: Acme AI"));
        let steps = sink.steps();
        assert!(steps.iter().any(|s| matches!(&s.kind, StepKind::Action { tool, .. } if tool == "Search the internet")));
        assert!(steps.iter().any(|s| matches!(&s.kind, StepKind::Observation { text } if text.contains("acme.ai"))));
    }

    #[tokio::test]
    async fn test_engine_delegation() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "Action: Delegate work to co-worker\nAction Input: {\"coworker\": \"Tech content autor\", \"task\": \"Suggest a title\"}",
            "Ten AI startups to watch",
            "Final Answer: done",
            "Final Answer: memo",
            "article",
        ]));
        let engine = SequentialEngine::new(llm.clone(), ToolBox::new());
        let sink = CollectingSink::new();

        engine.execute(&crew(), &sink).await.unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[1].model, "mistral:latest");
        assert_eq!(calls[1].prompt, "Suggest a title");
        assert!(sink.steps().iter().any(|s| matches!(
            &s.kind,
            StepKind::Delegation { coworker, .. } if coworker == "Tech content autor"
        )));
    }

    #[tokio::test]
    async fn test_engine_iteration_limit() {
        let mut agents = agents();
        agents[0].max_iterations = MaxIterations::try_from(5u32).unwrap();
        let run = CrewRun::assemble(&agents, &tasks(), &catalog()).unwrap();
        let llm = Arc::new(ScriptedLlm::replying(&["not sure"; 5]));
        let engine = SequentialEngine::new(llm.clone(), ToolBox::new());

        let err = engine.execute(&run, &CollectingSink::new()).await.unwrap_err();

        assert!(matches!(err, RunError::IterationLimit { limit: 5, .. }));
        assert_eq!(llm.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_engine_completion_failure_aborts_run() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(CompletionError::Request("connection refused".to_string()))]));
        let engine = SequentialEngine::new(llm.clone(), ToolBox::new());

        let err = engine.execute(&crew(), &CollectingSink::new()).await.unwrap_err();

        match err {
            RunError::Completion { role, source } => {
                assert_eq!(role, AgentSlot::Researcher.persona().default_role());
                assert_eq!(source, CompletionError::Request("connection refused".to_string()));
            }
            other => panic!("Expected a completion error, got {:?}", other),
        }
        assert_eq!(llm.calls().len(), 1);
    }

    // ============= Tool Tests =============

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("{\"query\": \" ai startups \"}"), "ai startups");
        assert_eq!(normalize_query("\"quoted\""), "quoted");
        assert_eq!(normalize_query("plain text"), "plain text");
    }

    #[test]
    fn test_normalize_query_prefers_query_keys() {
        let input = r#"{"search_query": "quantum startups", "description": "web search"}"#;
        assert_eq!(normalize_query(input), "quantum startups");
        assert_eq!(normalize_query(r#"{"a_topic": "robotics", "q": "ai chips"}"#), "ai chips");
        assert_eq!(normalize_query(r#"{"limit": 3, "topic": "fintech"}"#), "fintech");
    }

    #[test]
    fn test_format_hits() {
        let hits = vec![
            SearchHit { title: "A".to_string(), link: "https://a".to_string(), snippet: "one".to_string() },
            SearchHit { title: "B".to_string(), link: "https://b".to_string(), snippet: "two".to_string() },
        ];
        assert_eq!(
            format_hits(&hits),
            "Title: A\nLink: https://a\nSnippet: one\n\n-----------------\nTitle: B\nLink: https://b\nSnippet: two\n\n-----------------"
        );
    }

    #[test]
    fn test_toolbox_select() {
        let toolbox = ToolBox::from_config(&SearchConfig::default());
        let selected = toolbox.select(&[ToolKind::InternetSearch, ToolKind::DuckDuckGoSearch]);
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Search the internet", "DuckDuckGoSearch"]);

        assert!(ToolBox::new().select(&[ToolKind::InternetSearch]).is_empty());
    }

    #[tokio::test]
    async fn test_internet_search_needs_api_key() {
        let tool = InternetSearch::new(reqwest::Client::new(), &SearchConfig::default());
        let err = tool.call("ai startups").await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured { .. }));
    }
}
