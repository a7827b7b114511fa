//! Built-in orchestration engine: runs each crew member in turn with a
//! Thought/Action/Observation loop over the chat endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::crew::engine::{CrewEngine, StepSink};
use crate::crew::tools::{Tool, ToolBox};
use crate::crew::{CrewMember, CrewRun};
use crate::error::RunError;
use crate::events::{StepEvent, StepKind};
use crate::llm::{ChatMessage, LlmBackend};

pub const DELEGATE_TOOL: &str = "Delegate work to co-worker";
pub const ASK_TOOL: &str = "Ask question to co-worker";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Thought: you should always think about what to do
Action: the action to take, only one name of [{tool_names}], just the name, exactly as it's written.
Action Input: the input to the action, just a simple text, no additional formatting
Observation: the result of the action

Once all necessary information is gathered:

Thought: I now know the final answer
Final Answer: the final answer to the original input question";

/// A reply parsed from the agent's output.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedReply {
    Final { thought: String, answer: String },
    Action { thought: String, tool: String, input: String },
    Unparsed(String),
}

fn strip_thought(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("Thought:").unwrap_or(text).trim().to_string()
}

/// Split a reply into thought, action or final answer. Whichever marker
/// comes first wins when both are present.
pub fn parse_reply(text: &str) -> ParsedReply {
    let final_pos = text.find("Final Answer:");
    let action_pos = text.find("Action:");

    match (action_pos, final_pos) {
        (Some(a), f) if f.map_or(true, |f| a < f) => {
            let after = &text[a + "Action:".len()..];
            let tool = after.lines().next().unwrap_or_default().trim().to_string();
            let input = match after.find("Action Input:") {
                Some(i) => {
                    let raw = &after[i + "Action Input:".len()..];
                    let raw = raw.split("\nObservation").next().unwrap_or(raw);
                    raw.trim().to_string()
                }
                None => String::new(),
            };
            ParsedReply::Action { thought: strip_thought(&text[..a]), tool, input }
        }
        (_, Some(f)) => ParsedReply::Final {
            thought: strip_thought(&text[..f]),
            answer: text[f + "Final Answer:".len()..].trim().to_string(),
        },
        _ => ParsedReply::Unparsed(text.trim().to_string()),
    }
}

#[derive(Deserialize)]
struct DelegationInput {
    coworker: String,
    #[serde(alias = "question")]
    task: String,
    #[serde(default)]
    context: String,
}

/// Parse `{"coworker": .., "task": .., "context": ..}` or `coworker|task|context`.
fn parse_delegation(input: &str) -> Option<DelegationInput> {
    if let Ok(parsed) = serde_json::from_str::<DelegationInput>(input.trim()) {
        return Some(parsed);
    }
    let mut parts = input.splitn(3, '|');
    let coworker = parts.next()?.trim().to_string();
    let task = parts.next()?.trim().to_string();
    let context = parts.next().unwrap_or_default().trim().to_string();
    Some(DelegationInput { coworker, task, context })
}

pub struct SequentialEngine {
    llm: Arc<dyn LlmBackend>,
    tools: ToolBox,
}

impl SequentialEngine {
    pub fn new(llm: Arc<dyn LlmBackend>, tools: ToolBox) -> Self {
        Self { llm, tools }
    }

    fn system_prompt(member: &CrewMember, tools: &[Arc<dyn Tool>], coworkers: &[&CrewMember]) -> String {
        let mut prompt = member.agent.system_prompt();

        let mut names: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
        let mut descriptions: Vec<String> =
            tools.iter().map(|t| format!("{}: {}", t.name(), t.description())).collect();

        if member.allow_delegation && !coworkers.is_empty() {
            let roles = coworkers.iter().map(|c| c.agent.role.as_str()).collect::<Vec<_>>().join(", ");
            names.push(DELEGATE_TOOL.to_string());
            names.push(ASK_TOOL.to_string());
            descriptions.push(format!(
                "{}: Delegate a specific task to one of the following co-workers: {}. Input is JSON with keys coworker, task and context.",
                DELEGATE_TOOL, roles
            ));
            descriptions.push(format!(
                "{}: Ask a specific question to one of the following co-workers: {}. Input is JSON with keys coworker, question and context.",
                ASK_TOOL, roles
            ));
        }

        if !names.is_empty() {
            prompt.push_str("\n\nYou ONLY have access to the following tools, and should NEVER make up tools that are not listed here:\n\n");
            prompt.push_str(&descriptions.join("\n"));
            prompt.push_str("\n\n");
            prompt.push_str(&FORMAT_INSTRUCTIONS.replace("{tool_names}", &names.join(", ")));
        } else {
            prompt.push_str("\n\nTo give my best complete final answer to the task use the exact following format:\n\nThought: I now can give a great answer\nFinal Answer: my best complete final answer to the task.");
        }
        prompt
    }

    fn task_prompt(member: &CrewMember, context: &[String]) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expect criteria for your final answer: {}\nyou MUST return the actual complete content as the final answer, not a summary.",
            member.task.body, member.task.expected_output
        );
        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&context.join("\n\n"));
        }
        prompt.push_str("\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!");
        prompt
    }

    async fn delegate(&self, run: &CrewRun, member: &CrewMember, input: &str, sink: &dyn StepSink) -> String {
        let Some(request) = parse_delegation(input) else {
            return "Error: delegation input must name a coworker and a task".to_string();
        };
        let Some(coworker) = run
            .coworkers_of(member.agent.slot)
            .into_iter()
            .find(|c| c.agent.role.eq_ignore_ascii_case(request.coworker.trim()))
        else {
            return format!("Error: no co-worker named '{}'", request.coworker);
        };

        sink.on_step(StepEvent::new(
            member.agent.role.clone(),
            StepKind::Delegation { coworker: coworker.agent.role.clone(), request: request.task.clone() },
        ));

        let mut user = request.task;
        if !request.context.is_empty() {
            user.push_str("\n\nThis is the context you're working with:\n");
            user.push_str(&request.context);
        }
        let messages = [ChatMessage::system(coworker.agent.system_prompt()), ChatMessage::user(user)];
        match self.llm.chat(&coworker.agent.model_id, &messages, coworker.agent.temperature).await {
            Ok(answer) => answer,
            Err(e) => format!("Error: {} could not answer: {}", coworker.agent.role, e),
        }
    }

    async fn run_member(
        &self,
        run: &CrewRun,
        member: &CrewMember,
        context: &[String],
        sink: &dyn StepSink,
    ) -> Result<String, RunError> {
        let role = member.agent.role.clone();
        let tools = self.tools.select(&member.tools);
        let coworkers = run.coworkers_of(member.agent.slot);
        let can_act = !tools.is_empty() || (member.allow_delegation && !coworkers.is_empty());

        let mut messages = vec![
            ChatMessage::system(Self::system_prompt(member, &tools, &coworkers)),
            ChatMessage::user(Self::task_prompt(member, context)),
        ];

        let limit = member.agent.max_iterations.get();
        for iteration in 1..=limit {
            info!("🤖 [CREW] {} iteration {}/{}", role, iteration, limit);
            let reply = self
                .llm
                .chat(&member.agent.model_id, &messages, member.agent.temperature)
                .await
                .map_err(|source| RunError::Completion { role: role.clone(), source })?;

            let observation = match parse_reply(&reply) {
                ParsedReply::Final { thought, answer } => {
                    if !thought.is_empty() {
                        sink.on_step(StepEvent::new(role.clone(), StepKind::Thought { text: thought }));
                    }
                    sink.on_step(StepEvent::new(role.clone(), StepKind::TaskFinished { output: answer.clone() }));
                    return Ok(answer);
                }
                ParsedReply::Unparsed(text) if !can_act && !text.is_empty() => {
                    sink.on_step(StepEvent::new(role.clone(), StepKind::TaskFinished { output: text.clone() }));
                    return Ok(text);
                }
                ParsedReply::Unparsed(_) => {
                    warn!("🤖 [CREW] {} replied without an action or final answer", role);
                    "Invalid Format: I missed the 'Action:' after 'Thought:'. I will do right next, and don't use a tool I have already used.".to_string()
                }
                ParsedReply::Action { thought, tool, input } => {
                    if !thought.is_empty() {
                        sink.on_step(StepEvent::new(role.clone(), StepKind::Thought { text: thought }));
                    }
                    sink.on_step(StepEvent::new(
                        role.clone(),
                        StepKind::Action { tool: tool.clone(), tool_input: input.clone(), log: reply.clone() },
                    ));
                    self.perform(run, member, &tools, &tool, &input, sink).await
                }
            };

            sink.on_step(StepEvent::new(role.clone(), StepKind::Observation { text: observation.clone() }));
            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(format!("Observation: {}", observation)));
        }

        Err(RunError::IterationLimit { role, limit })
    }

    async fn perform(
        &self,
        run: &CrewRun,
        member: &CrewMember,
        tools: &[Arc<dyn Tool>],
        tool_name: &str,
        input: &str,
        sink: &dyn StepSink,
    ) -> String {
        if member.allow_delegation && (tool_name == DELEGATE_TOOL || tool_name == ASK_TOOL) {
            return self.delegate(run, member, input, sink).await;
        }
        match tools.iter().find(|t| t.name().eq_ignore_ascii_case(tool_name)) {
            Some(tool) => match tool.call(input).await {
                Ok(output) => output,
                Err(e) => format!("Error: {}", e),
            },
            None => {
                let available = tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ");
                format!("Error: '{}' is not a valid tool, try one of [{}].", tool_name, available)
            }
        }
    }
}

#[async_trait]
impl CrewEngine for SequentialEngine {
    async fn execute(&self, run: &CrewRun, sink: &dyn StepSink) -> Result<String, RunError> {
        let mut outputs: Vec<String> = Vec::with_capacity(run.members.len());
        for member in &run.members {
            info!("🤖 [CREW] {} starts: {}", member.agent.role, member.task.body.lines().next().unwrap_or_default());
            let output = self.run_member(run, member, &outputs, sink).await?;
            outputs.push(output);
        }
        outputs.pop().ok_or_else(|| RunError::Engine("crew has no members".to_string()))
    }
}
