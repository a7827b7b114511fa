//! Task template store: the three default task bodies, stamped with today's date.

use chrono::NaiveDate;
use serde::Serialize;

use crate::agents::AgentSlot;
use crate::constants::tasks::{DATE_FORMAT, EXPECTED_OUTPUT};

/// A work item owned by exactly one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskDescription {
    pub owner: AgentSlot,
    pub body: String,
    pub expected_output: String,
}

impl TaskDescription {
    pub fn new(owner: AgentSlot, body: impl Into<String>) -> Self {
        Self {
            owner,
            body: body.into(),
            expected_output: EXPECTED_OUTPUT.to_string(),
        }
    }
}

/// Render the default body for a slot with the given date.
pub fn render_default(slot: AgentSlot, date: NaiveDate) -> String {
    slot.persona()
        .task_template()
        .replace("{date}", &date.format(DATE_FORMAT).to_string())
}

/// The session's current task bodies, one per slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskStore {
    date: NaiveDate,
    tasks: Vec<TaskDescription>,
}

impl TaskStore {
    /// Render the defaults once for `date`.
    pub fn with_date(date: NaiveDate) -> Self {
        let tasks = AgentSlot::ALL
            .iter()
            .map(|&slot| TaskDescription::new(slot, render_default(slot, date)))
            .collect();
        Self { date, tasks }
    }

    pub fn today() -> Self {
        Self::with_date(chrono::Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tasks(&self) -> &[TaskDescription] {
        &self.tasks
    }

    pub fn get(&self, slot: AgentSlot) -> &TaskDescription {
        &self.tasks[Self::position(slot)]
    }

    /// Replace a body (user edit or rewrite result).
    pub fn set_body(&mut self, slot: AgentSlot, body: impl Into<String>) {
        self.tasks[Self::position(slot)].body = body.into();
    }

    /// The default body for a slot as rendered for this store's date.
    pub fn default_body(&self, slot: AgentSlot) -> String {
        render_default(slot, self.date)
    }

    pub fn is_default(&self, slot: AgentSlot) -> bool {
        self.get(slot).body == self.default_body(slot)
    }

    fn position(slot: AgentSlot) -> usize {
        AgentSlot::ALL.iter().position(|&s| s == slot).unwrap_or_default()
    }
}
