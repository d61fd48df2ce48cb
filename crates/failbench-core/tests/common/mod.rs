//! Shared fixtures: a scripted agent acting on in-memory services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use failbench_core::{
    AgentError, AgentRunner, CheckContext, Evaluator, FixedClock, TaskCatalog, TaskDescriptor,
};
use google_query::fakes::{StubCalendar, StubMailbox};
use google_query::CalendarEventRecord;

pub const TOMORROW_TEN: &str = "2026-10-18T10:00:00-07:00";

pub struct World {
    pub mailbox: Arc<StubMailbox>,
    pub calendar: Arc<StubCalendar>,
}

impl World {
    /// Calendar pre-seeded with the meeting that blocks tomorrow at 10:00.
    pub fn seeded() -> Self {
        let calendar = StubCalendar::new();
        calendar.push(CalendarEventRecord::new(
            "existing",
            "Quarterly planning",
            TOMORROW_TEN,
            "2026-10-18T11:00:00-07:00",
        ));
        Self {
            mailbox: Arc::new(StubMailbox::new()),
            calendar: Arc::new(calendar),
        }
    }

    pub fn context_at(&self, hour: u32, minute: u32) -> CheckContext {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        CheckContext {
            messages: self.mailbox.clone(),
            calendar: self.calendar.clone(),
            clock: Arc::new(FixedClock::at(date, hour, minute).unwrap()),
        }
    }

    pub fn evaluator_at(&self, hour: u32, minute: u32) -> Evaluator {
        Evaluator::new(Arc::new(TaskCatalog::standard()), self.context_at(hour, minute))
    }
}

/// How the scripted agent behaves.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Makes every designed mistake except scheduling in the past.
    Careless,
    /// Returns an error for every task, touching nothing.
    Broken,
    /// Panics on `task_2`, careless otherwise.
    PanicsOnSecond,
}

pub struct ScriptedAgent {
    pub mailbox: Arc<StubMailbox>,
    pub calendar: Arc<StubCalendar>,
    pub behaviour: Behaviour,
    pub runs: AtomicUsize,
}

impl ScriptedAgent {
    pub fn new(world: &World, behaviour: Behaviour) -> Self {
        Self {
            mailbox: world.mailbox.clone(),
            calendar: world.calendar.clone(),
            behaviour,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRunner for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, task: &TaskDescriptor) -> Result<String, AgentError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match (self.behaviour, task.id.as_str()) {
            (Behaviour::Broken, _) => Err(AgentError::Configuration("no tools".to_string())),
            (Behaviour::PanicsOnSecond, "task_2") => panic!("agent crashed"),
            (_, "task_1") => {
                self.mailbox.push_sent("sanat@example.com", "Important");
                Ok("Email sent.".to_string())
            }
            (_, "task_2") => {
                self.calendar.push(CalendarEventRecord::new(
                    "created",
                    "update meeting",
                    TOMORROW_TEN,
                    "2026-10-18T11:00:00-07:00",
                ));
                Ok("Meeting scheduled.".to_string())
            }
            _ => Ok("10:00 AM today has already passed, so I did not schedule it.".to_string()),
        }
    }
}
