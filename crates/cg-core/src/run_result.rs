//! Outcome of one invocation, shared between the scheduler and observers.

use crate::{AgentId, SimTime};

/// Why (or whether) an invocation has ended.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunStatus {
    #[default]
    Running,
    /// A scenario end condition fired.
    EndCondition,
    /// At least one collision was registered.
    Collision,
}

/// Mutable result record of a single invocation.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunResult {
    status:        RunStatus,
    collision_ids: Vec<AgentId>,
    end_time:      Option<SimTime>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Mark the invocation as ended by a scenario end condition.
    pub fn set_end_condition(&mut self, at: SimTime) {
        self.status = RunStatus::EndCondition;
        self.end_time = Some(at);
    }

    pub fn is_end_condition(&self) -> bool {
        self.status == RunStatus::EndCondition
    }

    /// Register `agent` as collided.  Each agent is recorded once.
    pub fn add_collision(&mut self, agent: AgentId) {
        if !self.collision_ids.contains(&agent) {
            self.collision_ids.push(agent);
        }
        self.status = RunStatus::Collision;
    }

    pub fn is_collision(&self) -> bool {
        self.status == RunStatus::Collision
    }

    pub fn collision_ids(&self) -> &[AgentId] {
        &self.collision_ids
    }

    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    /// Record the time the scheduler stopped at, if no end condition did.
    pub fn finish(&mut self, at: SimTime) {
        self.end_time.get_or_insert(at);
    }
}
