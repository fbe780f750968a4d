//! Owns every live agent of the current invocation.

use std::collections::BTreeMap;

use cg_core::{AgentId, ObserverRef, SimTime};
use cg_graph::{Agent, ComponentFactory};
use cg_profile::AgentBuildInformation;
use tracing::{debug, info};

use crate::ExecResult;

struct SpawnedAgent {
    agent: Agent,
    build: AgentBuildInformation,
}

/// Builds agents through a [`ComponentFactory`] (normally a
/// `cg_plugin::ModelBinding`) and destroys them again between invocations.
///
/// Agent ids are handed out sequentially from 0 and restart after
/// [`clear`](Self::clear).  A failed build does not consume an id.
pub struct AgentFactory {
    components: Box<dyn ComponentFactory>,
    agents:     BTreeMap<AgentId, SpawnedAgent>,
    next_id:    u32,
}

impl AgentFactory {
    pub fn new(components: Box<dyn ComponentFactory>) -> Self {
        Self { components, agents: BTreeMap::new(), next_id: 0 }
    }

    /// Instantiate one agent from its build information.
    pub fn add_agent(
        &mut self,
        build:      &AgentBuildInformation,
        spawn_time: SimTime,
        observers:  &[ObserverRef],
    ) -> ExecResult<AgentId> {
        let id = AgentId(self.next_id);
        let agent = Agent::instantiate(id, spawn_time, &build.agent_type, &mut *self.components, observers)?;
        self.next_id += 1;
        debug!(
            agent = %id,
            agent_profile = %build.agent_profile,
            vehicle_model = %build.vehicle_model,
            %spawn_time,
            "agent spawned",
        );
        self.agents.insert(id, SpawnedAgent { agent, build: build.clone() });
        Ok(id)
    }

    /// Destroy every agent, releasing all component implementations.
    pub fn clear(&mut self) {
        if self.agents.is_empty() {
            return;
        }
        let count = self.agents.len();
        for (_, spawned) in std::mem::take(&mut self.agents) {
            spawned.agent.destroy(&mut *self.components);
        }
        self.next_id = 0;
        info!(agents = count, "agents destroyed");
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id).map(|s| &s.agent)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id).map(|s| &mut s.agent)
    }

    /// Agents in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().map(|s| &s.agent)
    }

    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut().map(|s| &mut s.agent)
    }

    /// What the agent was built from (profile, vehicle model, sensors).
    pub fn build_information(&self, id: AgentId) -> Option<&AgentBuildInformation> {
        self.agents.get(&id).map(|s| &s.build)
    }
}

impl Drop for AgentFactory {
    fn drop(&mut self) {
        self.clear();
    }
}
