//! Council entities

use super::reasoning::ReasoningEffort;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Definition of one council member.
///
/// Owned by the caller; the engine only reads it. Once an Execute phase has
/// locked in a council the agent definitions are cloned into the execution set, so later
/// edits cannot change what a proposal was produced by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name, unique within the council
    pub name: String,
    /// Persona text injected into the agent's instructions
    pub persona: String,
    #[serde(default)]
    pub reasoning_effort: ReasoningEffort,
    #[serde(default)]
    pub enable_web_search: bool,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            reasoning_effort: ReasoningEffort::default(),
            enable_web_search: false,
        }
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.enable_web_search = enabled;
        self
    }

    /// Validate a single agent definition
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidAgent("agent name cannot be empty".into()));
        }
        if self.persona.trim().is_empty() {
            return Err(DomainError::InvalidAgent(format!(
                "agent '{}' has an empty persona",
                self.name
            )));
        }
        Ok(())
    }
}

/// The ordered list of agents configured for a session (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Council {
    #[serde(default = "Council::default_name")]
    pub name: String,
    pub agents: Vec<AgentSpec>,
}

impl Council {
    pub fn new(name: impl Into<String>, agents: Vec<AgentSpec>) -> Self {
        Self {
            name: name.into(),
            agents,
        }
    }

    fn default_name() -> String {
        "Unnamed Council".to_string()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Validate the council: non-empty, every agent valid, names unique.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.agents.is_empty() {
            return Err(DomainError::NoAgents);
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            agent.validate()?;
            if !seen.insert(agent.name.as_str()) {
                return Err(DomainError::DuplicateAgent(agent.name.clone()));
            }
        }
        Ok(())
    }
}
