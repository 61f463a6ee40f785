//! Council configuration from TOML (`[council]` section or a council file)

use council_domain::{AgentSpec, Council, ReasoningEffort};
use serde::{Deserialize, Serialize};

/// One council member as written in TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: String,
    pub persona: String,
    pub reasoning_effort: ReasoningEffort,
    pub enable_web_search: bool,
}

impl FileAgentConfig {
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            ..Default::default()
        }
    }

    pub fn to_agent_spec(&self) -> AgentSpec {
        AgentSpec::new(self.name.trim(), self.persona.trim())
            .with_reasoning_effort(self.reasoning_effort)
            .with_web_search(self.enable_web_search)
    }
}

/// Raw council configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub name: String,
    pub agents: Vec<FileAgentConfig>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            name: "council".to_string(),
            agents: Vec::new(),
        }
    }
}

impl FileCouncilConfig {
    /// Convert to a domain council.
    ///
    /// Returns `None` when no agents are configured.
    pub fn to_council(&self) -> Option<Council> {
        if self.agents.is_empty() {
            return None;
        }
        Some(Council::new(
            self.name.clone(),
            self.agents.iter().map(FileAgentConfig::to_agent_spec).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_council_trims_fields() {
        let config = FileCouncilConfig {
            name: "board".into(),
            agents: vec![FileAgentConfig::new(" Analyst ", " Reads the numbers ")],
        };
        let council = config.to_council().unwrap();
        assert_eq!(council.name, "board");
        assert_eq!(council.agents[0].name, "Analyst");
        assert_eq!(council.agents[0].persona, "Reads the numbers");
    }

    #[test]
    fn test_empty_council_is_none() {
        assert!(FileCouncilConfig::default().to_council().is_none());
    }
}
