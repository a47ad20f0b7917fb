use super::clinical::{EchoSkill, EvaluateRiskSkill, TriagePatientSkill};
use super::patient::{
    GetDecisionHistorySkill, GetPatientContextSkill, LogDecisionSkill, NormalizePatientSkill,
    SendNotificationSkill, StorePatientContextSkill,
};
use super::Skill;
use crate::agent::TriageAgent;
use crate::error::TriageError;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use triage_rs_protocol::{SkillError, SkillSpec};

/// Registry of skills and reasoners keyed by name.
#[derive(Default, Clone)]
pub struct SkillRegistry {
    /// Map of skill name to implementation, listed in name order.
    skills: Arc<RwLock<BTreeMap<String, Arc<dyn Skill>>>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill by name, replacing any previous entry.
    pub fn register(&self, skill: Arc<dyn Skill>) {
        debug!("registering skill (name={})", skill.name());
        self.skills.write().insert(skill.name().to_string(), skill);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.read().get(name).cloned()
    }

    /// Registered names in lexicographic order.
    pub fn list(&self) -> Vec<String> {
        self.skills.read().keys().cloned().collect()
    }

    pub fn specs(&self) -> Vec<SkillSpec> {
        self.skills.read().values().map(|skill| skill.spec()).collect()
    }

    /// Look up `name` and run it with `input`.
    pub async fn execute(
        &self,
        agent: &TriageAgent,
        name: &str,
        input: Value,
    ) -> Result<Value, TriageError> {
        let skill = self
            .get(name)
            .ok_or_else(|| SkillError::SkillNotFound(name.to_string()))?;
        info!("executing skill (node_id={}, name={})", agent.node_id(), name);
        skill.call(agent, input).await.inspect_err(|err| {
            warn!("skill failed (name={name}, error={err})");
        })
    }
}

/// Strip the `<node_id>.` prefix from an execution target.
///
/// Returns `None` when the target addresses another node or names no skill.
pub fn resolve_target<'a>(node_id: &str, target: &'a str) -> Option<&'a str> {
    let (node, skill) = target.split_once('.')?;
    if node != node_id || skill.is_empty() {
        return None;
    }
    Some(skill)
}

/// Register every built-in skill and reasoner.
pub fn register_builtin_skills(registry: &SkillRegistry) {
    registry.register(Arc::new(NormalizePatientSkill));
    registry.register(Arc::new(StorePatientContextSkill));
    registry.register(Arc::new(GetPatientContextSkill));
    registry.register(Arc::new(SendNotificationSkill));
    registry.register(Arc::new(LogDecisionSkill));
    registry.register(Arc::new(GetDecisionHistorySkill));
    registry.register(Arc::new(EchoSkill));
    registry.register(Arc::new(EvaluateRiskSkill));
    registry.register(Arc::new(TriagePatientSkill));
}

/// A registry holding the built-in skills and reasoners.
pub fn builtin_skill_registry() -> SkillRegistry {
    let registry = SkillRegistry::new();
    register_builtin_skills(&registry);
    registry
}
