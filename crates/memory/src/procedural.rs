//! Procedural memory: workflows, procedures, skills, and shortcuts.
//! Every list is upserted by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    /// Success rate in [0, 1]
    pub success_rate: f64,
    pub usage_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    pub success_rate: f64,
    pub usage_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    /// Proficiency in [0, 1]
    pub proficiency: f64,
    pub usage_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: String,
    pub trigger: String,
    pub expansion: String,
    pub usage_count: u32,
}

/// Records with a stable id, so one upsert serves all four lists.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Procedure {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Workflow {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Skill {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Shortcut {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Replace the record with the same id, or append. Returns `true` on replace.
fn upsert<T: Keyed>(list: &mut Vec<T>, record: T) -> bool {
    match list.iter_mut().find(|r| r.key() == record.key()) {
        Some(slot) => {
            *slot = record;
            true
        }
        None => {
            list.push(record);
            false
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProceduralMemory {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub shortcuts: Vec<Shortcut>,
}

impl ProceduralMemory {
    pub fn upsert_workflow(&mut self, workflow: Workflow) -> bool {
        upsert(&mut self.workflows, workflow)
    }

    pub fn upsert_procedure(&mut self, procedure: Procedure) -> bool {
        upsert(&mut self.procedures, procedure)
    }

    pub fn upsert_skill(&mut self, skill: Skill) -> bool {
        upsert(&mut self.skills, skill)
    }

    pub fn upsert_shortcut(&mut self, shortcut: Shortcut) -> bool {
        upsert(&mut self.shortcuts, shortcut)
    }

    pub fn procedure(&self, id: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.id == id)
    }

    /// Bump usage on a procedure or workflow. Returns `false` for unknown ids.
    pub fn touch(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        if let Some(p) = self.procedures.iter_mut().find(|p| p.id == id) {
            p.usage_count = p.usage_count.saturating_add(1);
            p.updated_at = now;
            return true;
        }
        if let Some(w) = self.workflows.iter_mut().find(|w| w.id == id) {
            w.usage_count = w.usage_count.saturating_add(1);
            w.updated_at = now;
            return true;
        }
        false
    }

    /// Expand a shortcut trigger, counting the use.
    pub fn expand_shortcut(&mut self, trigger: &str) -> Option<String> {
        let shortcut = self.shortcuts.iter_mut().find(|s| s.trigger == trigger)?;
        shortcut.usage_count = shortcut.usage_count.saturating_add(1);
        Some(shortcut.expansion.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedure(id: &str, name: &str) -> Procedure {
        Procedure {
            id: id.into(),
            name: name.into(),
            steps: vec!["scaffold folder".into(), "write index.ts".into()],
            success_rate: 0.8,
            usage_count: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut pm = ProceduralMemory::default();
        assert!(!pm.upsert_procedure(procedure("p1", "first")));
        assert!(pm.upsert_procedure(procedure("p1", "second")));
        assert_eq!(pm.procedures.len(), 1);
        assert_eq!(pm.procedure("p1").unwrap().name, "second");
    }

    #[test]
    fn skills_and_workflows_upsert_independently() {
        let mut pm = ProceduralMemory::default();
        pm.upsert_skill(Skill {
            id: "s1".into(),
            name: "tailwind".into(),
            proficiency: 0.4,
            usage_count: 0,
        });
        pm.upsert_workflow(Workflow {
            id: "s1".into(),
            name: "release".into(),
            description: String::new(),
            steps: vec![],
            success_rate: 1.0,
            usage_count: 0,
            updated_at: Utc::now(),
        });
        assert_eq!(pm.skills.len(), 1);
        assert_eq!(pm.workflows.len(), 1);
    }

    #[test]
    fn shortcut_expansion_counts_uses() {
        let mut pm = ProceduralMemory::default();
        pm.upsert_shortcut(Shortcut {
            id: "sc1".into(),
            trigger: "/comp".into(),
            expansion: "create_component".into(),
            usage_count: 0,
        });
        assert_eq!(pm.expand_shortcut("/comp").as_deref(), Some("create_component"));
        assert_eq!(pm.shortcuts[0].usage_count, 1);
        assert!(pm.expand_shortcut("/nope").is_none());
    }

    #[test]
    fn touch_finds_procedures_and_workflows() {
        let mut pm = ProceduralMemory::default();
        pm.upsert_procedure(procedure("p1", "scaffold"));
        assert!(pm.touch("p1", Utc::now()));
        assert_eq!(pm.procedures[0].usage_count, 2);
        assert!(!pm.touch("w9", Utc::now()));
    }
}
