//! Test helpers for skills-dash integration tests
//!
//! - FakeBackend: in-memory SkillsBackend with failure and latency injection
//! - record(): backend-shaped SkillRecord builder

#![allow(dead_code)]

pub mod fake_backend;

pub use fake_backend::FakeBackend;

use serde_json::json;
use skills_common::SkillRecord;

/// A record as the backend would send it
pub fn record(id: i64, function: &str, band: &str, competency: &str, level: i64) -> SkillRecord {
    serde_json::from_value(json!({
        "id": id,
        "Function": function,
        "Band": band,
        "SBU": "X",
        "Job_Role_Name_without_concat": format!("{} Role", function),
        "Skill_Name": format!("Skill {}", id),
        "Skill_Definition": "Definition",
        "Proficiency_Level": level,
        "Competency_Type": competency,
        "Group": "G1",
        "BU": "Retail",
    }))
    .unwrap()
}
