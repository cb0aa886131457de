//! Skill record model
//!
//! One [`SkillRecord`] is one row of the roster/skills table served by the
//! backend. Field names on the wire are the backend's column names
//! (`Function`, `Band`, `SBU`, `Job_Role_Name_without_concat`, ...).
//!
//! # Ingestion
//!
//! Two pieces of derived state are fixed when a record is deserialized and
//! never recomputed afterwards:
//! - records without an `id` receive a synthetic [`RecordId`], so the id of a
//!   record is stable for as long as the record set is held
//! - the free-text `Competency_Type` is classified into [`CompetencyClass`]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix used when rendering synthetic ids as text
const SYNTHETIC_PREFIX: &str = "local-";

/// Competency type labels that mark a leadership skill
pub const LEADERSHIP_COMPETENCY_TYPES: [&str; 2] = ["Behavioral", "Raymond Leadership Competency"];

// ========================================
// Record Identity
// ========================================

/// Opaque record identifier
///
/// The backend uses integers; strings are accepted as-is. `Synthetic` ids are
/// assigned locally to records that arrived without one and have no
/// server-side identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
    Synthetic(Uuid),
}

impl RecordId {
    /// Generate a fresh synthetic id
    pub fn synthetic() -> Self {
        RecordId::Synthetic(Uuid::new_v4())
    }

    /// True if this id was generated locally at ingestion
    pub fn is_synthetic(&self) -> bool {
        matches!(self, RecordId::Synthetic(_))
    }

    /// Interpret a textual id received on the wire
    ///
    /// Unlike [`FromStr`], numeric strings stay textual here so that a string
    /// id round-trips to the backend unchanged.
    fn from_wire_text(text: String) -> Self {
        text.strip_prefix(SYNTHETIC_PREFIX)
            .and_then(|rest| Uuid::parse_str(rest).ok())
            .map(RecordId::Synthetic)
            .unwrap_or(RecordId::Text(text))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
            RecordId::Synthetic(uuid) => write!(f, "{}{}", SYNTHETIC_PREFIX, uuid.simple()),
        }
    }
}

/// Parse an id from a URL path segment
///
/// Integers win; `local-<uuid>` is a synthetic id; anything else is text.
impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i64>() {
            return Ok(RecordId::Int(n));
        }
        Ok(RecordId::from_wire_text(s.to_string()))
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::from_wire_text(s.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordId::Int(n) => serializer.serialize_i64(*n),
            other => serializer.collect_str(other),
        }
    }
}

/// Interpret an id value received on the wire
///
/// Integers (including whole floats from spreadsheet exports) and strings are
/// ids; anything else is treated as no id.
fn id_from_wire(value: Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(RecordId::Int),
        Value::String(s) => Some(RecordId::from_wire_text(s)),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        id_from_wire(value.clone())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {}", value)))
    }
}

/// Missing, `null` and unusable ids all become synthetic
fn de_record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordId, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(id_from_wire)
        .unwrap_or_else(RecordId::synthetic))
}

// ========================================
// Competency Classification
// ========================================

/// Two-way classification of a skill's competency type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyClass {
    Leadership,
    #[default]
    Functional,
}

/// Classify a raw `Competency_Type` label
///
/// ```
/// use skills_common::model::{classify, CompetencyClass};
///
/// assert_eq!(classify(Some("Behavioral")), CompetencyClass::Leadership);
/// assert_eq!(classify(Some("Technical")), CompetencyClass::Functional);
/// assert_eq!(classify(None), CompetencyClass::Functional);
/// ```
pub fn classify(label: Option<&str>) -> CompetencyClass {
    match label {
        Some(l) if LEADERSHIP_COMPETENCY_TYPES.contains(&l) => CompetencyClass::Leadership,
        _ => CompetencyClass::Functional,
    }
}

/// Raw competency label together with its classification
///
/// A non-text wire value classifies as functional and is written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompetencyType {
    label: Option<String>,
    class: CompetencyClass,
    raw: Option<Value>,
}

impl CompetencyType {
    pub fn new(label: impl Into<String>) -> Self {
        Self::from(Some(label.into()))
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn class(&self) -> CompetencyClass {
        self.class
    }

    pub fn is_absent(&self) -> bool {
        self.label.is_none() && self.raw.is_none()
    }
}

impl From<Option<String>> for CompetencyType {
    fn from(label: Option<String>) -> Self {
        let class = classify(label.as_deref());
        Self {
            label,
            class,
            raw: None,
        }
    }
}

impl Serialize for CompetencyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.label, &self.raw) {
            (Some(label), _) => serializer.serialize_str(label),
            (None, Some(raw)) => raw.serialize(serializer),
            (None, None) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CompetencyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Self::default(),
            Some(Value::String(label)) => Self::from(Some(label)),
            Some(other) => Self {
                raw: Some(other),
                ..Self::default()
            },
        })
    }
}

// ========================================
// Proficiency
// ========================================

/// Proficiency level as parsed from the wire
///
/// The backend sends a number or a numeric string. Anything that is not a
/// plain integer is kept verbatim so that writing the record back does not
/// alter or drop the column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Proficiency {
    level: Option<i64>,
    raw: Option<Value>,
}

impl Proficiency {
    pub fn new(level: Option<i64>) -> Self {
        Self { level, raw: None }
    }

    /// Nominally 1-5; out-of-range values are kept, not rejected
    pub fn level(&self) -> Option<i64> {
        self.level
    }

    /// Wire value that was not a plain integer, if any
    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    pub fn is_absent(&self) -> bool {
        self.level.is_none() && self.raw.is_none()
    }
}

impl Serialize for Proficiency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.raw, self.level) {
            (Some(raw), _) => raw.serialize(serializer),
            (None, Some(level)) => serializer.serialize_i64(level),
            (None, None) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Proficiency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(value) => value,
        };
        if let Some(level) = value.as_i64() {
            return Ok(Self::new(Some(level)));
        }
        let level = match &value {
            Value::Number(n) => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Ok(Self {
            level,
            raw: Some(value),
        })
    }
}

// ========================================
// Skill Record
// ========================================

/// One row of the roster/skills table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    #[serde(default = "RecordId::synthetic", deserialize_with = "de_record_id")]
    pub id: RecordId,

    #[serde(rename = "Function", default, deserialize_with = "de_lenient_string")]
    pub function: String,

    #[serde(rename = "Band", default, deserialize_with = "de_lenient_string")]
    pub band: String,

    #[serde(rename = "SBU", default, deserialize_with = "de_lenient_string")]
    pub sbu: String,

    #[serde(
        rename = "Job_Role_Name_without_concat",
        default,
        deserialize_with = "de_lenient_string"
    )]
    pub role: String,

    #[serde(rename = "Skill_Name", default, deserialize_with = "de_lenient_string")]
    pub skill_name: String,

    #[serde(rename = "Skill_Definition", default, deserialize_with = "de_lenient_string")]
    pub skill_definition: String,

    #[serde(
        rename = "Proficiency_Level",
        default,
        skip_serializing_if = "Proficiency::is_absent"
    )]
    pub proficiency: Proficiency,

    #[serde(
        rename = "Competency_Type",
        default,
        skip_serializing_if = "CompetencyType::is_absent"
    )]
    pub competency_type: CompetencyType,

    #[serde(rename = "Group", default, deserialize_with = "de_lenient_string")]
    pub group: String,

    /// Backend columns this crate does not interpret (BU, L1_UJR, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SkillRecord {
    /// Record with the given backend id and every other field empty
    pub fn blank(id: i64) -> Self {
        Self {
            id: RecordId::Int(id),
            function: String::new(),
            band: String::new(),
            sbu: String::new(),
            role: String::new(),
            skill_name: String::new(),
            skill_definition: String::new(),
            proficiency: Proficiency::default(),
            competency_type: CompetencyType::default(),
            group: String::new(),
            extra: Map::new(),
        }
    }

    pub fn proficiency_level(&self) -> Option<i64> {
        self.proficiency.level()
    }

    pub fn set_proficiency_level(&mut self, level: Option<i64>) {
        self.proficiency = Proficiency::new(level);
    }

    pub fn competency_class(&self) -> CompetencyClass {
        self.competency_type.class()
    }

    pub fn is_leadership(&self) -> bool {
        self.competency_class() == CompetencyClass::Leadership
    }

    /// Return a copy with `patch` merged over this record's wire form
    ///
    /// Keys use wire names. `id` in the patch is ignored so a patch can never
    /// re-key a record.
    pub fn patched(&self, patch: &Map<String, Value>) -> Result<SkillRecord, serde_json::Error> {
        let mut wire = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            wire.insert(key.clone(), value.clone());
        }
        let mut record: SkillRecord = serde_json::from_value(Value::Object(wire))?;
        record.id = self.id.clone();
        Ok(record)
    }
}

// ========================================
// Lenient Field Decoding
// ========================================

/// Strings may arrive as numbers or `null` from spreadsheet-sourced data
fn de_lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}
