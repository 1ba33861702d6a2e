use crate::error::{AccountPlanError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

pub const SOURCES_KEY: &str = "sources";
pub const CONFIDENCE_KEY: &str = "confidence_estimate";

/// The six sections of a standard account plan, in presentation order.
pub const ACCOUNT_PLAN_SECTIONS: [&str; 6] = [
    "company_overview",
    "key_findings",
    "pain_points",
    "opportunities",
    "competitors",
    "recommended_strategy",
];

/// Ordered set of section keys every plan must carry.
///
/// The template is the schema authority: synthesis copies exactly these keys out of the model's
/// answer, expansion only considers these keys, and the editor only accepts these keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PlanTemplate {
    keys: Vec<String>,
}

impl PlanTemplate {
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();

        if keys.is_empty() {
            return Err(AccountPlanError::Configuration(
                "Plan template must contain at least one section".to_string(),
            ));
        }

        for (idx, key) in keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(AccountPlanError::Configuration(format!(
                    "Plan template section #{} has an empty name",
                    idx
                )));
            }
            if key == SOURCES_KEY || key == CONFIDENCE_KEY {
                return Err(AccountPlanError::Configuration(format!(
                    "'{}' is a derived field and cannot be a template section",
                    key
                )));
            }
            if keys[..idx].contains(key) {
                return Err(AccountPlanError::Configuration(format!(
                    "Plan template lists section '{}' more than once",
                    key
                )));
            }
        }

        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Comma separated key list, as it is spelled out to the model.
    pub fn key_list(&self) -> String {
        self.keys.join(", ")
    }
}

impl Default for PlanTemplate {
    fn default() -> Self {
        Self {
            keys: ACCOUNT_PLAN_SECTIONS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for PlanTemplate {
    type Error = AccountPlanError;

    fn try_from(keys: Vec<String>) -> Result<Self> {
        Self::new(keys)
    }
}

impl From<PlanTemplate> for Vec<String> {
    fn from(template: PlanTemplate) -> Self {
        template.keys
    }
}

/// Aggregated search text plus the de-duplicated URLs it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub text: String,
    /// Unique by value, in first-seen order.
    pub sources: Vec<String>,
}

impl EvidenceBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.sources.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSection {
    pub key: String,
    pub content: String,
}

/// The finished account plan.
///
/// Serializes as one flat object: every template section in template order, then `sources` and
/// `confidence_estimate`. No other keys are ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct AccountPlan {
    sections: Vec<PlanSection>,
    pub sources: Vec<String>,
    pub confidence_estimate: String,
}

impl AccountPlan {
    /// A plan with every template section present and empty.
    pub fn empty(template: &PlanTemplate) -> Self {
        Self {
            sections: template
                .keys()
                .iter()
                .map(|key| PlanSection {
                    key: key.clone(),
                    content: String::new(),
                })
                .collect(),
            sources: Vec::new(),
            confidence_estimate: String::new(),
        }
    }

    pub fn sections(&self) -> &[PlanSection] {
        &self.sections
    }

    pub fn section(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.content.as_str())
    }

    pub fn section_keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    /// Overwrites an existing section. Returns `false` when the key is not part of the plan.
    pub(crate) fn set_section(&mut self, key: &str, content: impl Into<String>) -> bool {
        match self.sections.iter_mut().find(|s| s.key == key) {
            Some(section) => {
                section.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Replace the text of one section, as a user edit.
    ///
    /// Only existing sections can be edited; `sources` and `confidence_estimate` are derived
    /// from the evidence and are not sections.
    pub fn edit_section(&mut self, key: &str, new_text: impl Into<String>) -> Result<()> {
        if self.set_section(key, new_text) {
            Ok(())
        } else {
            Err(AccountPlanError::UnknownSection(key.to_string()))
        }
    }
}

impl AccountPlan {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for AccountPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 2))?;
        for section in &self.sections {
            map.serialize_entry(&section.key, &section.content)?;
        }
        map.serialize_entry(SOURCES_KEY, &self.sources)?;
        map.serialize_entry(CONFIDENCE_KEY, &self.confidence_estimate)?;
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for AccountPlan {
    type Error = AccountPlanError;

    /// Loads a plan whose sections are whatever keys the map carries, in map order.
    fn try_from(map: Map<String, Value>) -> Result<Self> {
        let mut plan = AccountPlan {
            sections: Vec::new(),
            sources: Vec::new(),
            confidence_estimate: String::new(),
        };

        for (key, value) in map {
            if let Some(content) = plan.absorb_field(&key, value)? {
                plan.sections.push(PlanSection { key, content });
            }
        }

        if plan.sections.is_empty() {
            return Err(AccountPlanError::MalformedPlan(
                "plan has no sections".to_string(),
            ));
        }

        Ok(plan)
    }
}

impl AccountPlan {
    /// Loads a plan against a known template.
    ///
    /// Template keys missing from `value` come back empty; keys outside the template are
    /// rejected.
    pub fn from_value_with_template(value: Value, template: &PlanTemplate) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(AccountPlanError::MalformedPlan(format!(
                    "plan must be a JSON object, got {}",
                    other
                )))
            }
        };

        let mut plan = AccountPlan::empty(template);
        for (key, value) in map {
            let Some(content) = plan.absorb_field(&key, value)? else {
                continue;
            };
            if !template.contains(&key) {
                return Err(AccountPlanError::MalformedPlan(format!(
                    "section '{}' is not part of the template ({})",
                    key,
                    template.key_list()
                )));
            }
            plan.set_section(&key, content);
        }

        Ok(plan)
    }

    /// Stores `sources`/`confidence_estimate` and returns `None` for them; any other key is
    /// returned as section text.
    fn absorb_field(&mut self, key: &str, value: Value) -> Result<Option<String>> {
        if key == SOURCES_KEY {
            self.sources = parse_sources(value)?;
            return Ok(None);
        }

        let text = match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => {
                return Err(AccountPlanError::MalformedPlan(format!(
                    "'{}' must be a string, got {}",
                    key, other
                )))
            }
        };

        if key == CONFIDENCE_KEY {
            self.confidence_estimate = text;
            return Ok(None);
        }
        Ok(Some(text))
    }
}

fn parse_sources(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(url) => Ok(url),
                other => Err(AccountPlanError::MalformedPlan(format!(
                    "source entries must be strings, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(AccountPlanError::MalformedPlan(format!(
            "'{}' must be a list, got {}",
            SOURCES_KEY, other
        ))),
    }
}

impl fmt::Display for AccountPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== ACCOUNT PLAN =====")?;
        for section in &self.sections {
            writeln!(f, "\n### {} ###", section.key.to_uppercase())?;
            writeln!(f, "{}", section.content)?;
        }

        writeln!(f, "\n### {} ###", SOURCES_KEY.to_uppercase())?;
        for (i, source) in self.sources.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, source)?;
        }

        writeln!(f, "\n### {} ###", CONFIDENCE_KEY.to_uppercase())?;
        writeln!(f, "{}", self.confidence_estimate)?;
        write!(f, "\n========================")
    }
}
