use crate::transforms::{Edit, TransformError, TransformKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub transform: TransformKind,
}

/// An edit attributed to the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub rule_id: String,
    pub rule_name: String,
    #[serde(flatten)]
    pub edit: Edit,
}

#[derive(Debug, Clone)]
pub struct Patched {
    pub output: String,
    pub fixes: Vec<Fix>,
}

#[derive(thiserror::Error, Debug)]
#[error("rule `{rule_id}` failed: {source}")]
pub struct RuleError {
    pub rule_id: String,
    #[source]
    pub source: TransformError,
}

fn enabled_by_default() -> bool {
    true
}

impl Rule {
    pub fn validate(&self) -> Result<(), RuleError> {
        self.transform.validate().map_err(|source| RuleError {
            rule_id: self.id.clone(),
            source,
        })
    }
}

/// Runs every enabled rule in order, each one on the previous rule's output.
pub fn apply_rules(rules: &[Rule], input: &str) -> Result<Patched, RuleError> {
    let mut text = input.to_string();
    let mut fixes = Vec::new();

    for rule in rules.iter().filter(|rule| rule.enabled) {
        tracing::debug!(rule = %rule.id, transform = rule.transform.label(), "applying rule");
        let applied = rule.transform.apply(&text).map_err(|source| RuleError {
            rule_id: rule.id.clone(),
            source,
        })?;
        tracing::debug!(rule = %rule.id, edits = applied.edits.len(), "rule applied");
        fixes.extend(applied.edits.into_iter().map(|edit| Fix {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            edit,
        }));
        text = applied.output;
    }

    Ok(Patched {
        output: text,
        fixes,
    })
}
