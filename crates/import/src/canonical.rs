use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// One find/replace rule from the canonicalization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NameRule {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<NameRule>,
}

/// Canonicalizes known counterparty-name variants via ordered find/replace
/// rules. The rule set is an external configuration collaborator.
#[derive(Debug, Default)]
pub struct CanonicalNameMap {
    rules: Vec<(Regex, String)>,
}

impl CanonicalNameMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<NameRule>) -> Result<Self, CanonicalError> {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replacement))
                    .map_err(|source| CanonicalError::Pattern { pattern: rule.pattern.clone(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules: compiled })
    }

    pub fn from_toml(content: &str) -> Result<Self, CanonicalError> {
        let file: RuleFile = toml::from_str(content)?;
        Self::from_rules(file.rules)
    }

    /// Applies every rule in order and trims the result.
    pub fn apply(&self, name: &str) -> String {
        let mut out = name.to_string();
        for (re, replacement) in &self.rules {
            out = re.replace_all(&out, replacement.as_str()).into_owned();
        }
        out.trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
