//! Rule specifications (atoms)
//!
//! Declarative source/sink/sanitizer specifications as handed over by a
//! loader. Serde shapes follow the YAML atom catalogs:
//!
//! ```yaml
//! id: sink.sql.sqlite3
//! kind: sink
//! tags: [injection, sql]
//! severity: critical
//! cwe: [CWE-89]
//! match:
//!   - base_type: "*.Cursor"
//!     call: execute
//!     args:
//!       - { position: 0, check: not_const }
//! ```

use serde::{Deserialize, Serialize};

/// Atom kind; also the effect a matched rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomKind {
    Source,
    Sink,
    Sanitizer,
}

impl AtomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomKind::Source => "source",
            AtomKind::Sink => "sink",
            AtomKind::Sanitizer => "sanitizer",
        }
    }
}

impl std::fmt::Display for AtomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Declared matching strategy; anything but `Auto` forces Tier 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    #[default]
    Auto,
    Fuzzy,
    Trigram,
    Fallback,
}

/// Check applied to one argument of a call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum ArgCheck {
    /// Argument exists at the position
    Present,
    /// Argument is known not to be a compile-time constant
    /// (unknown constness passes as guarded evidence)
    NotConst,
    /// Argument is a compile-time constant
    Const,
    /// Argument descriptor matches a wildcard pattern
    Matches { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgConstraint {
    pub position: usize,
    #[serde(flatten)]
    pub check: ArgCheck,
}

impl ArgConstraint {
    pub fn new(position: usize, check: ArgCheck) -> Self {
        Self { position, check }
    }

    pub fn not_const(position: usize) -> Self {
        Self::new(position, ArgCheck::NotConst)
    }
}

/// One match alternative of an atom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchRule {
    /// Receiver type pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,

    /// Call name pattern (simple or qualified)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,

    /// Property-read name pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgConstraint>,

    pub strategy: MatchStrategy,
}

impl MatchRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base_type` + `call` rule
    pub fn call(base_type: Option<&str>, call: &str) -> Self {
        Self {
            base_type: base_type.map(str::to_string),
            call: Some(call.to_string()),
            ..Self::default()
        }
    }

    /// `base_type` + `read` rule
    pub fn read(base_type: Option<&str>, read: &str) -> Self {
        Self {
            base_type: base_type.map(str::to_string),
            read: Some(read.to_string()),
            ..Self::default()
        }
    }

    pub fn with_arg(mut self, constraint: ArgConstraint) -> Self {
        self.args.push(constraint);
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Declarative atom specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomSpec {
    pub id: String,
    pub kind: AtomKind,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(rename = "match", default)]
    pub match_rules: Vec<MatchRule>,

    #[serde(default)]
    pub cwe: Vec<String>,

    #[serde(default)]
    pub owasp: Vec<String>,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Effect category (e.g. `sql_injection`); defaults to the first tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Verbose per-candidate tracing for this atom's rules
    #[serde(default)]
    pub debug: bool,
}

impl AtomSpec {
    pub fn new(id: impl Into<String>, kind: AtomKind) -> Self {
        Self {
            id: id.into(),
            kind,
            tags: Vec::new(),
            match_rules: Vec::new(),
            cwe: Vec::new(),
            owasp: Vec::new(),
            severity: Severity::default(),
            description: None,
            category: None,
            debug: false,
        }
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.match_rules.push(rule);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_cwe(mut self, cwe: impl Into<String>) -> Self {
        self.cwe.push(cwe.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Effect category: explicit, else first tag
    pub fn effective_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .or_else(|| self.tags.first().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_yaml_shape() {
        let yaml = r#"
id: sink.sql.sqlite3
kind: sink
tags: [sql_injection]
severity: critical
cwe: [CWE-89]
match:
  - base_type: "*.Cursor"
    call: execute
    args:
      - { position: 0, check: not_const }
      - { position: 1, check: matches, pattern: "*params*" }
  - call: executescript
    strategy: fallback
"#;
        let atom: AtomSpec = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(atom.kind, AtomKind::Sink);
        assert_eq!(atom.severity, Severity::Critical);
        assert_eq!(atom.match_rules.len(), 2);
        assert_eq!(atom.match_rules[0].args[0], ArgConstraint::not_const(0));
        assert_eq!(
            atom.match_rules[0].args[1].check,
            ArgCheck::Matches {
                pattern: "*params*".to_string()
            }
        );
        assert_eq!(atom.match_rules[1].strategy, MatchStrategy::Fallback);
        assert_eq!(atom.effective_category(), Some("sql_injection"));
    }

    #[test]
    fn test_match_rule_rejects_unknown_fields() {
        let yaml = "calls: execute\n";
        assert!(serde_yaml::from_str::<MatchRule>(yaml).is_err());
    }

    #[test]
    fn test_builders() {
        let atom = AtomSpec::new("source.flask.args", AtomKind::Source)
            .with_rule(MatchRule::read(Some("flask.Request"), "args"))
            .with_tags(["user_input"])
            .with_severity(Severity::High);

        assert_eq!(atom.match_rules[0].read.as_deref(), Some("args"));
        assert_eq!(atom.severity, Severity::High);
        assert!(!atom.debug);
    }
}
