//! Parameter validation
//!
//! An independent pass over a request's [`Value`]; the dispatcher never runs
//! it. Rules are attached to parameter names, and only names present in the
//! checked `Value` are validated.
//!
//! ```
//! use dispatch_server::params::Value;
//! use dispatch_server::validation::{self, Rules};
//!
//! let mut rules = Rules::new();
//! rules.add("email", validation::email, "Invalid e-mail");
//!
//! let mut params = Value::new();
//! params.append("email", "nobody");
//! let (valid, messages) = rules.validate(&params);
//! assert!(!valid);
//! assert_eq!(messages["email"], vec!["Value must be an e-mail address."]);
//! ```

use crate::params::Value;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const DEFAULT_MESSAGE: &str = "An error occurred";

/// Failure of a single rule; its text is reported back per parameter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RuleError(String);

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type Rule = Box<dyn Fn(&str) -> Result<(), RuleError> + Send + Sync>;

/// Rules applied to one parameter, all of them every time
pub struct Constraint {
    rules: Vec<Rule>,
    message: String,
}

impl Constraint {
    fn new() -> Self {
        Self {
            rules: Vec::new(),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }

    pub fn add<F>(&mut self, rule: F)
    where
        F: Fn(&str) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
    }

    /// Summary message given with the most recent rule
    pub fn message(&self) -> &str {
        &self.message
    }

    fn check(&self, value: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| rule(value).err())
            .map(|e| e.to_string())
            .collect()
    }
}

#[derive(Default)]
pub struct Rules {
    constraints: HashMap<String, Constraint>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, name: &str, rule: F, message: &str) -> &mut Self
    where
        F: Fn(&str) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        let constraint = self
            .constraints
            .entry(name.to_string())
            .or_insert_with(Constraint::new);
        constraint.message = message.to_string();
        constraint.add(rule);
        self
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// Check the first value of every constrained parameter in `params`.
    ///
    /// Returns whether all rules passed, and the rule errors per failing
    /// parameter.
    pub fn validate(&self, params: &Value) -> (bool, HashMap<String, Vec<String>>) {
        let mut messages = HashMap::new();

        for key in params.keys() {
            let Some(constraint) = self.constraints.get(key) else {
                continue;
            };
            let errors = constraint.check(params.get(key));
            if !errors.is_empty() {
                messages.insert(key.to_string(), errors);
            }
        }

        (messages.is_empty(), messages)
    }
}

static URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]+://[a-z0-9][a-z0-9\-.]*").ok());
static OBJECT_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-f0-9]{24}$").ok());
static ALPHA: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9]+$").ok());
static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9][a-z0-9.\-+_]*@[a-z0-9\-.]+.[a-z]+$").ok()
});
static NUMERIC: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]+$").ok());

fn check(re: &Option<Regex>, value: &str, message: &str) -> Result<(), RuleError> {
    if re.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(RuleError::new(message))
    }
}

pub fn not_empty(value: &str) -> Result<(), RuleError> {
    if value.is_empty() {
        return Err(RuleError::new("This value is required"));
    }
    Ok(())
}

pub fn url(value: &str) -> Result<(), RuleError> {
    check(&URL, value, "Value must be an URL.")
}

/// 24 lower-case hex digits, as in a BSON ObjectId
pub fn object_id(value: &str) -> Result<(), RuleError> {
    check(&OBJECT_ID, value, "Expecting an ObjectId.")
}

pub fn alpha(value: &str) -> Result<(), RuleError> {
    check(
        &ALPHA,
        value,
        "Value must be a number or a letter from A to Z (case does not matter).",
    )
}

pub fn email(value: &str) -> Result<(), RuleError> {
    check(&EMAIL, value, "Value must be an e-mail address.")
}

pub fn numeric(value: &str) -> Result<(), RuleError> {
    check(&NUMERIC, value, "Value must be a number.")
}

/// Match `value` against an arbitrary pattern. An invalid pattern never
/// matches.
pub fn match_expr(value: &str, pattern: &str) -> Result<(), RuleError> {
    match Regex::new(pattern) {
        Ok(re) if re.is_match(value) => Ok(()),
        _ => Err(RuleError::new(format!(
            "Value does not match pattern {pattern}."
        ))),
    }
}
