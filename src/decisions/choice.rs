//! Decision log: the reproducibility artifact of a generation session.
//!
//! Every terminal decision (a null from the null gate, a primitive value, an
//! enum variant, an arbitrary-precision integer or a generic number) is appended
//! as one [`Choice`] together with the [`Target`] active when it was made.
//! Together with the session seed and the configuration fingerprint this is
//! enough to replay a session or to explain why a value appeared where it did.

use super::Target;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded terminal decision. `value: None` is the explicit null marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub target: Target,
    pub value: Option<Value>,
}

impl Choice {
    pub fn null(target: Target) -> Self {
        Choice {
            target,
            value: None,
        }
    }

    pub fn value(target: Target, value: Value) -> Self {
        Choice {
            target,
            value: Some(value),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} = {:?}", self.target, value),
            None => write!(f, "{} = null", self.target),
        }
    }
}

/// Append-only record of the choices made in one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_fingerprint: Option<String>,
    choices: Vec<Choice>,
}

impl DecisionLog {
    pub fn new(seed: u64, config_fingerprint: Option<String>) -> Self {
        DecisionLog {
            seed,
            config_fingerprint,
            choices: Vec::new(),
        }
    }

    pub fn push(&mut self, choice: Choice) {
        log::debug!("choice {}", choice);
        self.choices.push(choice);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config_fingerprint(&self) -> Option<&str> {
        self.config_fingerprint.as_deref()
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_null()).count()
    }

    /// Choices recorded at exactly this instance path.
    pub fn at<'a>(&'a self, instance_path: &'a str) -> impl Iterator<Item = &'a Choice> + 'a {
        self.choices
            .iter()
            .filter(move |c| c.target.instance_path == instance_path)
    }

    /// Replace the value of a recorded choice, for replaying an edited log.
    pub fn edit(&mut self, index: usize, value: Option<Value>) -> bool {
        match self.choices.get_mut(index) {
            Some(choice) => {
                choice.value = value;
                true
            }
            None => false,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
