//! Session configuration: the scope tree plus the constraint authority contract.
//!
//! The tree can be exported to a hierarchical document of the shape
//! `config > scopes > scope (> target, constraint, scopes ...)`, encoded as JSON:
//!
//! ```json
//! {
//!   "config": {
//!     "scopes": [
//!       {
//!         "target": { "instancePath": "Order" },
//!         "constraint": { "nullProb": 0.25 },
//!         "scopes": [ ... ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Export is a read-only projection; importing it back yields the same tree and
//! therefore the same resolution for every target.

use super::scope::{Scope, ScopeTree};
use super::{Constraint, Target};
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Source of constraints for the dispatcher.
pub trait ConstraintAuthority: std::fmt::Debug {
    /// Constraint bound for `target`, if any.
    fn find_constraint_for(&self, target: &Target) -> Option<Constraint>;

    /// Default constraint used when nothing is bound. Must be deterministic per target.
    fn make_constraint(&self, _target: &Target) -> Constraint {
        Constraint::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    tree: ScopeTree,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&mut self, target: Target, constraint: Constraint) -> ConfigResult<()> {
        self.tree.add_pair(target, constraint)
    }

    /// Builder-style `add_pair`.
    pub fn with_pair(mut self, target: Target, constraint: Constraint) -> ConfigResult<Self> {
        self.add_pair(target, constraint)?;
        Ok(self)
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            config: ScopeElement::from_scope(self.tree.root()),
        }
    }

    pub fn from_document(document: ConfigDocument) -> ConfigResult<Self> {
        Ok(Config {
            tree: ScopeTree::from_root(document.config.into_scope()?),
        })
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Hex SHA-256 of the canonical (compact) document.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(&self.to_document()).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }
}

impl ConstraintAuthority for Config {
    fn find_constraint_for(&self, target: &Target) -> Option<Constraint> {
        self.tree.resolve(target).cloned()
    }
}

/// Root of the exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub config: ScopeElement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<ScopeElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetElement {
    #[serde(rename = "instancePath", default, skip_serializing_if = "Option::is_none")]
    pub instance_path: Option<String>,
    #[serde(rename = "methodPath", default, skip_serializing_if = "Option::is_none")]
    pub method_path: Option<String>,
}

impl ScopeElement {
    fn from_scope(scope: &Scope) -> Self {
        ScopeElement {
            target: scope.target().map(|t| TargetElement {
                instance_path: Some(t.instance_path.clone()).filter(|p| !p.is_empty()),
                method_path: t.method_path.clone(),
            }),
            constraint: scope.constraint().cloned(),
            scopes: scope.children().iter().map(ScopeElement::from_scope).collect(),
        }
    }

    fn into_scope(self) -> ConfigResult<Scope> {
        if let Some(constraint) = &self.constraint {
            constraint.validate()?;
        }
        let target = self.target.map(|t| {
            let target = Target::at(t.instance_path.unwrap_or_default());
            match t.method_path {
                Some(method) => target.with_method(method),
                None => target,
            }
        });
        let children = self
            .scopes
            .into_iter()
            .map(ScopeElement::into_scope)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Scope::new(target, self.constraint, children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let config = Config::new()
            .with_pair(Target::at("Order"), Constraint::new().with_null_prob(0.25))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        let scope = &json["config"]["scopes"][0];
        assert_eq!(scope["target"]["instancePath"], "Order");
        assert_eq!(scope["constraint"]["nullProb"], 0.25);
        assert!(scope["target"].get("methodPath").is_none());
        assert!(scope["constraint"].get("prob").is_none());
    }

    #[test]
    fn test_import_rejects_bad_probability() {
        let json = r#"{"config":{"scopes":[{"target":{"instancePath":"A"},"constraint":{"prob":3.0}}]}}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Config::new()
            .with_pair(Target::at("A"), Constraint::new().with_prob(0.5))
            .unwrap();
        let b = Config::from_json(&a.to_json().unwrap()).unwrap();
        let c = Config::new()
            .with_pair(Target::at("A"), Constraint::new().with_prob(0.6))
            .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_default_constraint_is_unset() {
        let config = Config::new();
        let target = Target::at("Anything");
        assert_eq!(config.find_constraint_for(&target), None);
        assert!(config.make_constraint(&target).is_unset());
    }
}
