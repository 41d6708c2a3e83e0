//! Decisions: where constraints apply, what they say, and what was chosen.

pub mod choice;
pub mod config;
pub mod constraint;
pub mod scope;
pub mod target;

pub use self::choice::{Choice, DecisionLog};
pub use self::config::{Config, ConfigDocument, ConstraintAuthority, ScopeElement, TargetElement};
pub use self::constraint::Constraint;
pub use self::scope::{Scope, ScopeTree};
pub use self::target::Target;
