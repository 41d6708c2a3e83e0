//! # ROG: Random Object Generator
//!
//! Synthesizes randomized, structurally valid instances of arbitrary types from a
//! type reference and a set of scoped constraints, without hand-written
//! generators per type.
//!
//! A [`Session`] drives the recursive synthesis: it normalizes the requested type
//! into a [`TypeDescriptor`], resolves the most specific [`Constraint`] for the
//! current position in the object graph, decides null versus value, and either
//! delegates to the primitive value generator or walks a fixed chain of
//! construction strategies. Cycles in the type graph end in null, and every
//! terminal decision lands in a [`DecisionLog`] for replay and audit.
//!
//! ```
//! use rog::{Registry, Session, TypeDef, TypeRef};
//!
//! let mut registry = Registry::new();
//! registry.register(TypeDef::record(
//!     "Item",
//!     vec![("count", TypeRef::int()), ("label", TypeRef::text())],
//! ));
//!
//! let mut session = Session::builder(registry).seed(42).build();
//! let items = session.generate(&TypeRef::list_of(TypeRef::named("Item")));
//! assert!(items.map_or(true, |v| v.elements().unwrap().len() <= 10));
//! ```

pub mod decisions;
pub mod error;
pub mod introspect;
pub mod providers;
pub mod session;
pub mod traversal;
pub mod types;
pub mod value;

pub use decisions::{Choice, Config, Constraint, ConstraintAuthority, DecisionLog, Scope, ScopeTree, Target};
pub use error::{ConfigError, IntrospectionError};
pub use introspect::{Constructor, Factory, FieldInfo, Introspector, Registry, TypeDef};
pub use providers::{PrimitiveProvider, ProviderConfig, RandomProvider, ReplayProvider};
pub use session::{Session, SessionBuilder, SessionConfig};
pub use traversal::{Finder, History, InstanceDispatcher, StrategyChain};
pub use types::{TypeDescriptor, TypeName, TypeRef};
pub use value::{Object, Value};
