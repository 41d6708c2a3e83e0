//! Traversal of the requested type graph.

pub mod dispatcher;
pub mod finders;
pub mod history;

pub use self::dispatcher::InstanceDispatcher;
pub use self::finders::{
    ConstructorFinder, FactoryFinder, FieldInjectionFinder, FindResult, Finder, FuzzConstructorFinder,
    LocalFactoryFinder, StrategyChain, SubclassFinder,
};
pub use self::history::History;
