//! Construction strategies, tried in a fixed order until one builds a value.
//!
//! | Order | Finder | Builds via |
//! |---|---|---|
//! | 1 | [`FuzzConstructorFinder`] | constructors marked for fuzz-first construction |
//! | 2 | [`ConstructorFinder`] | any other public constructor |
//! | 3 | [`LocalFactoryFinder`] | factory methods declared on the type itself |
//! | 4 | [`FactoryFinder`] | factory methods declared elsewhere |
//! | 5 | [`SubclassFinder`] | a concrete subtype of an abstract type |
//! | 6 | [`FieldInjectionFinder`] | a no-argument constructor, then every field |
//!
//! `Ok(None)` is a decline. `Err` means the introspection provider failed; the
//! dispatcher logs it and moves on to the next finder all the same.

use super::dispatcher::InstanceDispatcher;
use crate::error::IntrospectionError;
use crate::introspect::{Constructor, Factory};
use crate::types::TypeDescriptor;
use crate::value::Value;
use rand::seq::SliceRandom;
use std::fmt;

pub type FindResult = Result<Option<Value>, IntrospectionError>;

/// One construction technique in the fallback chain.
pub trait Finder: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult;
}

/// Ordered list of finders.
#[derive(Debug)]
pub struct StrategyChain {
    finders: Vec<Box<dyn Finder>>,
}

impl StrategyChain {
    pub fn standard() -> Self {
        StrategyChain {
            finders: vec![
                Box::new(FuzzConstructorFinder),
                Box::new(ConstructorFinder),
                Box::new(LocalFactoryFinder),
                Box::new(FactoryFinder),
                Box::new(SubclassFinder),
                Box::new(FieldInjectionFinder),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Finder> {
        self.finders.iter().map(|f| f.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|f| f.name()).collect()
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::standard()
    }
}

fn try_constructors<'a>(
    constructors: impl Iterator<Item = &'a Constructor>,
    dispatcher: &mut InstanceDispatcher<'_>,
) -> Option<Value> {
    for ctor in constructors {
        let path = ctor.path();
        let args = dispatcher.random_args(&path, ctor.params());
        match ctor.invoke(args) {
            Ok(value) => return Some(value),
            Err(err) => dispatcher.note(format!("{} rejected: {}", path, err)),
        }
    }
    None
}

fn try_factories(factories: &[Factory], dispatcher: &mut InstanceDispatcher<'_>) -> Option<Value> {
    for factory in factories {
        let path = factory.path();
        let args = dispatcher.random_args(&path, factory.params());
        match factory.invoke(args) {
            Ok(value) => return Some(value),
            Err(err) => dispatcher.note(format!("{} rejected: {}", path, err)),
        }
    }
    None
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzConstructorFinder;

impl Finder for FuzzConstructorFinder {
    fn name(&self) -> &'static str {
        "FuzzConstructorFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let constructors = dispatcher.introspector().constructors(target.base())?;
        Ok(try_constructors(constructors.iter().filter(|c| c.is_fuzz()), dispatcher))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructorFinder;

impl Finder for ConstructorFinder {
    fn name(&self) -> &'static str {
        "ConstructorFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let constructors = dispatcher.introspector().constructors(target.base())?;
        Ok(try_constructors(
            constructors.iter().filter(|c| c.is_public() && !c.is_fuzz()),
            dispatcher,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFactoryFinder;

impl Finder for LocalFactoryFinder {
    fn name(&self) -> &'static str {
        "LocalFactoryFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let factories = dispatcher.introspector().local_factories(target.base())?;
        Ok(try_factories(&factories, dispatcher))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryFinder;

impl Finder for FactoryFinder {
    fn name(&self) -> &'static str {
        "FactoryFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let factories = dispatcher.introspector().static_factories(target.base())?;
        Ok(try_factories(&factories, dispatcher))
    }
}

/// Substitutes a concrete subtype, picked in random order, for an abstract type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubclassFinder;

impl Finder for SubclassFinder {
    fn name(&self) -> &'static str {
        "SubclassFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let introspector = dispatcher.introspector();
        if !introspector.is_abstract(target.base()) {
            return Ok(None);
        }
        let mut subtypes = introspector.subtypes(target.base())?;
        subtypes.shuffle(dispatcher.provider().random());

        for subtype in &subtypes {
            if TypeDescriptor::normalize(subtype) == *target {
                continue;
            }
            if let Some(value) = dispatcher.child().get_instance(subtype) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// Last resort: no-argument constructor of any visibility, then set every field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldInjectionFinder;

impl Finder for FieldInjectionFinder {
    fn name(&self) -> &'static str {
        "FieldInjectionFinder"
    }

    fn find_instance(&self, target: &TypeDescriptor, dispatcher: &mut InstanceDispatcher<'_>) -> FindResult {
        let introspector = dispatcher.introspector();
        let constructors = introspector.constructors(target.base())?;
        let ctor = match constructors.iter().find(|c| c.params().is_empty()) {
            Some(ctor) => ctor,
            None => return Ok(None),
        };
        let mut instance = ctor.invoke(Vec::new())?;

        for field in introspector.fields(target.base())? {
            if !field.settable {
                dispatcher.note(format!("skipping field {}", field.name));
                continue;
            }
            let value = dispatcher.child().get_instance(&field.ty);
            if let Err(err) = introspector.set_field(&mut instance, &field, value) {
                dispatcher.note(format!("could not set field {}: {}", field.name, err));
            }
        }
        Ok(Some(instance))
    }
}
