//! # Introspection
//!
//! Construction strategies need to know, for a type name, how instances can be
//! made: its constructors, fields, factory methods, concrete subtypes and enum
//! variants. The [`Introspector`] trait is that capability. Rust has no runtime
//! reflection, so the bundled implementation, [`Registry`], is an explicit
//! registration table: callers describe their types with [`TypeDef`] and attach
//! callables that assemble [`Value`]s.
//!
//! Query methods return `Result`; an `Err` is a collaborator fault, and the
//! strategy that issued the query treats it as a decline. Visibility is
//! recorded on constructors so that the plain constructor strategy can honor it
//! while field injection bypasses it.
//!
//! ```
//! use rog::introspect::{Registry, TypeDef};
//! use rog::types::TypeRef;
//!
//! let mut registry = Registry::new();
//! registry.register(TypeDef::record(
//!     "geo::Point",
//!     vec![("x", TypeRef::int()), ("y", TypeRef::int())],
//! ));
//! assert!(registry.contains("geo::Point"));
//! ```

use crate::error::IntrospectionError;
use crate::types::{TypeDescriptor, TypeName, TypeRef};
use crate::value::{Object, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callable that assembles a value from its (possibly null) arguments.
pub type Build = Arc<dyn Fn(Vec<Option<Value>>) -> Result<Value, IntrospectionError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A constructor of a registered type.
#[derive(Clone)]
pub struct Constructor {
    owner: TypeName,
    params: Vec<TypeRef>,
    fuzz: bool,
    visibility: Visibility,
    build: Build,
}

impl Constructor {
    pub fn new<F>(owner: impl Into<TypeName>, params: Vec<TypeRef>, build: F) -> Self
    where
        F: Fn(Vec<Option<Value>>) -> Result<Value, IntrospectionError> + Send + Sync + 'static,
    {
        Constructor {
            owner: owner.into(),
            params,
            fuzz: false,
            visibility: Visibility::Public,
            build: Arc::new(build),
        }
    }

    /// Mark as eligible for fuzz-first construction.
    pub fn fuzz(mut self) -> Self {
        self.fuzz = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn is_fuzz(&self) -> bool {
        self.fuzz
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn path(&self) -> String {
        format!("{}::new", self.owner.simple_name())
    }

    pub fn invoke(&self, args: Vec<Option<Value>>) -> Result<Value, IntrospectionError> {
        check_arity(&self.path(), self.params.len(), args.len())?;
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("owner", &self.owner)
            .field("params", &self.params)
            .field("fuzz", &self.fuzz)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// A factory method: declared on `owner`, producing `returns`.
#[derive(Clone)]
pub struct Factory {
    owner: TypeName,
    name: String,
    params: Vec<TypeRef>,
    returns: TypeRef,
    build: Build,
}

impl Factory {
    pub fn new<F>(
        owner: impl Into<TypeName>,
        name: impl Into<String>,
        params: Vec<TypeRef>,
        returns: TypeRef,
        build: F,
    ) -> Self
    where
        F: Fn(Vec<Option<Value>>) -> Result<Value, IntrospectionError> + Send + Sync + 'static,
    {
        Factory {
            owner: owner.into(),
            name: name.into(),
            params,
            returns,
            build: Arc::new(build),
        }
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn returns(&self) -> &TypeRef {
        &self.returns
    }

    pub fn produces(&self, ty: &TypeName) -> bool {
        TypeDescriptor::normalize(&self.returns).base() == ty
    }

    pub fn path(&self) -> String {
        format!("{}::{}", self.owner.simple_name(), self.name)
    }

    pub fn invoke(&self, args: Vec<Option<Value>>) -> Result<Value, IntrospectionError> {
        check_arity(&self.path(), self.params.len(), args.len())?;
        (self.build)(args)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("path", &self.path())
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

fn check_arity(callable: &str, expected: usize, actual: usize) -> Result<(), IntrospectionError> {
    if expected != actual {
        return Err(IntrospectionError::Arity {
            callable: callable.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeRef,
    pub settable: bool,
}

/// Introspection provider consumed by the construction strategies.
pub trait Introspector: fmt::Debug {
    fn constructors(&self, ty: &TypeName) -> Result<Vec<Constructor>, IntrospectionError>;

    fn fields(&self, ty: &TypeName) -> Result<Vec<FieldInfo>, IntrospectionError>;

    /// Factory methods declared on `ty` itself that produce `ty`.
    fn local_factories(&self, ty: &TypeName) -> Result<Vec<Factory>, IntrospectionError>;

    /// Factory methods declared on other types that produce `ty`.
    fn static_factories(&self, ty: &TypeName) -> Result<Vec<Factory>, IntrospectionError>;

    /// Known concrete implementations of an abstract `ty`.
    fn subtypes(&self, ty: &TypeName) -> Result<Vec<TypeRef>, IntrospectionError>;

    fn is_abstract(&self, ty: &TypeName) -> bool;

    /// Variant names when `ty` is an enumeration.
    fn enum_variants(&self, ty: &TypeName) -> Option<Vec<String>>;

    /// Set a field on an instance, ignoring visibility.
    fn set_field(
        &self,
        instance: &mut Value,
        field: &FieldInfo,
        value: Option<Value>,
    ) -> Result<(), IntrospectionError> {
        match instance {
            Value::Object(obj) => {
                obj.set(field.name.clone(), value);
                Ok(())
            }
            _ => Err(IntrospectionError::NotAnObject {
                field: field.name.clone(),
            }),
        }
    }
}

/// Description of one registered type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: TypeName,
    is_abstract: bool,
    fields: Vec<FieldInfo>,
    constructors: Vec<Constructor>,
    factories: Vec<Factory>,
    subtypes: Vec<TypeRef>,
    variants: Option<Vec<String>>,
}

impl TypeDef {
    pub fn new(name: impl Into<TypeName>) -> Self {
        TypeDef {
            name: name.into(),
            is_abstract: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            factories: Vec::new(),
            subtypes: Vec::new(),
            variants: None,
        }
    }

    /// A plain data type: its fields plus a public constructor taking every field in order.
    pub fn record(name: impl Into<TypeName>, fields: Vec<(&str, TypeRef)>) -> Self {
        let mut def = TypeDef::new(name);
        for (field, ty) in fields {
            def = def.field(field, ty);
        }
        def.with_field_constructor()
    }

    pub fn enumeration(name: impl Into<TypeName>, variants: &[&str]) -> Self {
        let mut def = TypeDef::new(name);
        def.variants = Some(variants.iter().map(|v| v.to_string()).collect());
        def
    }

    /// An abstract type or capability with its known implementations.
    pub fn abstract_type(name: impl Into<TypeName>, subtypes: Vec<TypeRef>) -> Self {
        let mut def = TypeDef::new(name);
        def.is_abstract = true;
        def.subtypes = subtypes;
        def
    }

    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_string(),
            ty,
            settable: true,
        });
        self
    }

    /// A field that field injection must skip.
    pub fn readonly_field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_string(),
            ty,
            settable: false,
        });
        self
    }

    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Public constructor taking every declared field, in declaration order.
    pub fn with_field_constructor(mut self) -> Self {
        let names: Vec<String> = self.fields.iter().map(|f| f.name.clone()).collect();
        let params = self.fields.iter().map(|f| f.ty.clone()).collect();
        let type_name = self.name.as_str().to_string();
        let ctor = Constructor::new(self.name.clone(), params, move |args| {
            let mut obj = Object::new(type_name.clone());
            for (name, value) in names.iter().zip(args) {
                obj.set(name.clone(), value);
            }
            Ok(Value::Object(obj))
        });
        self.constructors.push(ctor);
        self
    }

    /// Private no-argument constructor leaving every field null.
    pub fn with_empty_constructor(mut self) -> Self {
        let names: Vec<String> = self.fields.iter().map(|f| f.name.clone()).collect();
        let type_name = self.name.as_str().to_string();
        let ctor = Constructor::new(self.name.clone(), Vec::new(), move |_| {
            let mut obj = Object::new(type_name.clone());
            for name in &names {
                obj.set(name.clone(), None);
            }
            Ok(Value::Object(obj))
        });
        self.constructors.push(ctor.private());
        self
    }

    pub fn local_factory<F>(mut self, name: &str, params: Vec<TypeRef>, build: F) -> Self
    where
        F: Fn(Vec<Option<Value>>) -> Result<Value, IntrospectionError> + Send + Sync + 'static,
    {
        let returns = TypeRef::Named(self.name.clone());
        self.factories
            .push(Factory::new(self.name.clone(), name, params, returns, build));
        self
    }

    pub fn subtype(mut self, ty: TypeRef) -> Self {
        self.subtypes.push(ty);
        self
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }
}

/// Explicit-registration [`Introspector`].
///
/// Unknown types have no constructors, fields or factories, so every strategy
/// declines for them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: HashMap<TypeName, TypeDef>,
    factories: Vec<Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: TypeDef) -> &mut Self {
        if self.types.contains_key(&def.name) {
            log::warn!("re-registering type {}", def.name);
        }
        self.types.insert(def.name.clone(), def);
        self
    }

    /// Register a factory method declared on some other type.
    pub fn factory(&mut self, factory: Factory) -> &mut Self {
        self.factories.push(factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&TypeName::from(name))
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Introspector for Registry {
    fn constructors(&self, ty: &TypeName) -> Result<Vec<Constructor>, IntrospectionError> {
        Ok(self.get(ty).map(|d| d.constructors.clone()).unwrap_or_default())
    }

    fn fields(&self, ty: &TypeName) -> Result<Vec<FieldInfo>, IntrospectionError> {
        Ok(self.get(ty).map(|d| d.fields.clone()).unwrap_or_default())
    }

    fn local_factories(&self, ty: &TypeName) -> Result<Vec<Factory>, IntrospectionError> {
        Ok(self
            .get(ty)
            .map(|d| d.factories.iter().filter(|f| f.produces(ty)).cloned().collect())
            .unwrap_or_default())
    }

    fn static_factories(&self, ty: &TypeName) -> Result<Vec<Factory>, IntrospectionError> {
        Ok(self.factories.iter().filter(|f| f.produces(ty)).cloned().collect())
    }

    fn subtypes(&self, ty: &TypeName) -> Result<Vec<TypeRef>, IntrospectionError> {
        Ok(self.get(ty).map(|d| d.subtypes.clone()).unwrap_or_default())
    }

    fn is_abstract(&self, ty: &TypeName) -> bool {
        self.get(ty).map_or(false, |d| d.is_abstract)
    }

    fn enum_variants(&self, ty: &TypeName) -> Option<Vec<String>> {
        self.get(ty).and_then(|d| d.variants.clone())
    }
}
