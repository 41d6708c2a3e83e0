//! # Type Descriptors
//!
//! Requested types arrive as [`TypeRef`]s, which may be plain names, parameterized
//! types, wildcards or unbound type variables. Before anything else the dispatcher
//! normalizes a reference into a [`TypeDescriptor`]: a base type name plus the
//! ordered, recursively normalized generic arguments. Descriptors are the unit of
//! identity for the recursion guard and for dispatch.
//!
//! ## Normalization Rules
//!
//! - `Named(T)` becomes `T` with no generic arguments
//! - `Parameterized { raw, args }` becomes `raw` with every argument normalized
//! - `Wildcard { upper: Some(U) }` resolves to its upper bound `U`
//! - `Wildcard { upper: None }` and `Variable(_)` resolve to the default
//!   placeholder type, [`builtin::TEXT`]
//!
//! Normalization is total: it never fails and performs no I/O.
//!
//! ## Rendering
//!
//! Instance paths are built from rendered descriptors: the simple name of the
//! base type followed by `<A,B>` when generic arguments exist. Nested arguments
//! render recursively, so `List<List<i32>>` stays unambiguous. Segment splitting
//! ([`split_path`]) ignores `.` inside angle brackets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the built-in base types the dispatcher handles without strategies.
pub mod builtin {
    pub const INT: &str = "i32";
    pub const LONG: &str = "i64";
    pub const CHAR: &str = "char";
    pub const FLOAT: &str = "f32";
    pub const DOUBLE: &str = "f64";
    pub const BOOL: &str = "bool";
    pub const BYTE: &str = "i8";
    pub const SHORT: &str = "i16";
    pub const TEXT: &str = "String";
    pub const ARRAY: &str = "Array";
    pub const LIST: &str = "List";
    pub const BIG_INT: &str = "BigInt";
    pub const NUMBER: &str = "Number";
}

/// Identity of a base type, usually a path such as `geo::Point`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, accepting both `::` and `.` as separators.
    pub fn simple_name(&self) -> &str {
        let tail = match self.0.rfind("::") {
            Some(idx) => &self.0[idx + 2..],
            None => &self.0,
        };
        match tail.rfind('.') {
            Some(idx) => &tail[idx + 1..],
            None => tail,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName(name)
    }
}

/// A type as requested by a caller or declared in introspection metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(TypeName),
    Parameterized { raw: TypeName, args: Vec<TypeRef> },
    /// `? extends upper`; a missing upper bound is treated as unknown.
    Wildcard { upper: Option<Box<TypeRef>> },
    /// An unbound type parameter such as `T`.
    Variable(String),
}

impl TypeRef {
    pub fn named(name: impl Into<TypeName>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn generic(raw: impl Into<TypeName>, args: Vec<TypeRef>) -> Self {
        TypeRef::Parameterized {
            raw: raw.into(),
            args,
        }
    }

    pub fn wildcard(upper: Option<TypeRef>) -> Self {
        TypeRef::Wildcard {
            upper: upper.map(Box::new),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        TypeRef::Variable(name.into())
    }

    pub fn int() -> Self {
        TypeRef::named(builtin::INT)
    }

    pub fn long() -> Self {
        TypeRef::named(builtin::LONG)
    }

    pub fn double() -> Self {
        TypeRef::named(builtin::DOUBLE)
    }

    pub fn boolean() -> Self {
        TypeRef::named(builtin::BOOL)
    }

    pub fn text() -> Self {
        TypeRef::named(builtin::TEXT)
    }

    pub fn list_of(element: TypeRef) -> Self {
        TypeRef::generic(builtin::LIST, vec![element])
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::generic(builtin::ARRAY, vec![element])
    }
}

impl From<&TypeDescriptor> for TypeRef {
    fn from(descriptor: &TypeDescriptor) -> Self {
        if descriptor.generics.is_empty() {
            TypeRef::Named(descriptor.base.clone())
        } else {
            TypeRef::Parameterized {
                raw: descriptor.base.clone(),
                args: descriptor.generics.iter().map(TypeRef::from).collect(),
            }
        }
    }
}

/// Canonical (base type, generic arguments) pair.
///
/// Equality is structural and recursive over the generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    base: TypeName,
    generics: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn plain(base: impl Into<TypeName>) -> Self {
        TypeDescriptor {
            base: base.into(),
            generics: Vec::new(),
        }
    }

    /// Normalize a type reference into its canonical descriptor.
    pub fn normalize(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Named(name) => TypeDescriptor::plain(name.clone()),
            TypeRef::Parameterized { raw, args } => TypeDescriptor {
                base: raw.clone(),
                generics: args.iter().map(Self::normalize).collect(),
            },
            TypeRef::Wildcard { upper: Some(upper) } => Self::normalize(upper),
            TypeRef::Wildcard { upper: None } | TypeRef::Variable(_) => Self::placeholder(),
        }
    }

    /// Stand-in for types that cannot be resolved.
    pub fn placeholder() -> Self {
        TypeDescriptor::plain(builtin::TEXT)
    }

    pub fn base(&self) -> &TypeName {
        &self.base
    }

    pub fn generics(&self) -> &[TypeDescriptor] {
        &self.generics
    }

    pub fn simple_name(&self) -> &str {
        self.base.simple_name()
    }

    /// First generic argument, or the placeholder for a raw container.
    pub fn element(&self) -> TypeDescriptor {
        self.generics
            .first()
            .cloned()
            .unwrap_or_else(Self::placeholder)
    }

    pub fn kind(&self) -> BuiltinKind {
        BuiltinKind::of(&self.base)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())?;
        if !self.generics.is_empty() {
            f.write_str("<")?;
            for (i, generic) in self.generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", generic)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Primitive-like kinds delegated straight to the value generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Int,
    Long,
    Char,
    Float,
    Double,
    Bool,
    Byte,
    Short,
    Text,
}

impl Primitive {
    /// Value types are never nulled by the null gate. Text is nullable.
    pub fn is_value_type(self) -> bool {
        !matches!(self, Primitive::Text)
    }
}

/// How the dispatcher treats a base type before consulting strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Primitive(Primitive),
    Array,
    List,
    BigInt,
    Number,
    Other,
}

impl BuiltinKind {
    pub fn of(name: &TypeName) -> Self {
        match name.as_str() {
            builtin::INT => BuiltinKind::Primitive(Primitive::Int),
            builtin::LONG => BuiltinKind::Primitive(Primitive::Long),
            builtin::CHAR => BuiltinKind::Primitive(Primitive::Char),
            builtin::FLOAT => BuiltinKind::Primitive(Primitive::Float),
            builtin::DOUBLE => BuiltinKind::Primitive(Primitive::Double),
            builtin::BOOL => BuiltinKind::Primitive(Primitive::Bool),
            builtin::BYTE => BuiltinKind::Primitive(Primitive::Byte),
            builtin::SHORT => BuiltinKind::Primitive(Primitive::Short),
            builtin::TEXT => BuiltinKind::Primitive(Primitive::Text),
            builtin::ARRAY => BuiltinKind::Array,
            builtin::LIST => BuiltinKind::List,
            builtin::BIG_INT => BuiltinKind::BigInt,
            builtin::NUMBER => BuiltinKind::Number,
            _ => BuiltinKind::Other,
        }
    }

    pub fn is_value_type(self) -> bool {
        match self {
            BuiltinKind::Primitive(p) => p.is_value_type(),
            _ => false,
        }
    }
}

/// Split an instance path on `.` at angle-bracket depth zero.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in path.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(&path[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_type_has_no_generics() {
        let d = TypeDescriptor::normalize(&TypeRef::named("geo::Point"));
        assert_eq!(d.base().as_str(), "geo::Point");
        assert!(d.generics().is_empty());
        assert_eq!(d.to_string(), "Point");
    }

    #[test]
    fn test_wildcard_argument_resolves_to_upper_bound() {
        let ty = TypeRef::list_of(TypeRef::wildcard(Some(TypeRef::named("shapes.Shape"))));
        let d = TypeDescriptor::normalize(&ty);
        assert_eq!(d.generics(), &[TypeDescriptor::plain("shapes.Shape")]);
        assert_eq!(d.to_string(), "List<Shape>");
    }

    #[test]
    fn test_unbounded_wildcard_and_variable_use_placeholder() {
        let ty = TypeRef::generic(
            "Pair",
            vec![TypeRef::wildcard(None), TypeRef::variable("T")],
        );
        let d = TypeDescriptor::normalize(&ty);
        assert_eq!(d.to_string(), "Pair<String,String>");
        assert_eq!(
            TypeDescriptor::normalize(&TypeRef::variable("E")),
            TypeDescriptor::placeholder()
        );
    }

    #[test]
    fn test_equality_is_recursive() {
        let a = TypeDescriptor::normalize(&TypeRef::list_of(TypeRef::list_of(TypeRef::int())));
        let b = TypeDescriptor::normalize(&TypeRef::list_of(TypeRef::list_of(TypeRef::int())));
        let c = TypeDescriptor::normalize(&TypeRef::list_of(TypeRef::list_of(TypeRef::long())));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "List<List<i32>>");
    }

    #[test]
    fn test_split_path_respects_generics() {
        assert_eq!(split_path("A.Map<K,List<V>>.i32"), vec!["A", "Map<K,List<V>>", "i32"]);
        assert_eq!(split_path("A"), vec!["A"]);
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_text_is_the_only_nullable_primitive() {
        assert!(BuiltinKind::of(&TypeName::from(builtin::INT)).is_value_type());
        assert!(!BuiltinKind::of(&TypeName::from(builtin::TEXT)).is_value_type());
        assert!(!BuiltinKind::of(&TypeName::from("Point")).is_value_type());
    }
}
