//! # Instance Dispatcher
//!
//! The dispatcher turns a requested type into a value. Each request runs the
//! same sequence:
//!
//! 1. **Normalize** the [`TypeRef`] into a [`TypeDescriptor`]
//! 2. **Cycle check**: a descriptor already on the path ends the branch with null
//! 3. **Extend** the path with the descriptor, for this branch only
//! 4. **Context**: render the path as the [`Target`]'s instance path
//! 5. **Constraint**: resolve from the authority, or synthesize the default
//! 6. **Null gate** (`try_get_instance` only, never for value types): a fired
//!    gate records a null [`Choice`] and returns null
//! 7. **Primitives and enums** go straight to the value generator
//! 8. **Common types**: arrays and lists, arbitrary-precision integers, numbers
//! 9. **Strategy chain** for everything else
//!
//! Nested requests go through child dispatchers that share the session and
//! start from the parent's path, so siblings in the object graph each see the
//! common ancestors but not one another.
//!
//! A null result is always a valid outcome. Cycles, declines and exhausted
//! strategies are explained in the session transcript, never raised.

use super::finders::StrategyChain;
use super::history::History;
use crate::decisions::{Choice, Constraint, Target};
use crate::introspect::Introspector;
use crate::providers::PrimitiveProvider;
use crate::session::Session;
use crate::types::{BuiltinKind, Primitive, TypeDescriptor, TypeRef};
use crate::value::Value;
use std::sync::Arc;

pub struct InstanceDispatcher<'s> {
    session: &'s mut Session,
    history: History,
    method_path: Option<String>,
}

impl<'s> InstanceDispatcher<'s> {
    pub(crate) fn new(session: &'s mut Session, history: History) -> Self {
        InstanceDispatcher {
            session,
            history,
            method_path: None,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// A fresh dispatcher on the same session and path.
    pub fn child(&mut self) -> InstanceDispatcher<'_> {
        InstanceDispatcher {
            session: &mut *self.session,
            history: self.history.clone(),
            method_path: None,
        }
    }

    /// A child whose next target carries `method_path`.
    pub fn within(&mut self, method_path: impl Into<String>) -> InstanceDispatcher<'_> {
        let mut child = self.child();
        child.method_path = Some(method_path.into());
        child
    }

    pub fn introspector(&self) -> Arc<dyn Introspector> {
        self.session.introspector()
    }

    pub fn provider(&mut self) -> &mut dyn PrimitiveProvider {
        self.session.provider_mut()
    }

    /// Build an instance, applying the null gate first.
    pub fn try_get_instance(&mut self, ty: &TypeRef) -> Option<Value> {
        self.dispatch(TypeDescriptor::normalize(ty), true)
    }

    /// Build an instance without the top-level null gate.
    pub fn get_instance(&mut self, ty: &TypeRef) -> Option<Value> {
        self.dispatch(TypeDescriptor::normalize(ty), false)
    }

    /// Arguments for a callable, each dispatched with the callable as method path.
    pub fn random_args(&mut self, method_path: &str, params: &[TypeRef]) -> Vec<Option<Value>> {
        params
            .iter()
            .map(|param| self.within(method_path).try_get_instance(param))
            .collect()
    }

    pub(crate) fn note(&mut self, msg: impl AsRef<str>) {
        let depth = self.history.len();
        self.session.note(depth, msg.as_ref());
    }

    pub(crate) fn dispatch(&mut self, descriptor: TypeDescriptor, null_gate: bool) -> Option<Value> {
        if self.history.contains(&descriptor) {
            self.note(format!("{} is already being built on this path, returning null", descriptor));
            return None;
        }

        let history = self.history.extended(descriptor.clone());
        let target = Target {
            instance_path: history.render(),
            method_path: self.method_path.clone(),
            type_name: descriptor.simple_name().to_string(),
        };
        let mut branch = InstanceDispatcher::new(&mut *self.session, history);
        branch.note(format!("current path: {}", target));

        let constraint = branch.session.load_constraint(&target);
        let kind = descriptor.kind();

        if null_gate
            && !kind.is_value_type()
            && branch.session.provider_mut().decide_null(&target, constraint.null_prob)
        {
            branch.note("Returning null instead of instance");
            branch.session.record(Choice::null(target));
            return None;
        }

        branch.build(&descriptor, kind, &target, &constraint)
    }

    fn build(
        &mut self,
        descriptor: &TypeDescriptor,
        kind: BuiltinKind,
        target: &Target,
        constraint: &Constraint,
    ) -> Option<Value> {
        match kind {
            BuiltinKind::Primitive(primitive) => Some(self.primitive(primitive, target, constraint)),
            BuiltinKind::Array => self.random_container(descriptor, true),
            BuiltinKind::List => self.random_container(descriptor, false),
            BuiltinKind::BigInt => {
                let (lo, hi) = self.session.settings().big_int_bits;
                let bits = self.provider().from_range(i64::from(lo), i64::from(hi)) as u32;
                let value = Value::BigInt(self.provider().get_big_int(target, constraint, bits));
                Some(self.terminal(target, value))
            }
            BuiltinKind::Number => {
                let value = Value::Double(self.provider().get_double(target, constraint));
                Some(self.terminal(target, value))
            }
            BuiltinKind::Other => {
                let variants = self.introspector().enum_variants(descriptor.base());
                match variants {
                    Some(variants) if !variants.is_empty() => {
                        let idx = self.provider().get_enum(target, constraint, &variants);
                        let variant = variants[idx.min(variants.len() - 1)].clone();
                        let value = Value::Enum {
                            type_name: descriptor.base().as_str().to_string(),
                            variant,
                        };
                        Some(self.terminal(target, value))
                    }
                    _ => self.check_classes(descriptor, target),
                }
            }
        }
    }

    fn primitive(&mut self, primitive: Primitive, target: &Target, constraint: &Constraint) -> Value {
        let provider = self.provider();
        let value = match primitive {
            Primitive::Int => Value::Int(provider.get_int(target, constraint)),
            Primitive::Long => Value::Long(provider.get_long(target, constraint)),
            Primitive::Char => Value::Char(provider.get_char(target, constraint)),
            Primitive::Float => Value::Float(provider.get_float(target, constraint)),
            Primitive::Double => Value::Double(provider.get_double(target, constraint)),
            Primitive::Bool => Value::Bool(provider.get_bool(target, constraint)),
            Primitive::Byte => Value::Byte(provider.get_byte(target, constraint)),
            Primitive::Short => Value::Short(provider.get_short(target, constraint)),
            Primitive::Text => Value::Text(provider.get_string(target, constraint)),
        };
        self.terminal(target, value)
    }

    fn terminal(&mut self, target: &Target, value: Value) -> Value {
        self.session.record(Choice::value(target.clone(), value.clone()));
        value
    }

    /// Arrays and lists. Any element that cannot be built abandons the whole container.
    fn random_container(&mut self, descriptor: &TypeDescriptor, array: bool) -> Option<Value> {
        let (lo, hi) = self.session.settings().container_length;
        let length = self.provider().from_range(lo as i64, hi as i64).max(0) as usize;
        let element = descriptor.element();

        let mut items = Vec::with_capacity(length);
        for i in 0..length {
            match self.child().dispatch(element.clone(), false) {
                Some(item) => items.push(item),
                None => {
                    self.note(format!(
                        "element {} of {} could not be built, abandoning container",
                        i, descriptor
                    ));
                    return None;
                }
            }
        }
        Some(if array {
            Value::Array(items)
        } else {
            Value::List(items)
        })
    }

    fn check_classes(&mut self, descriptor: &TypeDescriptor, target: &Target) -> Option<Value> {
        let chain: Arc<StrategyChain> = self.session.strategies();
        for finder in chain.iter() {
            match finder.find_instance(descriptor, self) {
                Ok(Some(value)) => {
                    self.note(format!("{} built {}", finder.name(), descriptor));
                    return Some(value);
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!("{} declined {}: {}", finder.name(), target, err);
                    self.note(format!("{} failed: {}", finder.name(), err));
                }
            }
        }
        log::info!("no strategy could build {}", target);
        self.note("Could not find a way to get an instance of this class.");
        None
    }
}
