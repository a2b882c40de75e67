//! Path resolution and the stock scope objects.
//!
//! Any [`Value`] can act as a scope: lookups go through its `resolve` and
//! `assign` capabilities, one path segment at a time.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::error::ErrorCode;
use crate::exception::{Exception, Fallible};
use crate::name::Name;
use crate::object::Object;
use crate::value::Value;

/// Resolve a dotted path: the first segment against `scope`, each later
/// segment against the previous result.
pub fn resolve_path(scope: &Value, path: &Name) -> Fallible {
    let mut segments = path.segments().iter();
    let Some(first) = segments.next() else {
        return Err(Exception::new(ErrorCode::Name, "Cannot resolve an empty name"));
    };
    let mut current = scope
        .resolve(first)?
        .ok_or_else(|| Exception::new(ErrorCode::Name, format!("Name '{first}' is not defined")))?;
    let mut prefix = first.clone();
    for segment in segments {
        current = current.resolve(segment)?.ok_or_else(|| {
            Exception::new(
                ErrorCode::Name,
                format!("'{prefix}' has no attribute '{segment}'"),
            )
        })?;
        prefix.push('.');
        prefix.push_str(segment);
    }
    Ok(current)
}

/// Assign through a dotted path: resolve all but the last segment to a
/// container, then set the last segment on it.
pub fn assign_path(scope: &Value, path: &Name, value: Value) -> Fallible<()> {
    let Some((init, last)) = path.split_last() else {
        return Err(Exception::new(ErrorCode::Name, "Cannot assign to an empty name"));
    };
    let container = if init.is_empty() {
        scope.clone()
    } else {
        resolve_path(scope, &init)?
    };
    container.assign(last, value).unwrap_or_else(|| {
        Err(Exception::new(
            ErrorCode::NotAssignable,
            format!("Cannot assign to '{path}': {} has no setter", container.type_name()),
        ))
    })
}

/// A named, mutable variable dictionary with an optional parent consulted
/// on lookup misses. Module namespaces and the builtins table are
/// namespaces.
#[derive(Debug)]
pub struct Namespace {
    name: String,
    vars: RefCell<IndexMap<String, Value>>,
    parent: Option<Value>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: RefCell::new(IndexMap::new()),
            parent: None,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent: Value) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `key` in this namespace, replacing any previous binding.
    pub fn define(&self, key: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(key.into(), value);
    }

    /// Builder-style [`define`](Self::define).
    pub fn with(self, key: impl Into<String>, value: Value) -> Self {
        self.define(key, value);
        self
    }

    /// Own binding of `key`; the parent is not consulted.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.vars.borrow().get(key).cloned()
    }

    /// Bound names, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.vars.borrow().keys().cloned().collect()
    }
}

impl Object for Namespace {
    fn type_name(&self) -> &str {
        "namespace"
    }

    fn describe(&self) -> String {
        format!("<namespace {}>", self.name)
    }

    fn resolve(&self, name: &str) -> Fallible<Option<Value>> {
        if let Some(value) = self.get(name) {
            return Ok(Some(value));
        }
        match &self.parent {
            Some(parent) => parent.resolve(name),
            None => Ok(None),
        }
    }

    fn assign(&self, name: &str, value: Value) -> Option<Fallible<()>> {
        self.define(name, value);
        Some(Ok(()))
    }
}

/// An object with mutable attributes and a class name.
#[derive(Debug)]
pub struct Instance {
    class: String,
    attrs: RefCell<IndexMap<String, Value>>,
}

impl Instance {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: RefCell::new(IndexMap::new()),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.attrs.borrow_mut().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.attrs.borrow().get(key).cloned()
    }
}

impl Object for Instance {
    fn type_name(&self) -> &str {
        &self.class
    }

    fn describe(&self) -> String {
        format!("<{} instance>", self.class)
    }

    fn as_bool(&self) -> Option<bool> {
        Some(true)
    }

    fn resolve(&self, name: &str) -> Fallible<Option<Value>> {
        Ok(self.get(name))
    }

    fn assign(&self, name: &str, value: Value) -> Option<Fallible<()>> {
        self.set(name, value);
        Some(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Value {
        let point = Instance::new("Point");
        point.set("x", Value::Int(1));
        let inner = Namespace::new("inner").with("point", Value::object(point));
        Value::object(
            Namespace::new("main")
                .with("inner", Value::object(inner))
                .with("n", Value::Int(3)),
        )
    }

    #[test]
    fn resolves_single_segment() {
        assert_eq!(resolve_path(&module(), &Name::parse("n")), Ok(Value::Int(3)));
    }

    #[test]
    fn resolves_dotted_path() {
        assert_eq!(
            resolve_path(&module(), &Name::parse("inner.point.x")),
            Ok(Value::Int(1))
        );
    }

    #[test]
    fn unresolved_first_segment_is_name_error() {
        let err = resolve_path(&module(), &Name::parse("missing")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Name);
        assert_eq!(err.message(), "Name 'missing' is not defined");
    }

    #[test]
    fn unresolved_later_segment_names_the_prefix() {
        let err = resolve_path(&module(), &Name::parse("inner.point.y")).unwrap_err();
        assert_eq!(err.message(), "'inner.point' has no attribute 'y'");
    }

    #[test]
    fn empty_path_is_name_error() {
        let err = resolve_path(&module(), &Name::empty()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Name);
        let err = assign_path(&module(), &Name::empty(), Value::Null).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Name);
    }

    #[test]
    fn assign_through_path() {
        let scope = module();
        assign_path(&scope, &Name::parse("inner.point.y"), Value::Int(7)).unwrap();
        assert_eq!(
            resolve_path(&scope, &Name::parse("inner.point.y")),
            Ok(Value::Int(7))
        );
    }

    #[test]
    fn assign_into_primitive_is_not_assignable() {
        let err = assign_path(&module(), &Name::parse("n.bits"), Value::Int(0)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAssignable);
    }

    #[test]
    fn assign_through_missing_intermediate_is_name_error() {
        let err = assign_path(&module(), &Name::parse("nope.x"), Value::Int(0)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Name);
    }

    #[test]
    fn namespace_falls_back_to_parent() {
        let builtins = Value::object(Namespace::new("builtins").with("len", Value::Int(0)));
        let module = Namespace::with_parent("main", builtins);
        assert_eq!(module.resolve("len"), Ok(Some(Value::Int(0))));
        assert_eq!(module.get("len"), None);
        assert_eq!(module.resolve("other"), Ok(None));
    }

    #[test]
    fn namespace_keeps_definition_order() {
        let ns = Namespace::new("m").with("b", Value::Null).with("a", Value::Null);
        assert_eq!(ns.names(), vec!["b".to_string(), "a".to_string()]);
    }
}
