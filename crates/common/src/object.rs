//! The capability trait implemented by every non-primitive runtime value.
//!
//! The engine never asks what an object *is*, only what it can do. Each
//! capability has a default meaning "not supported", and the dispatcher
//! turns a missing capability into the matching language error
//! (`NameError`, `NotAssignableError`, `NotCallableError`, ...).

use indexmap::IndexMap;

use crate::error::ErrorCode;
use crate::exception::{Exception, Fallible};
use crate::value::Value;

/// Positional call arguments, in left-to-right order.
pub type Args = Vec<Value>;

/// Keyword call arguments, in the order their names appear at the call site.
pub type Kwargs = IndexMap<String, Value>;

/// Host capability contract for scopes, callables, iterators and context
/// handlers.
pub trait Object {
    /// Short type name used in messages and listings.
    fn type_name(&self) -> &str;

    /// Display text. Defaults to `<type_name>`.
    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }

    /// Truth value for `Test`. `None` means the object cannot be cast.
    fn as_bool(&self) -> Option<bool> {
        None
    }

    /// Look up one path segment. `Ok(None)` means "no such name".
    fn resolve(&self, _name: &str) -> Fallible<Option<Value>> {
        Ok(None)
    }

    /// Set one path segment. `None` means the object exposes no setter.
    fn assign(&self, _name: &str, _value: Value) -> Option<Fallible<()>> {
        None
    }

    fn is_callable(&self) -> bool {
        false
    }

    fn call(&self, _args: Args, _kwargs: Kwargs) -> Fallible {
        Err(Exception::new(
            ErrorCode::NotCallable,
            format!("{} is not callable", self.describe()),
        ))
    }

    /// Produce a copy of this callable bound to `receiver` (its `self`).
    fn bind(&self, _receiver: &Value) -> Option<Value> {
        None
    }

    /// Produce an iterator over this object.
    fn iter(&self) -> Option<Fallible> {
        None
    }

    /// Iterators return themselves from `Iter`.
    fn is_iterator(&self) -> bool {
        false
    }

    /// Advance an iterator. Exhaustion is an `Exhausted`-coded exception.
    fn next(&self) -> Fallible {
        Err(Exception::new(
            ErrorCode::Type,
            format!("{} is not an iterator", self.describe()),
        ))
    }

    /// Context handler hook run by `EnterContext`.
    fn enter(&self) -> Option<Fallible> {
        None
    }

    /// Context handler hook run by `LeaveContext`. `param` is the propagating
    /// exception, or `false` when the block is left normally.
    fn leave(&self, _param: Value) -> Option<Fallible> {
        None
    }
}
