//! Runtime value representation for the Tarn engine.
//!
//! Values are what live on the operand stack, in stash slots and in scope
//! bindings. Heap payloads sit behind `Rc`, so cloning a value shares it and
//! dropping the last clone releases it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ErrorCode;
use crate::exception::{Exception, Fallible};
use crate::name::Name;
use crate::native::SeqIter;
use crate::object::{Args, Kwargs, Object};

/// A dynamically typed runtime datum.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// A dotted path, e.g. an import or attribute name.
    Name(Name),
    /// Shared, mutable list.
    List(Rc<RefCell<Vec<Value>>>),
    Exception(Exception),
    /// Anything behind the capability trait: scopes, functions, iterators,
    /// context handlers.
    Object(Rc<dyn Object>),
}

impl Value {
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn object<T: Object + 'static>(object: T) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn exception(code: ErrorCode, message: impl Into<String>) -> Self {
        Value::Exception(Exception::new(code, message))
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Name(_) => "name",
            Value::List(_) => "list",
            Value::Exception(_) => "exception",
            Value::Object(o) => o.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Value::Exception(_))
    }

    /// Error code of an exception value.
    pub fn code(&self) -> Option<ErrorCode> {
        self.as_exception().map(Exception::code)
    }

    pub fn as_exception(&self) -> Option<&Exception> {
        match self {
            Value::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// Cast to boolean. `None` when the value has no truth value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Null => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(s) => Some(!s.is_empty()),
            Value::Name(n) => Some(!n.is_empty()),
            Value::List(items) => Some(!items.borrow().is_empty()),
            Value::Exception(_) => None,
            Value::Object(o) => o.as_bool(),
        }
    }

    /// Cast to integer. Floats must be integral; strings must parse.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Resolve one path segment on this value. `Ok(None)` means not found.
    pub fn resolve(&self, name: &str) -> Fallible<Option<Value>> {
        match self {
            Value::Object(o) => o.resolve(name),
            Value::List(items) => {
                let items = items.borrow();
                Ok(list_index(name, items.len()).map(|ix| items[ix].clone()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                Ok(list_index(name, chars.len()).map(|ix| Value::str(&chars[ix].to_string())))
            }
            Value::Exception(e) => Ok(match name {
                "code" => Some(Value::str(e.code().name())),
                "message" => Some(Value::str(e.message())),
                "payload" => Some(e.payload().cloned().unwrap_or_default()),
                _ => None,
            }),
            _ => Ok(None),
        }
    }

    /// Assign one path segment on this value. `None` when the value exposes
    /// no setter.
    pub fn assign(&self, name: &str, value: Value) -> Option<Fallible<()>> {
        match self {
            Value::Object(o) => o.assign(name, value),
            Value::List(items) => {
                let mut items = items.borrow_mut();
                Some(match list_index(name, items.len()) {
                    Some(ix) => {
                        items[ix] = value;
                        Ok(())
                    }
                    None => Err(Exception::new(
                        ErrorCode::Name,
                        format!("list index '{name}' out of range"),
                    )),
                })
            }
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Object(o) if o.is_callable())
    }

    pub fn call(&self, args: Args, kwargs: Kwargs) -> Fallible {
        match self {
            Value::Object(o) if o.is_callable() => o.call(args, kwargs),
            other => Err(Exception::new(
                ErrorCode::NotCallable,
                format!("Atom '{other}' is not callable"),
            )),
        }
    }

    /// Bind a callable to a receiver. `None` when binding is not supported.
    pub fn bind(&self, receiver: &Value) -> Option<Value> {
        match self {
            Value::Object(o) => o.bind(receiver),
            _ => None,
        }
    }

    /// Obtain an iterator. Iterators iterate as themselves.
    pub fn iterate(&self) -> Fallible {
        match self {
            Value::List(items) => Ok(Value::object(SeqIter::over_list(items.clone()))),
            Value::Str(s) => Ok(Value::object(SeqIter::over(
                s.chars().map(|c| Value::str(&c.to_string())).collect(),
            ))),
            Value::Object(o) if o.is_iterator() => Ok(self.clone()),
            Value::Object(o) => o.iter().unwrap_or_else(|| Err(not_iterable(self))),
            other => Err(not_iterable(other)),
        }
    }

    /// Advance an iterator value.
    pub fn next(&self) -> Fallible {
        match self {
            Value::Object(o) => o.next(),
            other => Err(Exception::new(
                ErrorCode::Type,
                format!("{} '{}' is not an iterator", other.type_name(), other),
            )),
        }
    }

    /// Run the context handler's enter hook, if it has one.
    pub fn enter(&self) -> Option<Fallible> {
        match self {
            Value::Object(o) => o.enter(),
            _ => None,
        }
    }

    /// Run the context handler's leave hook, if it has one.
    pub fn leave(&self, param: Value) -> Option<Fallible> {
        match self {
            Value::Object(o) => o.leave(param),
            _ => None,
        }
    }
}

fn not_iterable(value: &Value) -> Exception {
    Exception::new(
        ErrorCode::Type,
        format!("{} '{}' is not iterable", value.type_name(), value),
    )
}

/// Interpret a subscript as a list position. Negative indices count from
/// the end.
fn list_index(subscript: &str, len: usize) -> Option<usize> {
    let ix: i64 = subscript.trim().parse().ok()?;
    let ix = if ix < 0 { len as i64 + ix } else { ix };
    (0..len as i64).contains(&ix).then_some(ix as usize)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<Exception> for Value {
    fn from(e: Exception) -> Self {
        Value::Exception(e)
    }
}

type ListCell = Rc<RefCell<Vec<Value>>>;

thread_local! {
    /// Lists currently being displayed or compared on this thread.
    static VISITING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a list as being walked for as long as it lives. A list can hold
/// itself, so walks stop where they meet a list already on the path.
struct Visit(usize);

impl Visit {
    /// `None` when `list` is already being walked.
    fn enter(list: &ListCell) -> Option<Visit> {
        let key = Rc::as_ptr(list) as usize;
        VISITING.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if visiting.contains(&key) {
                None
            } else {
                visiting.push(key);
                Some(Visit(key))
            }
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        VISITING.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if let Some(pos) = visiting.iter().rposition(|k| *k == self.0) {
                visiting.remove(pos);
            }
        });
    }
}

fn lists_equal(a: &ListCell, b: &ListCell) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    // Meeting `a` again means the comparison has come round a cycle with
    // no difference found so far.
    let Some(_visit) = Visit::enter(a) else {
        return true;
    };
    *a.borrow() == *b.borrow()
}

// Floats compare bitwise, so Value stays usable as a key and NaN equals
// itself. Objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::List(a), Value::List(b)) => lists_equal(a, b),
            (Value::Exception(a), Value::Exception(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::Name(n) => write!(f, "{n}"),
            Value::List(items) => {
                let Some(_visit) = Visit::enter(items) else {
                    return f.write_str("[...]");
                };
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Exception(e) => write!(f, "{e}"),
            Value::Object(o) => f.write_str(&o.describe()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x:?})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Name(n) => write!(f, "Name({n})"),
            Value::List(items) => match Visit::enter(items) {
                Some(_visit) => f.debug_tuple("List").field(&*items.borrow()).finish(),
                None => f.write_str("List([...])"),
            },
            Value::Exception(e) => write!(f, "Exception({e})"),
            Value::Object(o) => write!(f, "Object({})", o.describe()),
        }
    }
}
