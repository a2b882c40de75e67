//! Generators: suspended frames driven through the iterator protocol.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tarn_common::{ErrorCode, Exception, Fallible, Object, Value};
use tracing::debug;

use crate::machine::{Frame, Runtime};
use crate::signal::Completion;

/// The iterator returned by calling a generator function.
///
/// Each `next` resumes the frame until it yields (the yielded value is
/// returned), finishes (`Exhausted`), or raises (the exception propagates
/// and the generator is finished).
pub struct Generator {
    name: String,
    runtime: Rc<Runtime>,
    frame: RefCell<Option<Frame>>,
}

impl Generator {
    pub(crate) fn new(name: String, frame: Frame) -> Self {
        Self {
            name,
            runtime: Rc::clone(&frame.runtime),
            frame: RefCell::new(Some(frame)),
        }
    }

    fn exhausted(&self) -> Exception {
        Exception::new(
            ErrorCode::Exhausted,
            format!("Generator '{}' is exhausted", self.name),
        )
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Object for Generator {
    fn type_name(&self) -> &str {
        "generator"
    }

    fn describe(&self) -> String {
        format!("<generator {}>", self.name)
    }

    fn is_iterator(&self) -> bool {
        true
    }

    fn next(&self) -> Fallible {
        let Ok(mut slot) = self.frame.try_borrow_mut() else {
            return Err(Exception::new(
                ErrorCode::Runtime,
                format!("Generator '{}' is already running", self.name),
            ));
        };
        let Some(frame) = slot.as_mut() else {
            return Err(self.exhausted());
        };

        let _guard = self
            .runtime
            .enter_call()
            .map_err(|err| self.runtime.smuggle(err))?;
        debug!(generator = %self.name, pc = frame.pc(), "resume");
        match frame.run() {
            Ok(Completion::Yielded(value)) => Ok(value),
            Ok(Completion::Returned(_)) => {
                *slot = None;
                Err(self.exhausted())
            }
            Ok(Completion::Raised(exception)) => {
                *slot = None;
                Err(exception)
            }
            Err(err) => {
                *slot = None;
                Err(self.runtime.smuggle(err))
            }
        }
    }
}
