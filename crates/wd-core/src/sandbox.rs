//! Fault boundary around project-supplied code.
//!
//! Custom container layouts are user code. A failure there must never
//! take the designer down, so every call into it goes through [`isolate`],
//! which turns both returned errors and panics into a [`LayoutFault`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutFault {
    #[error("layout of `{class}` failed: {message}")]
    Failed { class: String, message: String },

    #[error("layout of `{class}` panicked: {message}")]
    Panicked { class: String, message: String },
}

impl LayoutFault {
    pub fn class(&self) -> &str {
        match self {
            LayoutFault::Failed { class, .. } | LayoutFault::Panicked { class, .. } => class,
        }
    }
}

/// Run `f`, converting a panic into [`LayoutFault::Panicked`].
pub fn isolate<T>(
    class: &str,
    f: impl FnOnce() -> Result<T, LayoutFault>,
) -> Result<T, LayoutFault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("sandboxed layout of `{class}` panicked: {message}");
            Err(LayoutFault::Panicked {
                class: class.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
