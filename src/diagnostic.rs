//! Recoverable-error and warning bookkeeping (§7 kinds 2 and 3).
//!
//! Fatal errors abort processing and surface as `Err(Error)`. Everything else — a malformed
//! method list that still leaves a class usable, a repaired section offset, a demangle
//! fallback — is recorded here instead, attached to the entity it describes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub component: &'static str,
    pub message: String,
    pub address: Option<u64>,
}

impl Diagnostic {
    pub fn recoverable(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Recoverable,
            component,
            message: message.into(),
            address: None,
        }
    }

    pub fn warning(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            component,
            message: message.into(),
            address: None,
        }
    }

    pub fn at(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(addr) => write!(f, "[{}] {} (0x{:x})", self.component, self.message, addr),
            None => write!(f, "[{}] {}", self.component, self.message),
        }
    }
}

/// A thread-safe append-only collector, shared by reference during a parallel load pass.
#[derive(Debug, Default)]
pub struct Diagnostics(std::sync::Mutex<Vec<Diagnostic>>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Recoverable => log::warn!("{diagnostic}"),
            Severity::Warning => log::debug!("{diagnostic}"),
        }
        self.0.lock().unwrap().push(diagnostic);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0.into_inner().unwrap()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.0.lock().unwrap().clone()
    }
}
