//! Session
//!
//! Who, if anyone, is logged in. Checkout needs a patient; the cart itself
//! does not care.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Wrap a patient identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers whether a patient is currently logged in.
pub trait SessionGate {
    /// The logged-in patient, if any.
    fn current_patient(&self) -> Option<&PatientId>;

    /// Whether anyone is logged in.
    fn is_authenticated(&self) -> bool {
        self.current_patient().is_some()
    }
}

/// A session fixed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSession {
    patient: Option<PatientId>,
}

impl StaticSession {
    /// Nobody logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// `patient` logged in.
    pub fn logged_in(patient: PatientId) -> Self {
        Self {
            patient: Some(patient),
        }
    }
}

impl From<Option<PatientId>> for StaticSession {
    fn from(patient: Option<PatientId>) -> Self {
        Self { patient }
    }
}

impl SessionGate for StaticSession {
    fn current_patient(&self) -> Option<&PatientId> {
        self.patient.as_ref()
    }
}
