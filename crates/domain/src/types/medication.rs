//! Medication records

use serde::{Deserialize, Serialize};

use crate::{MedAlarmError, Result};

/// A stored medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: String,
    pub active: bool,
}

/// Input for creating a medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub notes: String,
}

impl NewMedication {
    pub fn new(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self { name: name.into(), dosage: dosage.into(), notes: String::new() }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Rejects blank names; the name is shown on every reminder.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MedAlarmError::InvalidInput("medication name must not be empty".into()));
        }
        Ok(())
    }
}
