//! Domain types and models

pub mod alarm;
pub mod dose;
pub mod medication;
pub mod timer;

pub use alarm::{AlarmSchedule, TimeOfDay};
pub use dose::{DoseHistory, DoseStatus, NewDoseRecord};
pub use medication::{Medication, NewMedication};
pub use timer::{FirePayload, TimerKey};
