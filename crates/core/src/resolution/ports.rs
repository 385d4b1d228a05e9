//! Port interface for the alarm presentation layer

use medalarm_domain::FirePayload;

/// Sound, vibration, notification and full-screen prompt of a firing alarm.
///
/// Both calls are synchronous and must not block on I/O. Teardown runs before
/// any persistence of the outcome.
pub trait AlarmPresenter: Send + Sync {
    fn present(&self, payload: &FirePayload);

    fn teardown(&self, payload: &FirePayload);
}
