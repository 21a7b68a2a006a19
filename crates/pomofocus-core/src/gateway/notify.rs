use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::timer::Mode;

/// Opaque id of a scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub String);

/// What the user tapped on a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    StartBreak,
    StartFocus,
    Dismiss,
}

/// Local notification scheduling.
pub trait NotificationGateway: Send {
    /// Schedule the "interval finished" notification `delay_secs` from now.
    fn schedule_completion(
        &mut self,
        mode: Mode,
        delay_secs: u32,
    ) -> Result<NotificationHandle, GatewayError>;

    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), GatewayError>;

    fn cancel_all(&mut self) -> Result<(), GatewayError>;

    fn send_immediate(&mut self, title: &str, body: &str) -> Result<(), GatewayError>;
}

/// Title and body announcing that `finished` is over.
pub fn completion_message(finished: Mode) -> (&'static str, &'static str) {
    match finished {
        Mode::Focus => ("Focus complete", "Nice work. Time for a break."),
        Mode::ShortBreak => ("Break over", "Ready for the next focus session?"),
        Mode::LongBreak => ("Long break over", "Recharged? Let's get back to it."),
    }
}
