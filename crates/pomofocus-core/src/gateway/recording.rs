//! Gateways that only record what they were asked to do.
//!
//! Useful headless (nothing to play, nothing to show) and for asserting on
//! side effects. Clones of a [`CallLog`] share one buffer, so the log can
//! be kept after the gateways are moved into a timer.

use std::sync::{Arc, Mutex};

use super::{AudioGateway, NotificationGateway, NotificationHandle};
use crate::error::GatewayError;
use crate::timer::Mode;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    PlayAmbient { sound_id: String, volume: f32 },
    StopAmbient,
    SetVolume(f32),
    PlayAlarm(String),
    Schedule {
        mode: Mode,
        delay_secs: u32,
        handle: NotificationHandle,
    },
    Cancel(NotificationHandle),
    CancelAll,
    SendImmediate { title: String, body: String },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<GatewayCall>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: GatewayCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.0.lock() {
            calls.clear();
        }
    }

    pub fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Scheduled notifications not yet cancelled.
    pub fn pending_notifications(&self) -> Vec<NotificationHandle> {
        let mut pending = Vec::new();
        for call in self.calls() {
            match call {
                GatewayCall::Schedule { handle, .. } => pending.push(handle),
                GatewayCall::Cancel(handle) => pending.retain(|h| *h != handle),
                GatewayCall::CancelAll => pending.clear(),
                _ => {}
            }
        }
        pending
    }

    /// Whether the last ambient request left a loop playing.
    pub fn ambient_playing(&self) -> bool {
        self.calls()
            .iter()
            .rev()
            .find_map(|c| match c {
                GatewayCall::PlayAmbient { .. } => Some(true),
                GatewayCall::StopAmbient => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    log: CallLog,
    fail_ambient: bool,
}

impl RecordingAudio {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_ambient: false,
        }
    }

    /// Ambient playback always fails (nothing is logged for the attempt).
    pub fn failing_ambient(log: CallLog) -> Self {
        Self {
            log,
            fail_ambient: true,
        }
    }
}

impl AudioGateway for RecordingAudio {
    fn play_ambient(&mut self, sound_id: &str, volume: f32) -> Result<(), GatewayError> {
        if self.fail_ambient {
            return Err(GatewayError::Unavailable {
                gateway: "audio",
                message: format!("cannot load '{sound_id}'"),
            });
        }
        self.log.push(GatewayCall::PlayAmbient {
            sound_id: sound_id.to_string(),
            volume,
        });
        Ok(())
    }

    fn stop_ambient(&mut self) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::StopAmbient);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::SetVolume(volume));
        Ok(())
    }

    fn play_alarm(&mut self, sound_id: &str) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::PlayAlarm(sound_id.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: CallLog,
    next_id: u64,
}

impl RecordingNotifier {
    pub fn new(log: CallLog) -> Self {
        Self { log, next_id: 0 }
    }
}

impl NotificationGateway for RecordingNotifier {
    fn schedule_completion(
        &mut self,
        mode: Mode,
        delay_secs: u32,
    ) -> Result<NotificationHandle, GatewayError> {
        self.next_id += 1;
        let handle = NotificationHandle(format!("n{}", self.next_id));
        self.log.push(GatewayCall::Schedule {
            mode,
            delay_secs,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::Cancel(handle.clone()));
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::CancelAll);
        Ok(())
    }

    fn send_immediate(&mut self, title: &str, body: &str) -> Result<(), GatewayError> {
        self.log.push(GatewayCall::SendImmediate {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
