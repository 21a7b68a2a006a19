//! Terminal stand-ins for the audio and notification services.

use pomofocus_core::timer::Mode;
use pomofocus_core::{AudioGateway, GatewayError, NotificationGateway, NotificationHandle};

/// Alarm is the terminal bell. There is no ambient playback.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAudio;

impl AudioGateway for TerminalAudio {
    fn play_ambient(&mut self, sound_id: &str, _volume: f32) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable {
            gateway: "audio",
            message: format!("cannot play '{sound_id}' in a terminal"),
        })
    }

    fn stop_ambient(&mut self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), GatewayError> {
        Ok(())
    }

    fn play_alarm(&mut self, sound_id: &str) -> Result<(), GatewayError> {
        tracing::debug!(sound_id, "alarm");
        eprint!("\x07");
        Ok(())
    }
}

/// Completion notices are printed to stderr when they happen; nothing is
/// scheduled with the OS.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    next_id: u64,
}

impl NotificationGateway for TerminalNotifier {
    fn schedule_completion(
        &mut self,
        mode: Mode,
        delay_secs: u32,
    ) -> Result<NotificationHandle, GatewayError> {
        self.next_id += 1;
        let handle = NotificationHandle(format!("terminal-{}", self.next_id));
        tracing::debug!(%mode, delay_secs, handle = %handle.0, "completion notice armed");
        Ok(handle)
    }

    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), GatewayError> {
        tracing::debug!(handle = %handle.0, "completion notice cancelled");
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn send_immediate(&mut self, title: &str, body: &str) -> Result<(), GatewayError> {
        eprintln!("\n{title}: {body}");
        Ok(())
    }
}
