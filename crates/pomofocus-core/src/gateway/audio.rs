use crate::error::GatewayError;

/// Ambient loop and alarm playback.
pub trait AudioGateway: Send {
    /// Start (or restart) the ambient loop. An `Err` means nothing is playing.
    fn play_ambient(&mut self, sound_id: &str, volume: f32) -> Result<(), GatewayError>;

    /// Stop the ambient loop. Safe to call when nothing is playing.
    fn stop_ambient(&mut self) -> Result<(), GatewayError>;

    fn set_volume(&mut self, volume: f32) -> Result<(), GatewayError>;

    /// One-shot alarm.
    fn play_alarm(&mut self, sound_id: &str) -> Result<(), GatewayError>;
}
