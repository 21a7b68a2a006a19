//! Built-in sounds and accent colours, with their premium flags.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sound {
    pub id: &'static str,
    pub name: &'static str,
    pub premium: bool,
}

pub const ALARM_SOUNDS: &[Sound] = &[
    Sound { id: "bell", name: "Bell", premium: false },
    Sound { id: "chime", name: "Chime", premium: false },
    Sound { id: "digital", name: "Digital", premium: false },
    Sound { id: "gong", name: "Temple Gong", premium: true },
    Sound { id: "birdsong", name: "Birdsong", premium: true },
];

pub const AMBIENT_SOUNDS: &[Sound] = &[
    Sound { id: "rain", name: "Rain", premium: false },
    Sound { id: "cafe", name: "Cafe", premium: false },
    Sound { id: "white_noise", name: "White Noise", premium: false },
    Sound { id: "forest", name: "Forest", premium: true },
    Sound { id: "ocean", name: "Ocean Waves", premium: true },
    Sound { id: "fireplace", name: "Fireplace", premium: true },
];

/// Accent colours available without premium. Anything else is custom.
pub const ACCENT_PALETTE: &[&str] = &["#e74c3c", "#3498db", "#2ecc71", "#9b59b6", "#f39c12"];

pub fn alarm(id: &str) -> Option<&'static Sound> {
    ALARM_SOUNDS.iter().find(|s| s.id == id)
}

pub fn ambient(id: &str) -> Option<&'static Sound> {
    AMBIENT_SOUNDS.iter().find(|s| s.id == id)
}

pub fn is_palette_accent(color: &str) -> bool {
    ACCENT_PALETTE.iter().any(|c| c.eq_ignore_ascii_case(color))
}

/// `#rrggbb`
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
