//! # Pomofocus Core Library
//!
//! Core logic for the Pomofocus timer: a Pomodoro state machine, the
//! recorder that turns completed focus intervals into session history and
//! task progress, and the analytics views computed over that history.
//!
//! The library is front-end agnostic. Platform services (audio, local
//! notifications, in-app purchase) are injected as gateway traits, and all
//! state lives in a [`KeyValueStore`] holding JSON records.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-anchored state machine that requires the
//!   caller to invoke `tick()` once a second while running
//! - **Recorder**: Completion delegate that appends [`FocusSession`]s and
//!   credits the selected [`Task`]
//! - **Stats**: Pure functions over the session log (daily totals, category
//!   totals, heatmap, streaks)
//! - **Storage**: SQLite-backed key-value records and TOML process config
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionRecorder`]: Session and task bookkeeping
//! - [`TaskBook`]: Active and archived tasks
//! - [`Settings`]: User preferences with clamping and premium checks

pub mod error;
pub mod events;
pub mod gateway;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{
    ConfigError, CoreError, GatewayError, PurchaseError, Result, StorageError, ValidationError,
};
pub use events::Event;
pub use gateway::{
    AudioGateway, Entitlement, EntitlementGateway, MockEntitlementGateway, NotificationAction,
    NotificationGateway, NotificationHandle,
};
pub use session::{FocusSession, RecordedPomodoro, SessionRecorder};
pub use settings::{Settings, ThemeMode, TimerSettings};
pub use storage::{AppConfig, KeyValueStore, MemoryStore, SqliteStore};
pub use task::{NewTask, Task, TaskBook, TaskPatch, TaskProgress};
pub use timer::{
    Clock, Gateways, ManualClock, Mode, PomodoroCompleted, RestoreOutcome, SystemClock,
    TimerEngine, TimerSnapshot,
};
