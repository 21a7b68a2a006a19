//! Wiring shared by every command: store, clock, gateways.

use std::error::Error;
use std::sync::Arc;

use pomofocus_core::storage::{keys, save_json};
use pomofocus_core::{
    AppConfig, Clock, EntitlementGateway, Gateways, KeyValueStore, MockEntitlementGateway,
    RestoreOutcome, SessionRecorder, Settings, SqliteStore, SystemClock, TimerEngine,
};

use crate::gateways::{TerminalAudio, TerminalNotifier};

pub struct App {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

impl App {
    pub fn open(config: &AppConfig) -> Result<Self, Box<dyn Error>> {
        let path = config.database_path()?;
        let store = SqliteStore::open_at(&path)?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self {
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
        })
    }

    /// Stored settings, with the premium flag brought in line with the
    /// current entitlement.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::load(self.store.as_ref());
        match self.entitlements().entitlement() {
            Ok(entitlement) => {
                let before = settings.clone();
                settings.sync_entitlement(&entitlement);
                if settings != before {
                    save_json(self.store.as_ref(), keys::SETTINGS, &settings);
                }
            }
            Err(e) => tracing::warn!(error = %e, "entitlement check failed"),
        }
        settings
    }

    /// Purchase flow whose changes are mirrored into the stored settings.
    pub fn entitlements(&self) -> MockEntitlementGateway {
        let gateway = MockEntitlementGateway::new(self.store.clone(), self.clock.clone());
        let store = self.store.clone();
        gateway.subscribe(Box::new(move |entitlement| {
            let mut settings = Settings::load(store.as_ref());
            settings.sync_entitlement(entitlement);
            save_json(store.as_ref(), keys::SETTINGS, &settings);
        }));
        gateway
    }

    /// Engine restored from the last snapshot, recorder attached. A
    /// countdown running in another process is paused.
    pub fn engine(&self) -> (TimerEngine, RestoreOutcome) {
        let mut engine = self.new_engine();
        let outcome = engine.restore();
        report(&outcome);
        (engine, outcome)
    }

    /// Engine that leaves a countdown running in another process alone.
    pub fn observed_engine(&self) -> (TimerEngine, RestoreOutcome) {
        let mut engine = self.new_engine();
        let outcome = engine.observe();
        report(&outcome);
        (engine, outcome)
    }

    fn new_engine(&self) -> TimerEngine {
        let mut engine = TimerEngine::new(
            self.settings().timer(),
            Gateways::new(TerminalAudio, TerminalNotifier::default()),
            self.store.clone(),
            self.clock.clone(),
        );
        SessionRecorder::new(self.store.clone(), self.clock.clone()).register(&mut engine);
        engine
    }
}

fn report(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::ExpiredWhileSuspended { .. } => {
            eprintln!("note: the last interval finished while pomofocus was not running");
        }
        RestoreOutcome::Corrected { elapsed_secs } => {
            eprintln!("note: timer paused after {elapsed_secs}s; run `pomofocus timer start` to continue");
        }
        RestoreOutcome::Fresh | RestoreOutcome::Restored | RestoreOutcome::Live { .. } => {}
    }
}
