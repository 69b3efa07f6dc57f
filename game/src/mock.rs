//! Test doubles and fixtures for the session tracker.

use std::sync::{Arc, Mutex};

use pfpb_battle::{CardAttributes, Rarity};

use crate::participant::{Participant, ScopeId};
use crate::session::{BattleReport, Notifier, Presenter, SessionConfig, SessionTracker};

/// Presenter that keeps every report it is handed.
#[derive(Default)]
pub struct RecordingPresenter {
    pub reports: Mutex<Vec<BattleReport>>,
}

impl Presenter for RecordingPresenter {
    type Handle = usize;

    fn present(&self, report: &BattleReport) -> usize {
        let mut reports = self.reports.lock().unwrap();
        reports.push(report.clone());
        reports.len()
    }
}

/// Notifier that keeps every message per scope.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(ScopeId, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, scope: ScopeId, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((scope, message.to_string()));
    }
}

pub struct Harness {
    pub tracker: Arc<SessionTracker<Arc<RecordingPresenter>, Arc<RecordingNotifier>>>,
    pub presenter: Arc<RecordingPresenter>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn reports(&self) -> Vec<BattleReport> {
        self.presenter.reports.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(ScopeId, String)> {
        self.notifier.messages.lock().unwrap().clone()
    }
}

pub fn harness(config: SessionConfig) -> Harness {
    let presenter = Arc::new(RecordingPresenter::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let tracker = Arc::new(SessionTracker::new(
        config,
        Arc::clone(&presenter),
        Arc::clone(&notifier),
    ));
    Harness {
        tracker,
        presenter,
        notifier,
    }
}

pub fn alice() -> Participant {
    Participant::new(1, "alice")
}

pub fn bob() -> Participant {
    Participant::new(2, "bob")
}

pub fn carol() -> Participant {
    Participant::new(3, "carol")
}

pub fn strong_card() -> CardAttributes {
    CardAttributes::new(100, 80, Rarity::Rare, 500).unwrap()
}

pub fn weak_card() -> CardAttributes {
    CardAttributes::new(70, 50, Rarity::Common, 1500).unwrap()
}
