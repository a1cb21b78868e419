use super::*;
use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use shared::domain::Theme;

struct ScriptedPersistence {
    fail_on: Option<Theme>,
    submitted: Mutex<Vec<Theme>>,
}

#[async_trait]
impl ThemePersistence for ScriptedPersistence {
    async fn submit(&self, theme: Theme) -> Result<(), PersistError> {
        self.submitted.lock().expect("lock").push(theme);
        if self.fail_on == Some(theme) {
            return Err(PersistError::Status(502));
        }
        Ok(())
    }
}

fn collect_outcomes(link: &BackendLink, expected: usize) -> Vec<UiEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut outcomes = Vec::new();
    while outcomes.len() < expected && Instant::now() < deadline {
        if let Ok(event) = link.events().recv_timeout(Duration::from_millis(50)) {
            if !matches!(event, UiEvent::Info(_)) {
                outcomes.push(event);
            }
        }
    }
    outcomes
}

#[test]
fn worker_reports_each_submission_outcome() {
    let persistence = Arc::new(ScriptedPersistence {
        fail_on: Some(Theme::Red),
        submitted: Mutex::new(Vec::new()),
    });
    let link = launch(persistence.clone(), 8);

    let dark = PersistRequest { theme: Theme::Dark, seq: 1 };
    let red = PersistRequest { theme: Theme::Red, seq: 2 };
    link.dispatch(BackendCommand::PersistTheme(dark)).expect("dispatch");
    link.dispatch(BackendCommand::PersistTheme(red)).expect("dispatch");

    let outcomes = collect_outcomes(&link, 2);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&UiEvent::ThemePersisted(dark)));
    assert!(outcomes.contains(&UiEvent::ThemePersistFailed {
        request: red,
        error: PersistError::Status(502),
    }));

    let mut submitted = persistence.submitted.lock().expect("lock").clone();
    submitted.sort_by_key(|theme| theme.as_str());
    assert_eq!(submitted, vec![Theme::Dark, Theme::Red]);
}

#[test]
fn full_queue_is_reported_as_unavailable() {
    let (cmd_tx, _cmd_rx) = bounded(1);
    let request = PersistRequest { theme: Theme::Blue, seq: 1 };

    dispatch_backend_command(&cmd_tx, BackendCommand::PersistTheme(request)).expect("first fits");
    let err = dispatch_backend_command(&cmd_tx, BackendCommand::PersistTheme(request))
        .expect_err("queue full");
    assert!(matches!(err, PersistError::Unavailable(_)));
}

#[test]
fn stopped_worker_is_reported_as_unavailable() {
    let (cmd_tx, cmd_rx) = bounded(4);
    drop(cmd_rx);
    let request = PersistRequest { theme: Theme::Blue, seq: 1 };

    let err = dispatch_backend_command(&cmd_tx, BackendCommand::PersistTheme(request))
        .expect_err("disconnected");
    assert_eq!(
        err,
        PersistError::Unavailable("persistence worker stopped".to_string())
    );
}
