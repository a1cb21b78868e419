use super::*;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode as AxumStatus},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    submissions: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

async fn spawn_endpoint(reply: AxumStatus) -> (Url, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route(
            "/nastavenia/vzhlad",
            post(
                move |State(state): State<Recorded>, headers: HeaderMap, Form(form): Form<ThemeForm>| async move {
                    let cookie = headers
                        .get("cookie")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    state
                        .submissions
                        .lock()
                        .expect("lock")
                        .push((form.theme, cookie));
                    let response: Response = if reply.is_redirection() {
                        Redirect::to("/nastavenia#vzhlad").into_response()
                    } else {
                        reply.into_response()
                    };
                    response
                },
            ),
        )
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    let url = Url::parse(&format!("http://{addr}/nastavenia/vzhlad")).expect("url");
    (url, recorded)
}

#[tokio::test]
async fn redirect_answer_counts_as_persisted() {
    let (url, recorded) = spawn_endpoint(AxumStatus::SEE_OTHER).await;
    let persistence = HttpThemePersistence::new(url, Duration::from_secs(5))
        .expect("client")
        .with_session_cookie("session=abc");

    persistence.submit(Theme::Dark).await.expect("persisted");

    let submissions = recorded.submissions.lock().expect("lock").clone();
    assert_eq!(
        submissions,
        vec![("dark".to_string(), Some("session=abc".to_string()))]
    );
}

#[tokio::test]
async fn server_error_is_reported_as_status() {
    let (url, _recorded) = spawn_endpoint(AxumStatus::INTERNAL_SERVER_ERROR).await;
    let persistence = HttpThemePersistence::new(url, Duration::from_secs(5)).expect("client");

    let err = persistence.submit(Theme::Blue).await.expect_err("should fail");
    assert_eq!(err, PersistError::Status(500));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/nastavenia/vzhlad")).expect("url");
    let persistence = HttpThemePersistence::new(url, Duration::from_secs(2)).expect("client");

    let err = persistence.submit(Theme::Red).await.expect_err("should fail");
    assert!(matches!(err, PersistError::Transport(_)));
}

#[test]
fn failure_text_depends_on_cause() {
    assert!(describe_persist_failure(&PersistError::Status(401)).contains("sign in"));
    assert!(describe_persist_failure(&PersistError::Status(503)).contains("server"));
    assert!(
        describe_persist_failure(&PersistError::Transport("refused".into()))
            .contains("connection")
    );
}
