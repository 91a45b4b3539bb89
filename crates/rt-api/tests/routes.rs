//! End-to-end tests that drive the router the way a browser would,
//! carrying cookies from one response into the next request.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rt_api::{router, AppState, FlashKey};
use rt_auth_file::FileCredentialStore;
use rt_core::error::AppError;
use rt_core::models::{Alert, AlertKind, Message, NewMessage};
use rt_core::traits::{MessageStore, MockMessageStore};
use rt_store_memory::MemoryMessageStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORDS: &str = r#"{"jessie": "frog", "james": "potato", "cassidy": "dog"}"#;
const BOGUS_ID: &str = "b58cba44-da39-11e5-9342-56f85ff10656";

struct TestClient {
    app: Router,
    store: Arc<dyn MessageStore>,
    key: FlashKey,
    cookies: BTreeMap<String, String>,
    _dir: TempDir,
}

impl TestClient {
    fn new() -> Self {
        Self::build(Arc::new(MemoryMessageStore::new()), PASSWORDS)
    }

    fn with_store(store: MockMessageStore) -> Self {
        Self::build(Arc::new(store), PASSWORDS)
    }

    fn build(store: Arc<dyn MessageStore>, passwords_json: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let passwords = dir.path().join("passwords.json");
        std::fs::write(&passwords, passwords_json).unwrap();

        let key = FlashKey::new(b"test-secret").unwrap();
        let state = AppState {
            store: store.clone(),
            credentials: Arc::new(FileCredentialStore::new(passwords)),
            flash_key: key.clone(),
        };
        let app = router(state, dir.path().join("assets"));
        Self {
            app,
            store,
            key,
            cookies: BTreeMap::new(),
            _dir: dir,
        }
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        for set_cookie in response.headers().get_all(SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let (pair, attrs) = raw.split_once(';').unwrap_or((raw, ""));
            let (name, value) = pair.split_once('=').unwrap();
            if attrs.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
        self.send(Method::POST, uri, Some(form)).await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response<Body> {
        self.post("/login/", &format!("username={username}&password={password}"))
            .await
    }

    /// Pending alerts, read straight from the flash cookie.
    fn alerts(&self) -> Vec<Alert> {
        self.cookies
            .get("alerts")
            .and_then(|value| self.key.decode(value))
            .unwrap_or_default()
    }

    fn identity(&self) -> Option<&str> {
        self.cookies.get("logged_in_as").map(String::as_str)
    }

    async fn seed(&self, to: &str, from: &str, subject: &str) -> String {
        self.store
            .create(NewMessage {
                to: to.into(),
                from: from.into(),
                subject: subject.into(),
                body: subject.to_uppercase(),
                time: Utc::now().naive_utc(),
            })
            .await
            .unwrap()
    }
}

fn location(response: &Response<Body>) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn danger_messages(alerts: &[Alert]) -> Vec<&str> {
    assert!(alerts.iter().all(|a| a.kind == AlertKind::Danger), "{alerts:?}");
    let mut messages: Vec<&str> = alerts.iter().map(|a| a.message.as_str()).collect();
    messages.sort_unstable();
    messages
}

#[tokio::test]
async fn test_login_page_loads() {
    let mut client = TestClient::new();
    let response = client.get("/login/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"name="username""#));
}

#[tokio::test]
async fn test_login() {
    let mut client = TestClient::new();

    for (username, password) in [("carmon", "frog"), ("jessie", "fwog"), ("jessie", "FROG")] {
        let response = client.login(username, password).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/");
        assert_eq!(client.identity(), None);
    }

    let response = client.login("jessie", "frog").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(client.identity(), Some("jessie"));

    let response = client.login("Jessie", "frog").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.identity(), Some("jessie"));
    assert_eq!(
        client.alerts().last(),
        Some(&Alert::success("Successfully logged in as jessie."))
    );
}

#[tokio::test]
async fn test_login_form_alerts() {
    let mut client = TestClient::new();
    let response = client.post("/login/", "usernam=carmon&passwor=frog").await;
    assert_eq!(location(&response), "/login/");
    assert_eq!(
        danger_messages(&client.alerts()),
        vec!["Missing password field!", "Missing username field!"]
    );

    let mut client = TestClient::new();
    let response = client.post("/login/", "username=&password=").await;
    assert_eq!(location(&response), "/login/");
    assert_eq!(
        danger_messages(&client.alerts()),
        vec!["password field cannot be blank!", "username field cannot be blank!"]
    );
}

#[tokio::test]
async fn test_logout() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    assert_eq!(client.identity(), Some("jessie"));

    let response = client.get("/logout/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.identity(), Some(""));

    let response = client.get("/").await;
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn test_protected_pages_require_login() {
    let delete_path = format!("/delete/{BOGUS_ID}/");
    for path in ["/", "/compose/", "/shred/", delete_path.as_str()] {
        let mut client = TestClient::new();
        let response = client.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/login/", "{path}");
    }

    for path in ["/", "/compose/", "/shred/"] {
        let mut client = TestClient::new();
        client.login("jessie", "frog").await;
        let response = client.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_home_page_drains_alerts() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    assert_eq!(client.alerts().len(), 1);

    let response = client.get("/").await;
    let html = body_text(response).await;
    assert!(html.contains("Successfully logged in as jessie."));
    assert!(client.alerts().is_empty());

    let html = body_text(client.get("/").await).await;
    assert!(!html.contains("Successfully logged in as jessie."));
}

#[tokio::test]
async fn test_compose_page_excludes_caller() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    let html = body_text(client.get("/compose/").await).await;
    assert!(html.contains(r#"<option value="james">"#));
    assert!(html.contains(r#"<option value="cassidy">"#));
    assert!(!html.contains(r#"<option value="jessie">"#));
}

#[tokio::test]
async fn test_compose_success_alerts() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    client.get("/").await;

    let response = client.post("/compose/", "to=james&subject=frog&body=FROG%21").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::success("Message sent!")]);

    let sent = client.store.list_sent_by("jessie").await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "james");
    assert_eq!(sent[0].subject, "frog");
    assert_eq!(sent[0].body, "FROG!");

    // Send times are recorded in UTC.
    let age = Utc::now().naive_utc() - sent[0].time;
    assert!(age >= Duration::zero() && age < Duration::seconds(60), "{age}");
}

#[tokio::test]
async fn test_compose_missing_fields_alerts() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    client.get("/").await;

    let response = client.post("/compose/", "to=&subject=&body=").await;
    assert_eq!(location(&response), "/compose/");
    assert_eq!(
        danger_messages(&client.alerts()),
        vec![
            "body field cannot be blank!",
            "subject field cannot be blank!",
            "to field cannot be blank!",
        ]
    );
    assert!(client.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_compose_form_validation() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    client.get("/").await;

    client.post("/compose/", "subjec=A&two=B&bodee=nope").await;
    assert_eq!(
        danger_messages(&client.alerts()),
        vec!["Missing body field!", "Missing subject field!", "Missing to field!"]
    );
}

#[tokio::test]
async fn test_compose_many() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;

    for letter in 'a'..='z' {
        client
            .post(
                "/compose/",
                &format!("to=james&subject={letter}&body={}", letter.to_ascii_uppercase()),
            )
            .await;
    }

    let all = client.store.list_all().await.unwrap();
    assert_eq!(all.len(), 26);
    assert!(all.iter().all(|m| m.from == "jessie" && m.to == "james"));
    assert!(all.iter().all(|m| m.body == m.subject.to_uppercase()));
    assert!(all.windows(2).all(|w| w[0].time >= w[1].time));
}

#[tokio::test]
async fn test_view_authorization() {
    let mut client = TestClient::new();
    let id = client.seed("james", "jessie", "s").await;
    let path = format!("/view/{id}/");

    client.login("jessie", "frog").await;
    assert_eq!(client.get(&path).await.status(), StatusCode::OK);

    client.get("/logout/").await;
    client.login("james", "potato").await;
    let response = client.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("jessie"));

    client.get("/logout/").await;
    client.login("cassidy", "dog").await;
    client.get("/").await;
    let response = client.get(&path).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(
        client.alerts(),
        vec![Alert::danger("User not authorized to view message")]
    );
}

#[tokio::test]
async fn test_view_missing_message() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    client.get("/").await;

    let response = client.get(&format!("/view/{BOGUS_ID}/")).await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::danger("Unable to load message")]);
}

#[tokio::test]
async fn test_malformed_id_is_not_routed() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    let response = client.get("/view/not-a-message-id/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_confirmation_does_not_delete() {
    let mut client = TestClient::new();
    let id = client.seed("james", "jessie", "s").await;
    client.login("james", "potato").await;

    let response = client.get(&format!("/delete/{id}/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.store.fetch(&id).await.is_ok());
}

#[tokio::test]
async fn test_delete_success_alert() {
    let mut client = TestClient::new();
    let id = client.seed("james", "jessie", "s").await;
    client.login("jessie", "frog").await;
    client.get("/").await;

    let response = client.post(&format!("/delete/{id}/"), "").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::success(format!("Deleted {id}."))]);
    assert!(client.store.fetch(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_bogus_message() {
    let mut client = TestClient::new();
    client.seed("james", "jessie", "s").await;
    client.login("jessie", "frog").await;
    client.get("/").await;

    let response = client.post(&format!("/delete/{BOGUS_ID}/"), "").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::danger("Unable to load message")]);
    assert_eq!(client.store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_by_third_party_is_refused() {
    let mut client = TestClient::new();
    let id = client.seed("james", "jessie", "s").await;
    client.login("cassidy", "dog").await;

    let response = client.post(&format!("/delete/{id}/"), "").await;
    assert_eq!(location(&response), "/");
    assert!(client.store.fetch(&id).await.is_ok());
}

#[tokio::test]
async fn test_shred() {
    let mut client = TestClient::new();
    for letter in ["a", "b", "c"] {
        client.seed("james", "jessie", letter).await;
    }

    let response = client.post("/shred/", "").await;
    assert_eq!(location(&response), "/login/");
    assert_eq!(client.store.list_all().await.unwrap().len(), 3);

    client.login("jessie", "frog").await;
    client.get("/").await;
    let response = client.post("/shred/", "").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::success("Shredded all messages.")]);
    assert!(client.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_forged_identity_is_not_trusted_for_other_users_messages() {
    let mut client = TestClient::new();
    let id = client.seed("james", "jessie", "s").await;
    client.cookies.insert("logged_in_as".into(), "JESSIE".into());

    let response = client.get(&format!("/view/{id}/")).await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        client.alerts(),
        vec![Alert::danger("User not authorized to view message")]
    );
}

#[tokio::test]
async fn test_tampered_flash_cookie_is_ignored() {
    let mut client = TestClient::new();
    client.login("jessie", "frog").await;
    client.cookies.insert("alerts".into(), "W10.AAAA".into());

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.alerts().is_empty());
}

#[tokio::test]
async fn test_security_headers() {
    let mut client = TestClient::new();
    let response = client.get("/login/").await;
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["cache-control"], "private, no-store");
}

fn jessie_to_james(id: &str) -> Message {
    Message {
        id: id.to_string(),
        to: "james".into(),
        from: "jessie".into(),
        subject: "s".into(),
        body: "S".into(),
        time: Utc::now().naive_utc(),
    }
}

#[tokio::test]
async fn test_compose_storage_failure() {
    let mut store = MockMessageStore::new();
    store
        .expect_create()
        .times(1)
        .returning(|_| Err(AppError::Storage("disk full".into())));
    let mut client = TestClient::with_store(store);
    client.login("jessie", "frog").await;
    client.get("/compose/").await;

    let response = client.post("/compose/", "to=james&subject=s&body=S").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/compose/");
    assert_eq!(client.alerts(), vec![Alert::danger("Unable to send message.")]);
}

#[tokio::test]
async fn test_delete_of_message_gone_after_gate() {
    let mut store = MockMessageStore::new();
    store.expect_fetch().returning(|id| Ok(jessie_to_james(id)));
    store
        .expect_delete()
        .times(1)
        .returning(|id| Err(AppError::message_not_found(id)));
    let mut client = TestClient::with_store(store);
    client.login("jessie", "frog").await;
    client.get("/compose/").await;

    let response = client.post(&format!("/delete/{BOGUS_ID}/"), "").await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        client.alerts(),
        vec![Alert::danger(format!("No such message {BOGUS_ID}"))]
    );
}

#[tokio::test]
async fn test_shred_failure() {
    let mut store = MockMessageStore::new();
    store
        .expect_clear_all()
        .times(1)
        .returning(|| Err(AppError::Storage("failed to remove 1 of 3 messages".into())));
    let mut client = TestClient::with_store(store);
    client.login("jessie", "frog").await;
    client.get("/shred/").await;

    let response = client.post("/shred/", "").await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.alerts(), vec![Alert::danger("Failed to shred messages.")]);
}

#[tokio::test]
async fn test_login_with_unstorable_username() {
    let mut client = TestClient::build(
        Arc::new(MemoryMessageStore::new()),
        r#"{"jos\u00e9": "caf\u00e9"}"#,
    );

    let response = client.login("Jos%C3%A9", "caf%C3%A9").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
    assert_eq!(client.identity(), None);
    assert_eq!(
        client.alerts(),
        vec![Alert::danger("Unable to log in as jos\u{e9}.")]
    );
}
