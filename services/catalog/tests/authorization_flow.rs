//! 授权链路端到端测试
//!
//! 通过真实路由驱动请求, 存储和决策点使用内存替身

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use axum::Router;
use catalog::api::http::{AppState, router};
use catalog::application::{BookService, SessionService};
use catalog::domain::book::{Book, BookDraft, BookId, BookRepository};
use catalog::domain::user::{HashedPassword, UserCredentials, UserRepository};
use chrono::Utc;
use serde_json::{Value, json};
use shelf_auth_core::{
    AccessGuard, Action, Decision, GuardConfig, Identity, IdentityResolver, PolicyClient,
    PolicyError, Principal, Resource, Role, RoleStore, RoleStoreError,
};
use shelf_errors::AppResult;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// 替身
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Directory {
    users: Mutex<HashMap<String, (HashedPassword, String)>>,
    unavailable: AtomicBool,
}

impl Directory {
    fn add(&self, username: &str, password: &str, role: &str) {
        self.users.lock().unwrap().insert(
            username.to_string(),
            (HashedPassword::hash(password).unwrap(), role.to_string()),
        );
    }

    fn set_role(&self, username: &str, role: &str) {
        if let Some(entry) = self.users.lock().unwrap().get_mut(username) {
            entry.1 = role.to_string();
        }
    }
}

#[async_trait]
impl RoleStore for Directory {
    async fn role_of(&self, identity: &Identity) -> Result<Role, RoleStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RoleStoreError::Unavailable(
                "connection to 10.0.0.5:5432 refused".into(),
            ));
        }
        self.users
            .lock()
            .unwrap()
            .get(identity.as_str())
            .map(|(_, role)| Role::new(role.clone()))
            .ok_or(RoleStoreError::NotFound)
    }
}

#[async_trait]
impl UserRepository for Directory {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(username)
            .map(|(hash, role)| UserCredentials {
                username: username.to_string(),
                password_hash: hash.clone(),
                role: role.clone(),
            }))
    }
}

#[derive(Default)]
struct MemoryBooks {
    books: Mutex<Vec<Book>>,
    mutations: AtomicUsize,
}

#[async_trait]
impl BookRepository for MemoryBooks {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>> {
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let book = Book {
            id: BookId::new(),
            title: draft.title.clone(),
            author: draft.author.clone(),
            published_at: draft.published_at,
            created_at: Utc::now(),
        };
        self.books.lock().unwrap().push(book.clone());
        Ok(book)
    }

    async fn update(&self, id: BookId, draft: &BookDraft) -> AppResult<Option<Book>> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut books = self.books.lock().unwrap();
        Ok(books.iter_mut().find(|b| b.id == id).map(|b| {
            b.title = draft.title.clone();
            b.author = draft.author.clone();
            b.published_at = draft.published_at;
            b.clone()
        }))
    }

    async fn delete(&self, id: BookId) -> AppResult<bool> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum PdpMode {
    Up,
    Down,
    Hanging,
}

/// 按 (角色, 操作) 规则回答的决策点
struct ScriptedPdp {
    rules: HashSet<(String, Action)>,
    mode: Mutex<PdpMode>,
    fail_sync: AtomicBool,
    checks: AtomicUsize,
    syncs: AtomicUsize,
}

impl ScriptedPdp {
    fn bookstore() -> Self {
        let mut rules = HashSet::new();
        for action in Action::ALL {
            rules.insert(("admin".to_string(), action));
        }
        rules.insert(("user".to_string(), Action::View));
        Self {
            rules,
            mode: Mutex::new(PdpMode::Up),
            fail_sync: AtomicBool::new(false),
            checks: AtomicUsize::new(0),
            syncs: AtomicUsize::new(0),
        }
    }

    fn set_mode(&self, mode: PdpMode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn allows(&self, role: &str, action: Action) -> bool {
        self.rules.contains(&(role.to_string(), action))
    }
}

#[async_trait]
impl PolicyClient for ScriptedPdp {
    async fn sync(&self, _principal: &Principal) -> Result<(), PolicyError> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync.load(Ordering::SeqCst) {
            Err(PolicyError::Status(503))
        } else {
            Ok(())
        }
    }

    async fn check(
        &self,
        principal: &Principal,
        action: Action,
        resource: &Resource,
    ) -> Result<Decision, PolicyError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        assert_eq!(resource.kind(), "books");
        assert_eq!(resource.tenant(), "default");

        let mode = *self.mode.lock().unwrap();
        match mode {
            PdpMode::Up => Ok(Decision::from_allowed(
                self.allows(principal.role().as_str(), action),
            )),
            PdpMode::Down => Err(PolicyError::Transport("connection refused".into())),
            PdpMode::Hanging => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Decision::Allow)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 测试夹具
// ---------------------------------------------------------------------------

struct Harness {
    app: Router,
    directory: Arc<Directory>,
    books: Arc<MemoryBooks>,
    pdp: Arc<ScriptedPdp>,
}

impl Harness {
    fn new() -> Self {
        let directory = Arc::new(Directory::default());
        directory.add("alice", "wonderland", "admin");
        directory.add("bob", "builder", "user");

        let books = Arc::new(MemoryBooks::default());
        let pdp = Arc::new(ScriptedPdp::bookstore());

        let guard = Arc::new(AccessGuard::new(
            IdentityResolver::new("username"),
            directory.clone(),
            pdp.clone(),
            Resource::new("books", "default"),
            GuardConfig {
                role_lookup_timeout: Duration::from_millis(500),
                decision_timeout: Duration::from_millis(200),
                sync_timeout: Duration::from_millis(200),
            },
        ));

        let state = AppState {
            guard: guard.clone(),
            books: Arc::new(BookService::new(books.clone())),
            sessions: Arc::new(SessionService::new(directory.clone(), guard)),
        };

        Self {
            app: router(state),
            directory,
            books,
            pdp,
        }
    }

    async fn send(&self, method: Method, uri: &str, identity: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(identity) = identity {
            builder = builder.header(header::COOKIE, format!("username={}", identity));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn seed_book(&self) -> BookId {
        let draft = BookDraft {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            published_at: None,
        };
        let id = self.books.create(&draft).await.unwrap().id;
        self.books.mutations.store(0, Ordering::SeqCst);
        id
    }

    fn mutations(&self) -> usize {
        self.books.mutations.load(Ordering::SeqCst)
    }
}

fn new_book() -> Value {
    json!({"title": "Neuromancer", "author": "William Gibson", "published_at": "1984-07-01"})
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 每个操作对应的请求
fn request_for(action: Action, id: BookId) -> (Method, String, Option<Value>) {
    match action {
        Action::View => (Method::GET, "/books".to_string(), None),
        Action::Create => (Method::POST, "/books".to_string(), Some(new_book())),
        Action::Update => (Method::PUT, format!("/books/{}", id), Some(new_book())),
        Action::Delete => (Method::DELETE, format!("/books/{}", id), None),
    }
}

// ---------------------------------------------------------------------------
// 测试
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_without_identity_are_unauthenticated() {
    let h = Harness::new();
    let id = h.seed_book().await;

    for action in Action::ALL {
        let (method, uri, body) = request_for(action, id);
        let response = h.send(method, &uri, None, body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", action);
    }

    assert_eq!(h.mutations(), 0);
    assert_eq!(h.pdp.checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn decision_point_outage_fails_closed() {
    let h = Harness::new();
    let id = h.seed_book().await;
    h.pdp.set_mode(PdpMode::Down);

    for action in Action::ALL {
        let (method, uri, body) = request_for(action, id);
        let response = h.send(method, &uri, Some("alice"), body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", action);
    }

    assert_eq!(h.mutations(), 0);
    assert_eq!(h.books.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn hanging_decision_point_is_bounded_and_denied() {
    let h = Harness::new();
    h.pdp.set_mode(PdpMode::Hanging);

    let started = Instant::now();
    let response = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(h.mutations(), 0);
}

#[tokio::test]
async fn outcome_matches_policy_for_every_role_and_action() {
    let h = Harness::new();

    for (identity, role) in [("alice", "admin"), ("bob", "user")] {
        for action in Action::ALL {
            let id = h.seed_book().await;
            let (method, uri, body) = request_for(action, id);
            let response = h.send(method, &uri, Some(identity), body).await;

            let expected_allowed = h.pdp.allows(role, action);
            assert_eq!(
                response.status().is_success(),
                expected_allowed,
                "{} as {} -> {}",
                action,
                role,
                response.status()
            );
            if !expected_allowed {
                assert_eq!(response.status(), StatusCode::FORBIDDEN);
                assert_eq!(h.mutations(), 0);
            }
        }
    }
}

#[tokio::test]
async fn exactly_one_check_per_request() {
    let h = Harness::new();
    let id = h.seed_book().await;

    for action in Action::ALL {
        let before = h.pdp.checks.load(Ordering::SeqCst);
        let (method, uri, body) = request_for(action, id);
        h.send(method, &uri, Some("bob"), body).await;
        assert_eq!(h.pdp.checks.load(Ordering::SeqCst), before + 1);
    }
}

#[tokio::test]
async fn sync_failure_does_not_change_outcomes() {
    let h = Harness::new();
    h.pdp.fail_sync.store(true, Ordering::SeqCst);

    let login = h
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "alice", "password": "wonderland"})),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let set_cookie = login.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("username=alice;"));
    assert!(set_cookie.contains("HttpOnly"));
    assert_eq!(h.pdp.syncs.load(Ordering::SeqCst), 1);

    let created = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let denied = h
        .send(Method::POST, "/books", Some("bob"), Some(new_book()))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn authorize_is_idempotent() {
    let h = Harness::new();

    for identity in ["alice", "bob"] {
        let first = h.send(Method::GET, "/books", Some(identity), None).await.status();
        let second = h.send(Method::GET, "/books", Some(identity), None).await.status();
        assert_eq!(first, second);

        let first = h
            .send(Method::DELETE, &format!("/books/{}", BookId::new()), Some(identity), None)
            .await
            .status();
        let second = h
            .send(Method::DELETE, &format!("/books/{}", BookId::new()), Some(identity), None)
            .await
            .status();
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn demotion_takes_effect_on_next_request() {
    let h = Harness::new();

    let response = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    h.directory.set_role("alice", "user");

    let response = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.mutations(), 1);
}

#[tokio::test]
async fn unknown_identity_is_never_allowed() {
    let h = Harness::new();

    let response = h.send(Method::GET, "/books", Some("mallory"), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.pdp.checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn role_store_outage_is_internal_error_without_detail() {
    let h = Harness::new();
    h.directory.unavailable.store(true, Ordering::SeqCst);

    let response = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let body = json_body(response).await;
    assert!(!body["detail"].as_str().unwrap().contains("10.0.0.5"));
    assert_eq!(h.mutations(), 0);
}

#[tokio::test]
async fn authorization_precedes_validation_and_lookup() {
    let h = Harness::new();
    let invalid = json!({"title": "", "author": "x"});

    let anonymous = h.send(Method::POST, "/books", None, Some(invalid.clone())).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user = h.send(Method::POST, "/books", Some("bob"), Some(invalid.clone())).await;
    assert_eq!(user.status(), StatusCode::FORBIDDEN);

    let admin = h.send(Method::POST, "/books", Some("alice"), Some(invalid)).await;
    assert_eq!(admin.status(), StatusCode::BAD_REQUEST);

    let missing = format!("/books/{}", BookId::new());
    let user = h.send(Method::DELETE, &missing, Some("bob"), None).await;
    assert_eq!(user.status(), StatusCode::FORBIDDEN);
    let admin = h.send(Method::DELETE, &missing, Some("alice"), None).await;
    assert_eq!(admin.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_lifecycle_for_admin() {
    let h = Harness::new();

    let created = h
        .send(Method::POST, "/books", Some("alice"), Some(new_book()))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["published_at"], "1984-07-01");

    let updated = h
        .send(
            Method::PUT,
            &format!("/books/{}", id),
            Some("alice"),
            Some(json!({"title": "Count Zero", "author": "William Gibson"})),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(json_body(updated).await["title"], "Count Zero");

    let fetched = h.send(Method::GET, &format!("/books/{}", id), Some("bob"), None).await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let deleted = h
        .send(Method::DELETE, &format!("/books/{}", id), Some("alice"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let listed = h.send(Method::GET, "/books", Some("bob"), None).await;
    assert_eq!(json_body(listed).await, json!([]));
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let h = Harness::new();

    let wrong = h
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
    let unknown = h
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "mallory", "password": "nope"})),
        )
        .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(json_body(wrong).await["detail"], json_body(unknown).await["detail"]);
    assert_eq!(h.pdp.syncs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn issued_cookie_authorizes_username_with_spaces() {
    let h = Harness::new();
    h.directory.add("john doe", "hunter2", "user");

    let login = h
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "john doe", "password": "hunter2"})),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let set_cookie = login.headers()[header::SET_COOKIE].to_str().unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert_eq!(pair, "username=john%20doe");

    let request = Request::get("/books")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let h = Harness::new();

    let response = h.send(Method::POST, "/logout", Some("alice"), None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("username=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}
