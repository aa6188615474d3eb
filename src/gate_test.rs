use super::*;
use crate::navigator::{NavEvent, RecordingNavigator};
use crate::store::MemoryStore;
use crate::surface::{BannerAnchor, StaticPage};
use std::sync::Mutex;

// =========================================================================
// ScriptedTransport
// =========================================================================

enum Scripted {
    Respond(u16, &'static str),
    Fail(&'static str),
}

struct ScriptedTransport {
    script: Mutex<Vec<Scripted>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Scripted>) -> Self {
        Self { script: Mutex::new(script), sent: Mutex::new(Vec::new()) }
    }

    fn responding(status: u16, body: &'static str) -> Self {
        Self::new(vec![Scripted::Respond(status, body)])
    }

    fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GateError> {
        self.sent.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        match script.remove(0) {
            Scripted::Respond(status, body) => Ok(ApiResponse::new(status, body)),
            Scripted::Fail(message) => Err(GateError::Transport(message.to_owned())),
        }
    }
}

// =========================================================================
// helpers
// =========================================================================

type TestGate = SessionGate<MemoryStore, RecordingNavigator, ScriptedTransport>;

fn gate_with(entries: &[(&str, &str)], transport: ScriptedTransport) -> TestGate {
    let store = MemoryStore::with_entries(entries.iter().copied());
    SessionGate::new(GateConfig::default(), store, RecordingNavigator::new(), transport)
}

fn gate(entries: &[(&str, &str)]) -> TestGate {
    gate_with(entries, ScriptedTransport::new(Vec::new()))
}

const USER_SESSION: [(&str, &str); 4] =
    [("token", "jwt-user"), ("username", "bob"), ("userId", "2"), ("roles", r#"["USER"]"#)];

const ADMIN_SESSION: [(&str, &str); 4] =
    [("token", "jwt-admin"), ("username", "alice"), ("userId", "1"), ("roles", r#"["USER","ADMIN"]"#)];

fn courses() -> PageKind {
    PageKind::Listing { resource: "courses".into() }
}

fn courses_page() -> StaticPage {
    StaticPage::new()
        .with_heading()
        .with_link("/courses/new", "Add New Course")
        .with_link("/courses/edit/1", "Edit")
        .with_link("/courses/delete/1", "Delete")
        .with_link("/courses/1", "View")
        .with_header("Code")
        .with_header("Actions")
        .with_row(&["/courses/edit/1", "/courses/delete/1"])
}

fn assert_session_cleared(gate: &TestGate) {
    for key in ["token", "username", "userId", "roles"] {
        assert_eq!(gate.store().get(key), None, "{key} should be cleared");
    }
}

// =========================================================================
// is_authenticated / get_token
// =========================================================================

#[test]
fn authenticated_iff_non_empty_token() {
    assert!(!gate(&[]).is_authenticated());
    assert!(!gate(&[("token", "")]).is_authenticated());
    assert!(gate(&[("token", "x")]).is_authenticated());
}

#[test]
fn authentication_ignores_other_fields() {
    let g = gate(&[("username", "bob"), ("roles", r#"["ADMIN"]"#)]);
    assert!(!g.is_authenticated());
    assert!(g.is_privileged());
}

#[test]
fn get_token_returns_raw_value() {
    assert_eq!(gate(&[]).get_token(), None);
    assert_eq!(gate(&[("token", "")]).get_token().as_deref(), Some(""));
    assert_eq!(gate(&USER_SESSION).get_token().as_deref(), Some("jwt-user"));
}

// =========================================================================
// current_session / has_role / is_privileged
// =========================================================================

#[test]
fn current_session_reads_all_fields() {
    let record = gate(&ADMIN_SESSION).current_session();
    assert_eq!(record.credential.as_deref(), Some("jwt-admin"));
    assert_eq!(record.display_name.as_deref(), Some("alice"));
    assert_eq!(record.subject_id.as_deref(), Some("1"));
    assert_eq!(record.roles.len(), 2);
}

#[test]
fn has_role_matches_membership() {
    let g = gate(&ADMIN_SESSION);
    assert!(g.has_role("ADMIN"));
    assert!(g.has_role("USER"));
    assert!(!g.has_role("AUDITOR"));
    assert!(g.is_privileged());
    assert!(!gate(&USER_SESSION).is_privileged());
}

#[test]
fn malformed_roles_behave_as_empty() {
    for raw in ["", "ADMIN", "[ADMIN]", r#"{"0":"ADMIN"}"#] {
        let g = gate(&[("token", "t"), ("roles", raw)]);
        assert!(!g.has_role("ADMIN"), "roles {raw:?}");
        assert!(g.current_session().roles.is_empty());
    }
    assert!(!gate(&[("token", "t")]).has_role("USER"));
}

#[test]
fn privileged_role_is_configurable() {
    let config = GateConfig { privileged_role: "SUPERUSER".into(), ..GateConfig::default() };
    let store = MemoryStore::with_entries([("roles", r#"["ADMIN","SUPERUSER"]"#)]);
    let g = SessionGate::new(config, store, RecordingNavigator::new(), ());
    assert!(g.is_privileged());

    let store = MemoryStore::with_entries([("roles", r#"["ADMIN"]"#)]);
    let config = GateConfig { privileged_role: "SUPERUSER".into(), ..GateConfig::default() };
    let g = SessionGate::new(config, store, RecordingNavigator::new(), ());
    assert!(!g.is_privileged());
}

// =========================================================================
// logout
// =========================================================================

#[test]
fn logout_clears_fields_and_redirects() {
    let g = gate(&ADMIN_SESSION);
    g.logout();
    assert_session_cleared(&g);
    assert!(!g.is_authenticated());
    assert_eq!(g.navigator().navigations(), vec!["/login".to_owned()]);
}

#[test]
fn logout_is_idempotent() {
    let g = gate(&[]);
    g.logout();
    g.logout();
    assert!(!g.is_authenticated());
    assert_eq!(g.navigator().navigations(), vec!["/login".to_owned(), "/login".to_owned()]);
}

#[test]
fn logout_leaves_unrelated_keys() {
    let g = gate(&[("token", "t"), ("theme", "dark")]);
    g.logout();
    assert_eq!(g.store().get("theme").as_deref(), Some("dark"));
}

// =========================================================================
// evaluate / on_page_load
// =========================================================================

#[test]
fn public_page_with_session_redirects_to_landing() {
    let g = gate(&USER_SESSION);
    let mut page = StaticPage::new();
    let outcome = g.on_page_load(&PageKind::Public, &mut page);
    assert_eq!(outcome, PageOutcome::Redirect { to: "/students".into() });
    assert_eq!(g.navigator().navigations(), vec!["/students".to_owned()]);
    assert!(page.identity.is_none());
}

#[test]
fn public_page_without_session_renders_unchanged() {
    let g = gate(&[]);
    let mut page = courses_page();
    let before = page.clone();
    assert_eq!(g.on_page_load(&PageKind::Public, &mut page), PageOutcome::Allow);
    assert!(g.navigator().events().is_empty());
    assert_eq!(page, before);
}

#[test]
fn protected_pages_without_session_redirect_to_login() {
    for kind in [PageKind::Protected, courses()] {
        let g = gate(&[("token", ""), ("username", "ghost")]);
        let mut page = StaticPage::new();
        let outcome = g.on_page_load(&kind, &mut page);
        assert_eq!(outcome, PageOutcome::Redirect { to: "/login".into() });
        assert_eq!(g.navigator().navigations(), vec!["/login".to_owned()]);
        assert!(page.identity.is_none());
    }
}

#[test]
fn protected_page_with_session_renders_identity_without_redirect() {
    let g = gate(&USER_SESSION);
    let mut page = StaticPage::new().with_link("/students/edit/1", "Edit");
    let outcome = g.on_page_load(&PageKind::Protected, &mut page);

    assert!(g.navigator().events().is_empty());
    let PageOutcome::Render { identity, view } = outcome else {
        panic!("expected Render outcome");
    };
    assert_eq!(view, ViewDecision::unrestricted());
    let identity = identity.unwrap();
    assert_eq!(identity.badge, RoleBadge::Standard);
    assert_eq!(page.identity, Some(identity));
    assert_eq!(page.visible_hrefs(), vec!["/students/edit/1"]);
}

#[test]
fn listing_page_for_standard_user_is_view_only() {
    let g = gate(&USER_SESSION);
    let mut page = courses_page();
    g.on_page_load(&courses(), &mut page);

    assert_eq!(page.visible_hrefs(), vec!["/courses/1"]);
    assert!(page.header_cells[1].hidden);
    assert!(page.last_column_cells[0].hidden);
    assert_eq!(page.banners.len(), 1);
    assert_eq!(page.banners[0].anchor, BannerAnchor::AfterHeading);
    assert!(page.banners[0].banner.message.contains("view courses"));
}

#[test]
fn listing_page_for_admin_is_untouched() {
    let g = gate(&ADMIN_SESSION);
    let mut page = courses_page();
    g.on_page_load(&courses(), &mut page);

    assert_eq!(page.visible_hrefs().len(), 4);
    assert!(page.banners.is_empty());
    assert_eq!(page.identity.as_ref().map(|i| i.badge), Some(RoleBadge::Privileged));
}

#[test]
fn session_without_name_skips_identity() {
    let g = gate(&[("token", "t")]);
    let mut page = StaticPage::new();
    let outcome = g.on_page_load(&PageKind::Protected, &mut page);
    assert!(matches!(outcome, PageOutcome::Render { identity: None, .. }));
    assert!(page.identity.is_none());
}

#[test]
fn empty_cached_name_skips_identity() {
    let g = gate(&[("token", "t"), ("username", "")]);
    let mut page = StaticPage::new();
    let outcome = g.on_page_load(&PageKind::Protected, &mut page);
    assert!(matches!(outcome, PageOutcome::Render { identity: None, .. }));
    assert!(page.identity.is_none());
    assert_eq!(g.identity_view(), None);
}

#[test]
fn evaluate_has_no_side_effects() {
    let g = gate(&[]);
    assert_eq!(g.evaluate(&PageKind::Protected), PageOutcome::Redirect { to: "/login".into() });
    assert!(g.navigator().events().is_empty());
}

// =========================================================================
// render_identity / apply_role_restriction
// =========================================================================

#[test]
fn render_identity_is_noop_without_slot() {
    let g = gate(&USER_SESSION);
    let mut page = StaticPage { identity_slot: false, ..StaticPage::new() };
    g.render_identity(&mut page);
    assert!(page.identity.is_none());
}

#[test]
fn render_identity_fills_slot() {
    let g = gate(&ADMIN_SESSION);
    let mut page = StaticPage::new();
    g.render_identity(&mut page);
    let identity = page.identity.unwrap();
    assert_eq!(identity.greeting(), "Welcome, alice");
    assert_eq!(identity.badge.label(), "👑 ADMIN");
    assert_eq!(identity.logout_path, "/login");
}

#[test]
fn restriction_twice_inserts_banner_once() {
    let g = gate(&USER_SESSION);
    let mut page = courses_page();
    let first = g.apply_role_restriction(&courses(), &mut page);
    let second = g.apply_role_restriction(&courses(), &mut page);

    assert!(first.banner.is_some());
    assert!(second.banner.is_none());
    assert_eq!(page.banners.len(), 1);
    assert_eq!(page.visible_hrefs(), vec!["/courses/1"]);
}

#[test]
fn restriction_on_unlisted_page_does_nothing() {
    let g = gate(&USER_SESSION);
    let mut page = courses_page();
    let plan = g.apply_role_restriction(&PageKind::Protected, &mut page);
    assert!(plan.is_empty());
    assert_eq!(page, courses_page());
}

#[test]
fn restriction_without_container_hides_but_skips_banner() {
    let g = gate(&USER_SESSION);
    let mut page = StaticPage { container: false, ..courses_page() };
    g.apply_role_restriction(&courses(), &mut page);
    assert!(page.banners.is_empty());
    assert_eq!(page.visible_hrefs(), vec!["/courses/1"]);
}

// =========================================================================
// authorized_request
// =========================================================================

#[tokio::test]
async fn request_without_token_redirects_and_sends_nothing() {
    let g = gate(&[("token", "")]);
    let outcome = g.authorized_request(ApiRequest::get("/api/courses")).await.unwrap();
    assert_eq!(outcome, RequestOutcome::RedirectedToLogin);
    assert!(g.transport().sent().is_empty());
    assert_eq!(g.navigator().navigations(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn request_merges_auth_headers_over_caller_headers() {
    let g = gate_with(&USER_SESSION, ScriptedTransport::responding(200, "[]"));
    let request = ApiRequest::post("/api/courses")
        .header("X-Trace", "t1")
        .header("authorization", "Basic nope")
        .header("content-type", "text/plain")
        .body("{}");
    let outcome = g.authorized_request(request).await.unwrap();
    assert_eq!(outcome.into_response(), Some(ApiResponse::new(200, "[]")));

    let sent = g.transport().sent();
    assert_eq!(sent.len(), 1);
    let sent = &sent[0];
    assert_eq!(sent.header_value("X-Trace"), Some("t1"));
    assert_eq!(sent.header_value("Authorization"), Some("Bearer jwt-user"));
    assert_eq!(sent.header_value("Content-Type"), Some("application/json"));
    assert_eq!(sent.headers.len(), 3);
    assert_eq!(sent.body.as_deref(), Some("{}"));
}

#[tokio::test]
async fn unauthorized_response_clears_session_and_redirects() {
    let g = gate_with(&ADMIN_SESSION, ScriptedTransport::responding(401, ""));
    let outcome = g.authorized_request(ApiRequest::get("/api/courses")).await.unwrap();
    assert_eq!(outcome, RequestOutcome::RedirectedToLogin);
    assert!(outcome.into_response().is_none());
    assert_session_cleared(&g);
    assert_eq!(g.navigator().navigations(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn forbidden_response_notifies_and_keeps_session() {
    let g = gate_with(&USER_SESSION, ScriptedTransport::responding(403, "forbidden"));
    let outcome = g.authorized_request(ApiRequest::delete("/api/courses/1")).await.unwrap();
    assert_eq!(outcome, RequestOutcome::Denied);
    assert_eq!(g.navigator().events(), vec![NavEvent::Notify(ACCESS_DENIED_NOTICE.to_owned())]);
    for (key, value) in USER_SESSION {
        assert_eq!(g.store().get(key).as_deref(), Some(value));
    }
}

#[tokio::test]
async fn other_statuses_pass_through() {
    for status in [200, 201, 204, 400, 404, 500] {
        let g = gate_with(&USER_SESSION, ScriptedTransport::responding(status, "body"));
        let outcome = g.authorized_request(ApiRequest::get("/api/students")).await.unwrap();
        assert_eq!(outcome.response().map(|r| r.status), Some(status));
        assert!(g.navigator().events().is_empty());
        assert!(g.is_authenticated());
    }
}

#[tokio::test]
async fn transport_failure_propagates_without_touching_session() {
    let g = gate_with(&USER_SESSION, ScriptedTransport::new(vec![Scripted::Fail("connection refused")]));
    let err = g.authorized_request(ApiRequest::get("/api/students")).await.unwrap_err();
    assert!(matches!(err, GateError::Transport(ref m) if m == "connection refused"));
    assert!(g.is_authenticated());
    assert!(g.navigator().events().is_empty());
}

#[tokio::test]
async fn forbidden_then_ok_keeps_working() {
    let g = gate_with(
        &USER_SESSION,
        ScriptedTransport::new(vec![Scripted::Respond(403, ""), Scripted::Respond(200, "ok")]),
    );
    assert_eq!(g.authorized_request(ApiRequest::get("/a")).await.unwrap(), RequestOutcome::Denied);
    let second = g.authorized_request(ApiRequest::get("/b")).await.unwrap();
    assert_eq!(second.response().map(|r| r.body.as_str()), Some("ok"));
    assert_eq!(g.transport().sent()[1].header_value("Authorization"), Some("Bearer jwt-user"));
}
