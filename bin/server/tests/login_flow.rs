//! End-to-end behaviour of the `/securityRealm/*` endpoints.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use bitbucket_oauth_provider::{
    AccessToken, IdentityProvider, ProviderError, ProviderUser, RequestToken,
};
use bitbucket_oauth_realm::{Credentials, Realm};
use bitbucket_oauth_server::auth::AppState;
use bitbucket_oauth_server::auth::routes::{Principal, UserDetails};
use bitbucket_oauth_server::config::SessionConfig;
use bitbucket_oauth_server::router;
use rootcause::prelude::Report;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;
use url::Url;

const ROOT: &str = "https://ci.example.com/";
const REFERER: &str = "https://ci.example.com/job/x";

struct StubProvider {
    username: &'static str,
    teams: Vec<&'static str>,
    exchanges: AtomicUsize,
}

impl StubProvider {
    fn new(username: &'static str, teams: &[&'static str]) -> Self {
        Self {
            username,
            teams: teams.to_vec(),
            exchanges: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn create_request_token(
        &self,
        _callback: &str,
    ) -> Result<RequestToken, Report<ProviderError>> {
        Ok(RequestToken::new("rt-1", "rt-secret"))
    }

    fn create_authorization_url(&self, request_token: &RequestToken) -> Url {
        let mut url = Url::parse("https://bitbucket.test/authenticate").expect("valid url");
        url.query_pairs_mut()
            .append_pair("oauth_token", request_token.token());
        url
    }

    async fn exchange_code_for_access_token(
        &self,
        _code: &str,
        _request_token: &RequestToken,
    ) -> Result<AccessToken, Report<ProviderError>> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(AccessToken::new("at-1", "at-secret"))
    }

    async fn fetch_authenticated_user(
        &self,
        _access_token: &AccessToken,
    ) -> Result<Option<ProviderUser>, Report<ProviderError>> {
        Ok(Some(
            ProviderUser::new(self.username).with_display_name(Some("Alice Liddell".to_string())),
        ))
    }

    async fn is_team_member(
        &self,
        _access_token: &AccessToken,
        team_name: &str,
    ) -> Result<bool, Report<ProviderError>> {
        Ok(self.teams.iter().any(|t| *t == team_name))
    }

    async fn fetch_user_by_username(&self, username: &str) -> Option<ProviderUser> {
        (username == "bob").then(|| ProviderUser::new("bob"))
    }
}

fn app_with(provider: Arc<StubProvider>, root_url: Option<&str>) -> (Router, Arc<AppState>) {
    let realm = Realm::new(
        Credentials::new("key1", "secret1", Some("myteam".to_string())),
        provider,
    );
    let state = Arc::new(AppState::new(
        realm,
        root_url.map(str::to_string),
        SessionConfig::default(),
    ));
    (router(state.clone()), state)
}

fn app(provider: Arc<StubProvider>) -> (Router, Arc<AppState>) {
    app_with(provider, Some(ROOT))
}

fn alice() -> Arc<StubProvider> {
    Arc::new(StubProvider::new("alice", &["myteam", "otherteam"]))
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>, referer: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    if let Some(referer) = referer {
        request = request.header(header::REFERER, referer);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).expect("request"))
        .await
        .expect("infallible")
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
}

fn set_session_cookie(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
}

fn session_cookie(response: &Response<Body>) -> String {
    set_session_cookie(response)
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string()
}

async fn commence(app: &Router, referer: Option<&str>) -> String {
    let response = get(app, "/securityRealm/commenceLogin", None, referer).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "https://bitbucket.test/authenticate?oauth_token=rt-1"
    );
    session_cookie(&response)
}

const FINISH: &str = "/securityRealm/finishLogin?oauth_verifier=v3r1f13r";

/// Runs a full login and returns the cookie issued by the callback.
async fn login(app: &Router, referer: Option<&str>) -> String {
    let cookie = commence(app, referer).await;
    let response = get(app, FINISH, Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    session_cookie(&response)
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

#[tokio::test]
async fn login_returns_to_referer_and_binds_principal() {
    let (app, state) = app(alice());

    let cookie = commence(&app, Some(REFERER)).await;
    let response = get(
        &app,
        "/securityRealm/finishLogin?oauth_verifier=v3r1f13r",
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), REFERER);
    let cookie = session_cookie(&response);

    let response = get(&app, "/securityRealm/whoami", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let principal: Principal =
        serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(
        principal,
        Principal {
            username: "alice".to_string(),
            display_name: Some("Alice Liddell".to_string()),
            authorities: vec!["authenticated".to_string()],
        }
    );

    let user = state.users.find("alice").await.expect("user record");
    assert_eq!(user.display_name(), Some("Alice Liddell"));
}

#[tokio::test]
async fn login_without_referer_returns_to_root() {
    let (app, _) = app(alice());

    let cookie = commence(&app, None).await;
    let response = get(
        &app,
        "/securityRealm/finishLogin?oauth_verifier=v3r1f13r",
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(location(&response), ROOT);
}

#[tokio::test]
async fn missing_verifier_redirects_to_root_unauthenticated() {
    let (app, _) = app(alice());

    let cookie = commence(&app, Some(REFERER)).await;
    let response = get(&app, "/securityRealm/finishLogin", Some(&cookie), None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), ROOT);

    let response = get(&app, "/securityRealm/whoami", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn orphaned_callback_is_rejected_before_exchange() {
    let provider = alice();
    let (app, state) = app(provider.clone());

    let response = get(
        &app,
        "/securityRealm/finishLogin?oauth_verifier=v3r1f13r",
        None,
        None,
    )
    .await;

    assert_eq!(location(&response), ROOT);
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    assert_eq!(state.users.len().await, 0);
}

#[tokio::test]
async fn outsider_is_not_logged_in() {
    let (app, state) = app(Arc::new(StubProvider::new("alice", &["otherteam"])));

    let cookie = commence(&app, Some(REFERER)).await;
    let response = get(
        &app,
        "/securityRealm/finishLogin?oauth_verifier=v3r1f13r",
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(location(&response), REFERER);
    let response = get(&app, "/securityRealm/whoami", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(state.users.find("alice").await.is_none());
}

#[tokio::test]
async fn commence_without_root_url_is_unavailable() {
    let (app, _) = app_with(alice(), None);

    let response = get(&app, "/securityRealm/commenceLogin", None, Some(REFERER)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn logout_drops_principal() {
    let (app, _) = app(alice());
    let cookie = login(&app, None).await;

    let response = get(&app, "/securityRealm/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), ROOT);

    let response = get(&app, "/securityRealm/whoami", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_lookup_requires_realm_session() {
    let (app, _) = app(alice());

    let response = get(&app, "/securityRealm/user/bob", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let cookie = login(&app, None).await;

    let response = get(&app, "/securityRealm/user/bob", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let details: UserDetails = serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(details.username, "bob");

    let response = get(&app, "/securityRealm/user/ghost", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_reflects_login_state() {
    let (app, _) = app(alice());

    let response = get(&app, "/", None, None).await;
    assert!(body_string(response).await.contains("securityRealm/commenceLogin"));

    let cookie = login(&app, None).await;

    let response = get(&app, "/", Some(&cookie), None).await;
    assert_eq!(body_string(response).await, "Signed in as Alice Liddell");
}

#[tokio::test]
async fn login_rotates_session_id() {
    let (app, state) = app(alice());

    let before = commence(&app, Some(REFERER)).await;
    let response = get(&app, FINISH, Some(&before), None).await;
    let after = session_cookie(&response);
    assert_ne!(after, before);

    let response = get(&app, "/securityRealm/whoami", Some(&before), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = get(&app, "/securityRealm/whoami", Some(&after), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn session_cookie_is_bounded_by_server_expiry() {
    let (app, _) = app(alice());

    let response = get(&app, "/securityRealm/commenceLogin", None, None).await;
    let issued = set_session_cookie(&response).expect("session cookie");
    assert!(!issued.to_ascii_lowercase().contains("max-age"));
    let cookie = session_cookie(&response);

    let response = get(&app, FINISH, Some(&cookie), None).await;
    let reissued = set_session_cookie(&response).expect("cookie re-issued on login");
    assert!(!reissued.to_ascii_lowercase().contains("max-age"));
}

#[tokio::test]
async fn failed_login_keeps_session_id() {
    let (app, _) = app(Arc::new(StubProvider::new("alice", &["otherteam"])));

    let cookie = commence(&app, None).await;
    let response = get(&app, FINISH, Some(&cookie), None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(set_session_cookie(&response).is_none());
}

#[tokio::test]
async fn concurrent_callbacks_exchange_once() {
    let provider = alice();
    let (app, state) = app(provider.clone());
    let cookie = commence(&app, Some(REFERER)).await;

    let (first, second) = tokio::join!(
        get(&app, FINISH, Some(&cookie), None),
        get(&app, FINISH, Some(&cookie), None),
    );

    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    assert_eq!(first.status(), StatusCode::FOUND);
    assert_eq!(second.status(), StatusCode::FOUND);
    let issued = [&first, &second]
        .into_iter()
        .filter(|r| set_session_cookie(r).is_some())
        .count();
    assert_eq!(issued, 1);
    assert_eq!(state.users.len().await, 1);
}
