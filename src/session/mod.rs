//! Authenticated Netflix session: login-form flow, context refresh, and the
//! JSON API operations layered on top.
//!
//! The service has no public API. Authentication goes through the HTML login
//! form, and everything else depends on state the server embeds in its pages:
//! each authenticated page carries a script-built configuration object with
//! the API routing data and a page-scoped authorization token. One `Netflix`
//! value owns that state; callers serialize their operations on it.

mod api;
mod form;
pub mod models;
mod pagination;
mod sandbox;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::AppError;
use api::{api_request, ApiOptions};
use form::{extract_login_form, selector};
pub use models::{Credentials, Profile, RatingItem, SessionContext};
use models::{ActiveProfileResponse, RatingPage, SetRatingResponse, SwitchProfileResponse};
use sandbox::extract_context_models;

pub const BASE_URL: &str = "https://www.netflix.com";

const LOGIN_PATH: &str = "/login";
const MANAGE_PROFILES_PATH: &str = "/ManageProfiles";
const YOUR_ACCOUNT_PATH: &str = "/YourAccount";

const SWITCH_PROFILE_ENDPOINT: &str = "/profiles/switch";
const PROFILES_ENDPOINT: &str = "/profiles";
const RATING_HISTORY_ENDPOINT: &str = "/ratinghistory";
const SET_VIDEO_RATING_ENDPOINT: &str = "/setVideoRating";
const PATH_EVALUATOR_ENDPOINT: &str = "/pathEvaluator";

/// Namespace object the context pages populate from their inline scripts.
const CONTEXT_NAMESPACE: &str = "netflix";
const LOGIN_ERROR_SELECTOR: &str = ".ui-message-contents";
const DEFAULT_LOGIN_FAILURE: &str = "Login failed";
const AVATAR_URL_PREFIX: &str = "https://secure.netflix.com/ffe/profiles/avatars_v2";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct Netflix {
    base_url: String,
    /// Observes redirects instead of following them; the login POST answers
    /// with a redirect on success and a rendered error page otherwise.
    http: Client,
    /// Follows redirects; context pages bounce through locale and profile
    /// redirects before settling. Shares the cookie jar with `http`.
    http_follow: Client,
    api_root: Option<String>,
    context: Option<SessionContext>,
    auth_tokens: HashMap<&'static str, String>,
    active_profile: Option<String>,
}

impl Netflix {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none())
            .build()?;
        let http_follow = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(jar)
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            http_follow,
            api_root: None,
            context: None,
            auth_tokens: HashMap::new(),
            active_profile: None,
        })
    }

    /// Authenticate and load the session context.
    ///
    /// With credentials the full form flow runs first: fetch the login page,
    /// serialize its form, post it back with the credentials, and expect a
    /// redirect. Without credentials an existing cookie session is reused.
    /// Either way the session is only ready after both context refreshes
    /// (profile management page, then account page) succeed in order; each
    /// page's token is needed by different endpoints.
    pub async fn login(&mut self, credentials: Option<Credentials>) -> Result<(), AppError> {
        if let Some(credentials) = credentials {
            let form = self.fetch_login_form(&credentials).await?;
            self.submit_login_form(&form).await?;
        }
        self.refresh_context(MANAGE_PROFILES_PATH).await?;
        self.refresh_context(YOUR_ACCOUNT_PATH).await?;
        info!("session established");
        Ok(())
    }

    /// Profiles from the current session context. No network call.
    pub fn get_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let context = self.context.as_ref().ok_or(AppError::SessionNotReady)?;
        let model = context.profiles_model.as_ref().ok_or_else(|| {
            AppError::PageStructure("session context has no profiles model".into())
        })?;
        Ok(model.data.profiles.clone())
    }

    /// Switch the account to another profile. The server reports nothing but
    /// a status word, so anything other than `"success"` fails without
    /// further detail and leaves the active profile unchanged.
    pub async fn switch_profile(&mut self, guid: &str) -> Result<(), AppError> {
        let response = api_request(
            &self.http_follow,
            self.api_base()?,
            SWITCH_PROFILE_ENDPOINT,
            ApiOptions::get().query("switchProfileGuid", guid),
        )
        .await?;

        let decoded: SwitchProfileResponse = serde_json::from_value(response.body)?;
        if decoded.status.as_deref() != Some("success") {
            return Err(AppError::UnexpectedResponse);
        }
        self.active_profile = Some(guid.to_string());
        info!(guid, "switched active profile");
        Ok(())
    }

    /// The profile the server currently considers active.
    pub async fn get_active_profile(&self) -> Result<Profile, AppError> {
        let response = api_request(
            &self.http_follow,
            self.api_base()?,
            PROFILES_ENDPOINT,
            ApiOptions::get(),
        )
        .await?;

        let decoded: ActiveProfileResponse = serde_json::from_value(response.body)?;
        Ok(decoded.active)
    }

    /// The full rating history, across however many pages the server reports.
    pub async fn get_rating_history(&self) -> Result<Vec<RatingItem>, AppError> {
        let http = &self.http_follow;
        let api_root = self.api_base()?;

        pagination::collect_rating_history(|page| async move {
            debug!(page, "fetching rating history page");
            let response = api_request(
                http,
                api_root,
                RATING_HISTORY_ENDPOINT,
                ApiOptions::get().query("pg", page),
            )
            .await?;
            Ok(serde_json::from_value::<RatingPage>(response.body)?)
        })
        .await
    }

    /// Rate a title. The server echoes the new rating back; a mismatch means
    /// the mutation did not take.
    pub async fn set_video_rating(&self, title_id: u64, rating: u8) -> Result<(), AppError> {
        let auth_url = self.auth_token(YOUR_ACCOUNT_PATH)?.to_string();
        let response = api_request(
            &self.http_follow,
            self.api_base()?,
            SET_VIDEO_RATING_ENDPOINT,
            ApiOptions::get()
                .query("titleid", title_id)
                .query("rating", rating)
                .query("authURL", auth_url),
        )
        .await?;

        let decoded: SetRatingResponse = serde_json::from_value(response.body)?;
        if decoded.new_rating != Some(f64::from(rating)) {
            return Err(AppError::UnexpectedResponse);
        }
        Ok(())
    }

    /// Change the active profile's avatar through the path evaluator
    /// endpoint. Requires a selected profile.
    pub async fn set_avatar(&self, avatar_name: &str) -> Result<Value, AppError> {
        let guid = self
            .active_profile
            .as_deref()
            .ok_or(AppError::NoActiveProfile)?;
        let auth_url = self.auth_token(MANAGE_PROFILES_PATH)?;

        let body = json!({
            "callPath": ["profiles", guid, "edit"],
            "params": [null, null, null, avatar_name, null],
            "authURL": auth_url,
        });
        let response = api_request(
            &self.http_follow,
            self.api_base()?,
            PATH_EVALUATOR_ENDPOINT,
            ApiOptions::post_json(body).query("method", "call"),
        )
        .await?;

        Ok(response.body)
    }

    /// CDN URL for an avatar name like `icon41`. Size defaults to 320.
    pub fn avatar_url(avatar_name: &str, size: Option<u32>) -> String {
        let size = size.unwrap_or(320);
        let icon = avatar_name.split("icon").nth(1).unwrap_or_default();
        format!("{AVATAR_URL_PREFIX}/{size}x{size}/PICON_{icon}.png")
    }

    /// Base URL for API calls, derived from the last context refresh.
    pub fn api_root(&self) -> Option<&str> {
        self.api_root.as_deref()
    }

    /// Guid of the currently selected profile, if one has been switched to.
    pub fn active_profile(&self) -> Option<&str> {
        self.active_profile.as_deref()
    }

    fn api_base(&self) -> Result<&str, AppError> {
        self.api_root.as_deref().ok_or(AppError::SessionNotReady)
    }

    fn auth_token(&self, page: &str) -> Result<&str, AppError> {
        self.auth_tokens
            .get(page)
            .map(String::as_str)
            .ok_or(AppError::SessionNotReady)
    }

    fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_login_form(
        &self,
        credentials: &Credentials,
    ) -> Result<HashMap<String, String>, AppError> {
        let response = self.http_follow.get(self.page_url(LOGIN_PATH)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::http_status(status));
        }
        let body = response.text().await?;
        extract_login_form(&body, credentials)
    }

    async fn submit_login_form(&self, fields: &HashMap<String, String>) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.page_url(LOGIN_PATH))
            .form(fields)
            .send()
            .await?;

        // Success is a redirect. Anything else re-renders the login page with
        // a user-facing message to scrape out.
        if response.status().is_redirection() {
            return Ok(());
        }
        let body = response.text().await?;
        let message =
            scrape_login_error(&body)?.unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string());
        Err(AppError::Login(message))
    }

    /// Fetch one context page, run its inline scripts in the sandbox, and
    /// replace the session state with what they built: the context object
    /// itself, the derived API root, and the page's authorization token.
    async fn refresh_context(&mut self, path: &'static str) -> Result<(), AppError> {
        let url = self.page_url(path);
        debug!(url, "refreshing session context");

        let response = self.http_follow.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::http_status(status));
        }
        let body = response.text().await?;

        let models = extract_context_models(&body, CONTEXT_NAMESPACE)?;
        let context: SessionContext = serde_json::from_value(models).map_err(|e| {
            AppError::PageStructure(format!("context models have an unexpected shape: {e}"))
        })?;

        let defs = &context.server_defs.data;
        self.api_root = Some(format!("{}/{}", defs.shakti_api_root, defs.build_identifier));
        self.auth_tokens
            .insert(path, context.user_info.data.auth_url.clone());
        self.context = Some(context);
        Ok(())
    }
}

fn scrape_login_error(html: &str) -> Result<Option<String>, AppError> {
    let document = Html::parse_document(html);
    let messages = selector(LOGIN_ERROR_SELECTOR)?;
    Ok(document
        .select(&messages)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A context page whose inline script builds the configuration object the
    /// way the real pages do, plus an external script that must never run.
    fn context_page(api_root: &str, build: &str, auth_url: &str, profiles: Value) -> String {
        format!(
            r#"<html><head>
                 <script src="https://assets.example.com/bundle.js">
                   netflix.reactContext = {{ models: {{ tainted: true }} }};
                 </script>
                 <script>
                   netflix.reactContext = {{ models: {{}} }};
                   netflix.reactContext.models.serverDefs =
                     {{ data: {{ SHAKTI_API_ROOT: "{api_root}", BUILD_IDENTIFIER: "{build}" }} }};
                   netflix.reactContext.models.userInfo = {{ data: {{ authURL: "{auth_url}" }} }};
                   netflix.reactContext.models.profilesModel = {{ data: {{ profiles: {profiles} }} }};
                 </script>
               </head><body></body></html>"#
        )
    }

    fn login_page() -> &'static str {
        r#"<html><body>
             <form action="/login" method="post">
               <input type="hidden" name="flwssn" value="s1">
               <input type="text" name="email" class="login-input-email" value="">
               <input type="password" name="password" value="">
             </form>
           </body></html>"#
    }

    fn profiles_json() -> Value {
        json!([
            { "guid": "g-1", "firstName": "Alice", "isAccountOwner": true },
            { "guid": "g-2", "firstName": "Bob" }
        ])
    }

    async fn context_mocks(server: &mut mockito::Server, api_root: &str) -> [mockito::Mock; 2] {
        let page = context_page(api_root, "v1", "tok-profiles", profiles_json());
        let manage = server
            .mock("GET", "/ManageProfiles")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        let page = context_page(api_root, "v1", "tok-account", profiles_json());
        let account = server
            .mock("GET", "/YourAccount")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        [manage, account]
    }

    async fn logged_in_session(server: &mut mockito::Server) -> Netflix {
        let api_root = server.url();
        let _mocks = context_mocks(server, &api_root).await;
        let mut netflix = Netflix::with_base_url(server.url()).unwrap();
        netflix.login(None).await.unwrap();
        netflix
    }

    #[tokio::test]
    async fn login_with_credentials_posts_the_serialized_form() {
        let mut server = mockito::Server::new_async().await;
        let _form = server
            .mock("GET", "/login")
            .with_status(200)
            .with_body(login_page())
            .create_async()
            .await;
        let post = server
            .mock("POST", "/login")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("flwssn".into(), "s1".into()),
                mockito::Matcher::UrlEncoded("email".into(), "user@example.com".into()),
                mockito::Matcher::UrlEncoded("password".into(), "hunter2".into()),
            ]))
            .with_status(302)
            .with_header("location", "/browse")
            .create_async()
            .await;
        let api_root = server.url();
        let _context = context_mocks(&mut server, &api_root).await;

        let mut netflix = Netflix::with_base_url(server.url()).unwrap();
        netflix
            .login(Some(Credentials {
                email: "user@example.com".to_string(),
                password: "hunter2".to_string(),
            }))
            .await
            .unwrap();

        post.assert_async().await;
        assert!(netflix.api_root().is_some());
    }

    #[tokio::test]
    async fn api_root_is_derived_from_server_defs() {
        let mut server = mockito::Server::new_async().await;
        let page = context_page("https://api.example.com", "v123", "tok", json!([]));
        let _manage = server
            .mock("GET", "/ManageProfiles")
            .with_status(200)
            .with_body(page.clone())
            .create_async()
            .await;
        let _account = server
            .mock("GET", "/YourAccount")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;

        let mut netflix = Netflix::with_base_url(server.url()).unwrap();
        netflix.login(None).await.unwrap();

        assert_eq!(netflix.api_root(), Some("https://api.example.com/v123"));
    }

    #[tokio::test]
    async fn failed_login_surfaces_the_page_message() {
        let mut server = mockito::Server::new_async().await;
        let _form = server
            .mock("GET", "/login")
            .with_status(200)
            .with_body(login_page())
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body(
                r#"<html><body>
                     <div class="ui-message-contents">Wrong password</div>
                   </body></html>"#,
            )
            .create_async()
            .await;

        let mut netflix = Netflix::with_base_url(server.url()).unwrap();
        let err = netflix
            .login(Some(Credentials {
                email: "user@example.com".to_string(),
                password: "nope".to_string(),
            }))
            .await
            .unwrap_err();

        match err {
            AppError::Login(message) => assert_eq!(message, "Wrong password"),
            other => panic!("expected Login error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_login_without_message_uses_the_generic_one() {
        let mut server = mockito::Server::new_async().await;
        let _form = server
            .mock("GET", "/login")
            .with_status(200)
            .with_body(login_page())
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body("<html><body>try again</body></html>")
            .create_async()
            .await;

        let mut netflix = Netflix::with_base_url(server.url()).unwrap();
        let err = netflix
            .login(Some(Credentials {
                email: "user@example.com".to_string(),
                password: "nope".to_string(),
            }))
            .await
            .unwrap_err();

        match err {
            AppError::Login(message) => assert_eq!(message, "Login failed"),
            other => panic!("expected Login error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_profiles_reads_the_stored_context() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let profiles = netflix.get_profiles().unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].first_name.as_deref(), Some("Alice"));
        assert_eq!(profiles[1].guid, "g-2");
    }

    #[tokio::test]
    async fn operations_before_login_fail_with_session_state_error() {
        let netflix = Netflix::with_base_url("http://localhost:1").unwrap();
        assert!(matches!(
            netflix.get_profiles(),
            Err(AppError::SessionNotReady)
        ));
        assert!(matches!(
            netflix.get_active_profile().await,
            Err(AppError::SessionNotReady)
        ));
    }

    #[tokio::test]
    async fn switch_profile_requires_the_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mut netflix = logged_in_session(&mut server).await;

        let _denied = server
            .mock("GET", "/v1/profiles/switch")
            .match_query(mockito::Matcher::UrlEncoded(
                "switchProfileGuid".into(),
                "g-2".into(),
            ))
            .with_status(200)
            .with_body(json!({ "status": "error" }).to_string())
            .create_async()
            .await;

        let err = netflix.switch_profile("g-2").await.unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponse));
        assert_eq!(netflix.active_profile(), None);
    }

    #[tokio::test]
    async fn switch_profile_updates_the_active_profile_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mut netflix = logged_in_session(&mut server).await;

        let _ok = server
            .mock("GET", "/v1/profiles/switch")
            .match_query(mockito::Matcher::UrlEncoded(
                "switchProfileGuid".into(),
                "g-2".into(),
            ))
            .with_status(200)
            .with_body(json!({ "status": "success" }).to_string())
            .create_async()
            .await;

        netflix.switch_profile("g-2").await.unwrap();
        assert_eq!(netflix.active_profile(), Some("g-2"));
    }

    #[tokio::test]
    async fn get_active_profile_returns_the_reported_profile() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let _profiles = server
            .mock("GET", "/v1/profiles")
            .with_status(200)
            .with_body(json!({ "active": { "guid": "g-1", "firstName": "Alice" } }).to_string())
            .create_async()
            .await;

        let active = netflix.get_active_profile().await.unwrap();
        assert_eq!(active.guid, "g-1");
    }

    #[tokio::test]
    async fn rating_history_walks_all_pages() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let _page0 = server
            .mock("GET", "/v1/ratinghistory")
            .match_query(mockito::Matcher::UrlEncoded("pg".into(), "0".into()))
            .with_status(200)
            .with_body(
                json!({
                    "page": 0,
                    "size": 2,
                    "totalRatings": 3,
                    "ratingItems": [
                        { "title": "First", "movieID": 1 },
                        { "title": "Second", "movieID": 2 }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _page1 = server
            .mock("GET", "/v1/ratinghistory")
            .match_query(mockito::Matcher::UrlEncoded("pg".into(), "1".into()))
            .with_status(200)
            .with_body(
                json!({
                    "page": 1,
                    "size": 2,
                    "totalRatings": 3,
                    "ratingItems": [{ "title": "Third", "movieID": 3 }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let items = netflix.get_rating_history().await.unwrap();
        let titles: Vec<_> = items.iter().filter_map(|i| i.title.as_deref()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn set_video_rating_checks_the_echoed_value() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let _ok = server
            .mock("GET", "/v1/setVideoRating")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("titleid".into(), "70123456".into()),
                mockito::Matcher::UrlEncoded("rating".into(), "4".into()),
                mockito::Matcher::UrlEncoded("authURL".into(), "tok-account".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "newRating": 4 }).to_string())
            .create_async()
            .await;

        netflix.set_video_rating(70123456, 4).await.unwrap();
    }

    #[tokio::test]
    async fn set_video_rating_mismatch_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let _mismatch = server
            .mock("GET", "/v1/setVideoRating")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({ "newRating": 2 }).to_string())
            .create_async()
            .await;

        let err = netflix.set_video_rating(70123456, 4).await.unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponse));
    }

    #[tokio::test]
    async fn set_avatar_requires_an_active_profile() {
        let mut server = mockito::Server::new_async().await;
        let netflix = logged_in_session(&mut server).await;

        let err = netflix.set_avatar("icon41").await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveProfile));
    }

    #[tokio::test]
    async fn set_avatar_posts_the_path_evaluator_call() {
        let mut server = mockito::Server::new_async().await;
        let mut netflix = logged_in_session(&mut server).await;

        let _switch = server
            .mock("GET", "/v1/profiles/switch")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "success" }).to_string())
            .create_async()
            .await;
        netflix.switch_profile("g-2").await.unwrap();

        let edit = server
            .mock("POST", "/v1/pathEvaluator")
            .match_query(mockito::Matcher::UrlEncoded("method".into(), "call".into()))
            .match_body(mockito::Matcher::Json(json!({
                "callPath": ["profiles", "g-2", "edit"],
                "params": [null, null, null, "icon41", null],
                "authURL": "tok-profiles",
            })))
            .with_status(200)
            .with_body(json!({ "value": {} }).to_string())
            .create_async()
            .await;

        let result = netflix.set_avatar("icon41").await.unwrap();
        edit.assert_async().await;
        assert_eq!(result, json!({ "value": {} }));
    }

    #[test]
    fn avatar_url_formats_the_icon_id() {
        assert_eq!(
            Netflix::avatar_url("icon41", None),
            "https://secure.netflix.com/ffe/profiles/avatars_v2/320x320/PICON_41.png"
        );
        assert_eq!(
            Netflix::avatar_url("icon7", Some(64)),
            "https://secure.netflix.com/ffe/profiles/avatars_v2/64x64/PICON_7.png"
        );
    }
}
