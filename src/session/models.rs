use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login credentials. Consumed once per login attempt, never stored on the
/// session.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The configuration object a context page builds on load, i.e. the
/// `netflix.reactContext.models` subtree. Replaced wholesale on every context
/// refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionContext {
    #[serde(rename = "serverDefs")]
    pub server_defs: Model<ServerDefs>,
    #[serde(rename = "userInfo")]
    pub user_info: Model<UserInfo>,
    #[serde(rename = "profilesModel", default)]
    pub profiles_model: Option<Model<ProfilesData>>,
}

/// Shakti models wrap their payload in a `data` field.
#[derive(Debug, Clone, Deserialize)]
pub struct Model<T> {
    pub data: T,
}

/// Server routing definitions; the API base URL is derived from these.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDefs {
    #[serde(rename = "SHAKTI_API_ROOT")]
    pub shakti_api_root: String,
    #[serde(rename = "BUILD_IDENTIFIER")]
    pub build_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    /// Page-scoped authorization token required by some API endpoints.
    #[serde(rename = "authURL")]
    pub auth_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesData {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// One account profile. Unknown attributes are kept so callers can inspect
/// whatever the page shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub guid: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub is_account_owner: Option<bool>,
    #[serde(default)]
    pub avatar_name: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, Value>,
}

/// One page of the rating history endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPage {
    pub page: u32,
    pub size: u32,
    pub total_ratings: u32,
    #[serde(default)]
    pub rating_items: Vec<RatingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingItem {
    #[serde(default)]
    pub rating_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "movieID", default)]
    pub movie_id: Option<u64>,
    #[serde(default)]
    pub your_rating: Option<f64>,
    #[serde(default)]
    pub int_rating: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub comparable_date: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwitchProfileResponse {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveProfileResponse {
    pub active: Profile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetRatingResponse {
    #[serde(default)]
    pub new_rating: Option<f64>,
}
