use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::error::AppError;

/// Caller-supplied pieces of one API request. Method defaults to GET and the
/// response is always decoded as JSON.
#[derive(Debug)]
pub(crate) struct ApiOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            query: Vec::new(),
            body: None,
        }
    }
}

impl ApiOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug)]
pub(crate) struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Issue one request against the derived API root and classify the outcome:
/// transport failures propagate verbatim, a 500 carrying a JSON `errorCode`
/// becomes [`AppError::Api`], any other non-200 becomes [`AppError::Http`],
/// and a 200 yields the decoded body.
pub(crate) async fn api_request(
    http: &Client,
    api_root: &str,
    endpoint: &str,
    options: ApiOptions,
) -> Result<ApiResponse, AppError> {
    let url = format!("{api_root}{endpoint}");
    let mut request = http.request(options.method, &url);
    if !options.query.is_empty() {
        request = request.query(&options.query);
    }
    if let Some(body) = &options.body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        if let Ok(decoded) = serde_json::from_str::<Value>(&text) {
            if let Some(code) = decoded.get("errorCode").and_then(Value::as_str) {
                return Err(AppError::Api(code.to_string()));
            }
        }
    }
    if status != StatusCode::OK {
        return Err(AppError::http_status(status));
    }

    let body: Value = serde_json::from_str(&text)?;
    Ok(ApiResponse { status, body })
}
