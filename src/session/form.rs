use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;
use crate::session::models::Credentials;

/// Marker the login page puts on its email input.
const EMAIL_INPUT_SELECTOR: &str = ".login-input-email";

pub(crate) fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::PageStructure(format!("invalid selector `{css}`: {e}")))
}

/// Serialize the login form surrounding the email input and overwrite the
/// credential fields.
///
/// The server pre-fills hidden fields (flow state, locale, action tokens)
/// that must be posted back untouched; everything except `email` and
/// `password` is kept at its rendered value. Duplicate field names take the
/// last-seen value. A page without that form is a structural failure, not
/// something to paper over with defaults.
pub(crate) fn extract_login_form(
    html: &str,
    credentials: &Credentials,
) -> Result<HashMap<String, String>, AppError> {
    let document = Html::parse_document(html);

    let marker = selector(EMAIL_INPUT_SELECTOR)?;
    let email_input = document
        .select(&marker)
        .next()
        .ok_or_else(|| AppError::PageStructure("login page has no email input".into()))?;

    let form = email_input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .ok_or_else(|| AppError::PageStructure("email input is not inside a form".into()))?;

    let inputs = selector("input")?;
    let mut fields = HashMap::new();
    for input in form.select(&inputs) {
        if let Some(name) = input.value().attr("name") {
            let value = input.value().attr("value").unwrap_or_default();
            fields.insert(name.to_string(), value.to_string());
        }
    }

    fields.insert("email".to_string(), credentials.email.clone());
    fields.insert("password".to_string(), credentials.password.clone());

    Ok(fields)
}
