//! Isolated evaluation of a page's inline scripts.
//!
//! The configuration object is not shipped as a static JSON blob; the page
//! assembles it imperatively in script on load. So the extraction step runs
//! the page's inline `<script>` blocks inside a bare QuickJS context seeded
//! with empty `window` and namespace objects, then reads the populated object
//! back out. The context gets no host bindings at all: no network, no
//! filesystem, no timers, no module loader. Scripts with a `src` attribute
//! are never executed.

use rquickjs::{CatchResultExt, CaughtError, Context, Runtime};
use scraper::Html;

use crate::error::AppError;
use crate::session::form::selector;

fn js_error_message(caught: CaughtError<'_>) -> String {
    match caught {
        CaughtError::Exception(exception) => exception
            .message()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "JavaScript exception".to_string()),
        CaughtError::Value(_) => "JavaScript exception (non-Error value thrown)".to_string(),
        CaughtError::Error(error) => error.to_string(),
    }
}

/// Collect the text of every inline `<script>` element in document order.
fn inline_scripts(html: &str) -> Result<Vec<String>, AppError> {
    let document = Html::parse_document(html);
    let scripts = selector("script")?;
    Ok(document
        .select(&scripts)
        .filter(|el| el.value().attr("src").is_none())
        .map(|el| el.text().collect::<String>())
        .collect())
}

/// Execute the page's inline scripts and read back
/// `<namespace>.reactContext.models` as JSON.
///
/// A script that throws, or a missing object path afterwards, means the page
/// format changed; both surface as [`AppError::PageStructure`] rather than
/// being ignored.
pub(crate) fn extract_context_models(
    html: &str,
    namespace: &str,
) -> Result<serde_json::Value, AppError> {
    let scripts = inline_scripts(html)?;

    let runtime = Runtime::new()
        .map_err(|e| AppError::PageStructure(format!("failed to create sandbox runtime: {e}")))?;
    let context = Context::full(&runtime)
        .map_err(|e| AppError::PageStructure(format!("failed to create sandbox context: {e}")))?;

    context.with(|ctx| {
        ctx.eval::<(), _>(format!(
            "globalThis.window = {{}}; globalThis.{namespace} = {{}};"
        ))
        .catch(&ctx)
        .map_err(|e| {
            AppError::PageStructure(format!("failed to seed sandbox globals: {}", js_error_message(e)))
        })?;

        for script in &scripts {
            ctx.eval::<(), _>(script.as_str()).catch(&ctx).map_err(|e| {
                AppError::PageStructure(format!("inline script failed: {}", js_error_message(e)))
            })?;
        }

        let readback = format!(
            "if (!globalThis.{namespace}.reactContext || !globalThis.{namespace}.reactContext.models) {{\
               throw new Error('reactContext.models is missing');\
             }}\
             JSON.stringify(globalThis.{namespace}.reactContext.models);"
        );
        let serialized: String = ctx.eval(readback).catch(&ctx).map_err(|e| {
            AppError::PageStructure(format!(
                "context object missing after script evaluation: {}",
                js_error_message(e)
            ))
        })?;

        serde_json::from_str(&serialized)
            .map_err(|e| AppError::PageStructure(format!("context object is not valid JSON: {e}")))
    })
}
