use std::future::Future;

use crate::error::AppError;
use crate::session::models::{RatingItem, RatingPage};

/// Walk the paged rating history until the server-reported totals say there
/// is nothing left.
///
/// The page count is recomputed from every response as
/// `totalRatings / size + 1`, which matches the service's own arithmetic:
/// when the total is an exact multiple of the page size this asks for one
/// trailing page, which comes back empty. The next page index comes from the
/// response's own `page` field, not a local counter. A failed page aborts the
/// whole aggregation; partial results are never returned.
pub(crate) async fn collect_rating_history<F, Fut>(
    mut fetch_page: F,
) -> Result<Vec<RatingItem>, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<RatingPage, AppError>>,
{
    let mut items = Vec::new();
    let mut page = 0u32;
    let mut pages = 1u32;

    while page < pages {
        let fetched = fetch_page(page).await?;
        page = fetched.page + 1;
        if fetched.size > 0 {
            pages = fetched.total_ratings / fetched.size + 1;
        }
        items.extend(fetched.rating_items);
    }

    Ok(items)
}
