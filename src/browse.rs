// Read-side projections: firm list and firm detail
//
// Nothing here touches the vote flow; failures degrade to a presentable
// value instead of an error.

use tracing::warn;

use crate::api::RankingApi;
use crate::error::Result;
use crate::firm::{filter_firms, CategoryFilter, Firm, FirmDetail, FirmId};

/// Upper bound on comments shown on a firm page
pub const DETAIL_COMMENT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum FirmView {
    Found(FirmDetail),
    NotFound(FirmId),
    Unavailable(String),
}

/// All firms, optionally narrowed to one category
pub fn list_firms(api: &dyn RankingApi, filter: &CategoryFilter) -> Result<Vec<Firm>> {
    let firms = api.firms()?;
    Ok(filter_firms(&firms, filter))
}

pub fn load_firm(api: &dyn RankingApi, id: FirmId) -> FirmView {
    match api.firm(id) {
        Ok(Some(mut detail)) => {
            detail.comments.truncate(DETAIL_COMMENT_LIMIT);
            FirmView::Found(detail)
        }
        Ok(None) => FirmView::NotFound(id),
        Err(e) => {
            warn!(%id, error = %e, "Firm detail request failed");
            FirmView::Unavailable(e.to_string())
        }
    }
}
