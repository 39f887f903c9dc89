use domain::Id;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// `next_cursor` from the previous page.
    #[param(value_type = Option<Uuid>)]
    pub(crate) cursor: Option<Id>,
    /// Page size, 1 to 100. Defaults to 20.
    pub(crate) limit: Option<u64>,
}
