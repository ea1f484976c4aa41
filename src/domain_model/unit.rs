use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct PageSize(pub u16);

impl PageSize {
    /// Page size of the post feeds unless configured otherwise.
    pub const FEED_DEFAULT: PageSize = PageSize(10);
}
