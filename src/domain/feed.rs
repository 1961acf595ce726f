//! Feed query parameters.

use serde::Deserialize;
use validator::Validate;

use crate::errors::{Error, Result};

pub const MAX_FEED_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw query string as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
}

/// Validated feed request.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct FeedQuery {
    #[validate(range(min = 1, max = 20, message = "limit must be between 1 and 20"))]
    pub limit: u32,
    pub offset: u32,
    pub sort: SortOrder,
    #[validate(length(max = 5, message = "at most 5 tags are allowed"))]
    pub tags: Vec<String>,
    #[validate(length(max = 1000, message = "search must be at most 1000 characters"))]
    pub search: Option<String>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self { limit: MAX_FEED_LIMIT, offset: 0, sort: SortOrder::Desc, tags: Vec::new(), search: None }
    }
}

impl TryFrom<FeedParams> for FeedQuery {
    type Error = Error;

    fn try_from(params: FeedParams) -> Result<Self> {
        let mut query = FeedQuery::default();

        if let Some(limit) = non_empty(params.limit) {
            query.limit = limit
                .parse()
                .map_err(|_| Error::validation_field("limit must be a number", "limit"))?;
        }

        if let Some(offset) = non_empty(params.offset) {
            query.offset = offset
                .parse()
                .map_err(|_| Error::validation_field("offset must be a non-negative number", "offset"))?;
        }

        if let Some(sort) = non_empty(params.sort) {
            query.sort = match sort.to_ascii_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                _ => return Err(Error::validation_field("sort must be asc or desc", "sort")),
            };
        }

        if let Some(tags) = non_empty(params.tags) {
            query.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
        }

        query.search = non_empty(params.search);

        query.validate()?;
        Ok(query)
    }
}

impl FeedQuery {
    /// `ILIKE` pattern for `search`; `\`, `%` and `_` match literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for ch in term.chars() {
                if matches!(ch, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
