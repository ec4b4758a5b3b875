//! Reporting query over persisted results: filter, sort, paginate.

use serde::Serialize;
use std::cmp::Ordering;

use crate::ClassificationResult;
use crate::engine::log_ops::{LogError, ResultCache};
use crate::utils::config::DEFAULT_PAGE_SIZE;

/// How a filter value is matched (both case-insensitive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Substring match.
    Text,
    /// Exact match.
    Select,
}

/// Columns the reporting layer may filter on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Type,
    Result,
    Url,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Name,
        FilterField::Type,
        FilterField::Result,
        FilterField::Url,
    ];

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterField::Name | FilterField::Url => FilterKind::Text,
            FilterField::Type | FilterField::Result => FilterKind::Select,
        }
    }

    fn value<'r>(&self, r: &'r ClassificationResult) -> &'r str {
        match self {
            FilterField::Name => &r.entity_name,
            FilterField::Type => r.property.as_str(),
            FilterField::Result => r.classification.as_str(),
            FilterField::Url => &r.url,
        }
    }

    fn matches(&self, r: &ClassificationResult, needle_lower: &str) -> bool {
        let value = self.value(r).to_lowercase();
        match self.kind() {
            FilterKind::Text => value.contains(needle_lower),
            FilterKind::Select => value == needle_lower,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Tvl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Parse `column:direction` against the sortable allow-list. Anything else → `tvl:desc`.
pub fn parse_sort(raw: Option<&str>) -> (SortColumn, SortDirection) {
    let default = (SortColumn::Tvl, SortDirection::Desc);
    let Some(raw) = raw else {
        return default;
    };
    let lowered = raw.to_lowercase();
    let Some((column, direction)) = lowered.split_once(':') else {
        return default;
    };
    let column = match column {
        "name" => SortColumn::Name,
        "tvl" => SortColumn::Tvl,
        _ => return default,
    };
    let direction = match direction {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        _ => return default,
    };
    (column, direction)
}

/// One reporting request. Empty filter values are ignored.
#[derive(Clone, Debug, Default)]
pub struct ResultQuery {
    pub filters: Vec<(FilterField, String)>,
    pub sort: Option<String>,
    /// 1-based; defaults to 1.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub rows: Vec<ClassificationResult>,
    pub total_rows: usize,
}

fn compare(a: &ClassificationResult, b: &ClassificationResult, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.entity_name.cmp(&b.entity_name),
        // Missing TVL sorts below every number.
        SortColumn::Tvl => match (a.entity_tvl, b.entity_tvl) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Filter, sort (stable) and slice `records`. `total_rows` counts all filtered rows.
pub fn query_results(records: &[ClassificationResult], query: &ResultQuery) -> ResultPage {
    let filters: Vec<(FilterField, String)> = query
        .filters
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(f, v)| (*f, v.to_lowercase()))
        .collect();

    let mut rows: Vec<&ClassificationResult> = records
        .iter()
        .filter(|r| filters.iter().all(|(f, v)| f.matches(r, v)))
        .collect();

    let (column, direction) = parse_sort(query.sort.as_deref());
    rows.sort_by(|a, b| {
        let ord = compare(a, b, column);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = query
        .page_size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let total_rows = rows.len();
    let rows = rows
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();

    ResultPage { rows, total_rows }
}

/// Run `query` against the current finalized results held by `cache`.
pub fn query_cache(cache: &ResultCache, query: &ResultQuery) -> Result<ResultPage, LogError> {
    let records = cache.get_data()?;
    Ok(query_results(&records, query))
}
