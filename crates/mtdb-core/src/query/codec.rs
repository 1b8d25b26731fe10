//! Query-string codec
//!
//! Renders filter and sort predicates into the `filter_by` / `sort_by`
//! parameters understood by the server. Values are left unescaped here;
//! percent-encoding happens when the transport builds the request URL.

use std::collections::BTreeMap;

use super::{Field, Filter, Sort};

/// Query parameter name → unescaped value
pub type QueryParams = BTreeMap<&'static str, String>;

/// Encode predicates into query parameters.
///
/// Filters are joined as `name[op]=val,...` and sorts as `op(name),...`,
/// preserving input order. An empty list omits its parameter entirely.
pub fn encode<F: Field>(filters: &[Filter<F>], sorts: &[Sort<F>]) -> QueryParams {
    let mut params = QueryParams::new();

    if !filters.is_empty() {
        let clauses: Vec<String> = filters.iter().map(Filter::clause).collect();
        params.insert("filter_by", clauses.join(","));
    }

    if !sorts.is_empty() {
        let clauses: Vec<String> = sorts.iter().map(Sort::clause).collect();
        params.insert("sort_by", clauses.join(","));
    }

    params
}
