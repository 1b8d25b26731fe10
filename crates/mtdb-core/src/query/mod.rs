//! Query expressions
//!
//! Every resource kind has a statically declared attribute namespace (see
//! [`fields`]). Comparing an attribute yields a [`Filter`] value and ordering
//! on it yields a [`Sort`] value; both are plain data that can be collected
//! into a [`Query`] and rendered by the [`codec`].

pub mod codec;
pub mod fields;

use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

pub use codec::{encode, QueryParams};

/// An attribute of a resource's query namespace
pub trait Field:
    Copy + Eq + fmt::Debug + FromStr<Err = ModelError> + Send + Sync + 'static
{
    /// Resource kind this namespace belongs to (e.g. "sensor")
    const RESOURCE: &'static str;

    /// Wire name of the attribute
    fn as_str(&self) -> &'static str;

    /// Every attribute declared for the resource
    fn all() -> &'static [Self];

    /// Look up an attribute by its wire name
    fn parse(name: &str) -> ModelResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| ModelError::UnknownAttribute {
                resource: Self::RESOURCE,
                name: name.to_string(),
            })
    }
}

/// Comparison operator of a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Substring match
    Contains,
}

impl FilterOp {
    /// Operator token used in `filter_by`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Contains => "co",
        }
    }
}

impl FromStr for FilterOp {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "eq" => Ok(Self::Eq),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "co" => Ok(Self::Contains),
            other => Err(ModelError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a sort predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOp {
    Asc,
    Desc,
}

impl SortOp {
    /// Operator token used in `sort_by`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOp {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ModelError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for SortOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter predicate `{name, op, val}`
///
/// The value is coerced to its string representation when the predicate is
/// built, so predicates compare and encode deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter<F> {
    pub field: F,
    pub op: FilterOp,
    pub val: String,
}

impl<F: Field> Filter<F> {
    pub fn new(field: F, op: FilterOp, val: impl fmt::Display) -> Self {
        Self {
            field,
            op,
            val: val.to_string(),
        }
    }

    /// Attribute name
    pub fn name(&self) -> &'static str {
        self.field.as_str()
    }

    /// Render as `name[op]=val`
    pub fn clause(&self) -> String {
        format!("{}[{}]={}", self.name(), self.op, self.val)
    }
}

impl<F: Field> FromStr for Filter<F> {
    type Err = ModelError;

    /// Parse a `name[op]=val` clause
    fn from_str(s: &str) -> ModelResult<Self> {
        let invalid = |message: &str| ModelError::InvalidClause {
            clause: s.to_string(),
            message: message.to_string(),
        };

        let (lhs, val) = s.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let (name, op) = lhs
            .strip_suffix(']')
            .and_then(|l| l.split_once('['))
            .ok_or_else(|| invalid("expected name[op]"))?;

        Ok(Self {
            field: F::parse(name.trim())?,
            op: op.parse()?,
            val: val.to_string(),
        })
    }
}

/// A sort predicate `{name, op}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort<F> {
    pub field: F,
    pub op: SortOp,
}

impl<F: Field> Sort<F> {
    pub fn new(field: F, op: SortOp) -> Self {
        Self { field, op }
    }

    /// Attribute name
    pub fn name(&self) -> &'static str {
        self.field.as_str()
    }

    /// Render as `op(name)`
    pub fn clause(&self) -> String {
        format!("{}({})", self.op, self.name())
    }
}

impl<F: Field> FromStr for Sort<F> {
    type Err = ModelError;

    /// Parse an `op(name)` clause
    fn from_str(s: &str) -> ModelResult<Self> {
        let (op, name) = s
            .trim()
            .strip_suffix(')')
            .and_then(|l| l.split_once('('))
            .ok_or_else(|| ModelError::InvalidClause {
                clause: s.to_string(),
                message: "expected op(name)".to_string(),
            })?;

        Ok(Self {
            field: F::parse(name.trim())?,
            op: op.parse()?,
        })
    }
}

/// One page request against a resource collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query<F> {
    pub filters: Vec<Filter<F>>,
    pub sorts: Vec<Sort<F>>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl<F> Default for Query<F> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sorts: Vec::new(),
            skip: None,
            limit: None,
        }
    }
}

impl<F: Field> Query<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter predicate
    pub fn filter(mut self, filter: Filter<F>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort predicate
    pub fn sort(mut self, sort: Sort<F>) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render into query parameters (`filter_by`, `sort_by`, `skip`, `limit`)
    pub fn params(&self) -> QueryParams {
        let mut params = encode(&self.filters, &self.sorts);
        if let Some(skip) = self.skip {
            params.insert("skip", skip.to_string());
        }
        if let Some(limit) = self.limit {
            params.insert("limit", limit.to_string());
        }
        params
    }
}
