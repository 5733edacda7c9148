use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Eq,
    Neq,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Neq => " <> ",
        }
    }
}

/// Typed bind value; keeps UUID columns compared against UUID parameters
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i64),
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self { FilterValue::Uuid(v) }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self { FilterValue::Text(v) }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self { FilterValue::Text(v.to_string()) }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self { FilterValue::Bool(v) }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self { FilterValue::Int(v) }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: FilterValue,
}

/// Case-insensitive substring match OR'd across `columns`
#[derive(Debug, Clone)]
pub struct FilterSearch {
    pub columns: Vec<String>,
    pub term: String,
}

/// Shared list query parameters: `?search=&page=&limit=&sort=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
