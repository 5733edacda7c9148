use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOp, FilterOrderInfo, FilterSearch, FilterValue, FilterWhereInfo, Page};
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::DatabaseError;

/// List query for one table: equality predicates, scope, search, sort and pagination
pub struct Filter {
    table_name: String,
    conditions: Vec<FilterWhereInfo>,
    search: Option<FilterSearch>,
    order: Vec<FilterOrderInfo>,
    page: i64,
    limit: i64,
    offset: i64,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !Self::is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            conditions: vec![],
            search: None,
            order: vec![FilterOrderInfo {
                column: "created_at".to_string(),
                sort: super::types::SortDirection::Desc,
            }],
            page: 1,
            limit: 50,
            offset: 0,
        })
    }

    /// Apply the shared `?search=&page=&limit=&sort=` parameters
    pub fn assign(
        &mut self,
        data: FilterData,
        searchable: &[&str],
        sortable: &[&str],
        api: &ApiConfig,
    ) -> Result<&mut Self, FilterError> {
        if let Some(term) = data.search.as_deref() {
            self.search(searchable, term)?;
        }
        if let Some(sort) = data.sort.as_deref() {
            let order = FilterOrder::validate_and_parse(sort, sortable)?;
            if !order.is_empty() {
                self.order = order;
            }
        }
        self.paginate(data.page, data.limit, api)?;
        Ok(self)
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<&mut Self, FilterError> {
        self.push_condition(column, FilterOp::Eq, value.into())
    }

    pub fn where_eq_opt<V: Into<FilterValue>>(&mut self, column: &str, value: Option<V>) -> Result<&mut Self, FilterError> {
        match value {
            Some(v) => self.where_eq(column, v),
            None => Ok(self),
        }
    }

    pub fn where_neq(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<&mut Self, FilterError> {
        self.push_condition(column, FilterOp::Neq, value.into())
    }

    /// Restrict rows to the caller's district
    pub fn scope_district(&mut self, scope: &DataScope, district_column: &str) -> Result<&mut Self, FilterError> {
        self.where_eq_opt(district_column, scope.district_id())
    }

    /// Restrict rows to the caller's district and team
    pub fn scope_team(&mut self, scope: &DataScope) -> Result<&mut Self, FilterError> {
        self.where_eq_opt("district_id", scope.district_id())?;
        self.where_eq_opt("team_id", scope.team_id())
    }

    pub fn search(&mut self, columns: &[&str], term: &str) -> Result<&mut Self, FilterError> {
        for column in columns {
            Self::validate_column(column)?;
        }
        self.search = Some(FilterSearch {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.to_string(),
        });
        Ok(self)
    }

    pub fn paginate(&mut self, page: Option<i64>, limit: Option<i64>, api: &ApiConfig) -> Result<&mut Self, FilterError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(FilterError::InvalidPage("Page must be 1 or greater".to_string()));
        }
        let limit = limit.unwrap_or(api.default_page_size);
        if limit < 1 {
            return Err(FilterError::InvalidLimit("Limit must be 1 or greater".to_string()));
        }
        if limit > api.max_page_size {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, api.max_page_size);
        }
        let limit = limit.min(api.max_page_size);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| FilterError::InvalidPage(format!("Page {} is out of range", page)))?;
        self.page = page;
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// `SELECT *` with filters and ordering; pagination only when `paginated`
    pub fn select_query(&self, paginated: bool) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM \"{}\"", self.table_name));
        FilterWhere::push(&mut qb, &self.conditions, self.search.as_ref());
        qb.push(FilterOrder::generate(&self.order));
        if paginated {
            qb.push(" LIMIT ");
            qb.push_bind(self.limit);
            qb.push(" OFFSET ");
            qb.push_bind(self.offset);
        }
        qb
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM \"{}\"", self.table_name));
        FilterWhere::push(&mut qb, &self.conditions, self.search.as_ref());
        qb
    }

    pub async fn fetch_page<T>(&self, pool: &PgPool) -> Result<Page<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
    {
        let total: i64 = self.count_query().build_query_scalar::<i64>().fetch_one(pool).await?;
        let items = self.select_query(true).build_query_as::<T>().fetch_all(pool).await?;

        Ok(Page {
            items,
            total,
            page: self.page,
            limit: self.limit,
        })
    }

    /// Every matching row, ignoring pagination
    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = self.select_query(false).build_query_as::<T>().fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let total: i64 = self.count_query().build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(total)
    }

    fn push_condition(&mut self, column: &str, operator: FilterOp, data: FilterValue) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        self.conditions.push(FilterWhereInfo {
            column: column.to_string(),
            operator,
            data,
        });
        Ok(self)
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if Self::is_identifier(column) {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(column.to_string()))
        }
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
