use sqlx::{Postgres, QueryBuilder};

use super::types::{FilterSearch, FilterValue, FilterWhereInfo};

pub struct FilterWhere;

impl FilterWhere {
    /// Append ` WHERE ...` for the given conditions; nothing is written when both are empty.
    pub fn push(
        qb: &mut QueryBuilder<'static, Postgres>,
        conditions: &[FilterWhereInfo],
        search: Option<&FilterSearch>,
    ) {
        let mut first = true;

        for condition in conditions {
            qb.push(Self::joiner(&mut first));
            qb.push(format!("\"{}\"", condition.column));
            qb.push(condition.operator.to_sql());
            Self::push_value(qb, &condition.data);
        }

        if let Some(search) = search {
            if search.columns.is_empty() || search.term.trim().is_empty() {
                return;
            }
            let pattern = format!("%{}%", Self::escape_like(search.term.trim()));
            qb.push(Self::joiner(&mut first));
            qb.push("(");
            for (i, column) in search.columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("\"{}\" ILIKE ", column));
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    fn joiner(first: &mut bool) -> &'static str {
        if std::mem::replace(first, false) {
            " WHERE "
        } else {
            " AND "
        }
    }

    fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
        match value {
            FilterValue::Uuid(v) => qb.push_bind(*v),
            FilterValue::Text(v) => qb.push_bind(v.clone()),
            FilterValue::Bool(v) => qb.push_bind(*v),
            FilterValue::Int(v) => qb.push_bind(*v),
        };
    }

    pub fn escape_like(term: &str) -> String {
        let mut out = String::with_capacity(term.len());
        for c in term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FilterOp;
    use uuid::Uuid;

    #[test]
    fn renders_conditions_and_search_group() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM \"doctors\"");
        let conditions = vec![
            FilterWhereInfo { column: "district_id".into(), operator: FilterOp::Eq, data: Uuid::nil().into() },
            FilterWhereInfo { column: "is_active".into(), operator: FilterOp::Neq, data: false.into() },
        ];
        let search = FilterSearch { columns: vec!["name".into(), "email".into()], term: "smith".into() };

        FilterWhere::push(&mut qb, &conditions, Some(&search));

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"doctors\" WHERE \"district_id\" = $1 AND \"is_active\" <> $2 AND (\"name\" ILIKE $3 OR \"email\" ILIKE $4)"
        );
    }

    #[test]
    fn blank_search_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM \"cities\"");
        let search = FilterSearch { columns: vec!["name".into()], term: "  ".into() };
        FilterWhere::push(&mut qb, &[], Some(&search));
        assert_eq!(qb.sql(), "SELECT * FROM \"cities\"");
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(FilterWhere::escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
