use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `"name"`, `"-created_at"` or `"name,-created_at"` against a column whitelist.
    pub fn validate_and_parse(spec: &str, allowed: &[&str]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in spec.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (column, sort) = match trimmed.strip_prefix('-') {
                Some(col) => (col, SortDirection::Desc),
                None => (trimmed.strip_prefix('+').unwrap_or(trimmed), SortDirection::Asc),
            };
            if !allowed.contains(&column) {
                return Err(FilterError::UnsortableColumn(column.to_string()));
            }
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direction_prefixes() {
        let infos = FilterOrder::validate_and_parse("name,-created_at", &["name", "created_at"]).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].sort, SortDirection::Desc);
        assert_eq!(FilterOrder::generate(&infos), " ORDER BY \"name\" ASC, \"created_at\" DESC");
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let err = FilterOrder::validate_and_parse("password_hash", &["name"]).unwrap_err();
        assert!(matches!(err, FilterError::UnsortableColumn(_)));
    }
}
