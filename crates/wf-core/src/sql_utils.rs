//! Identifier and literal escaping shared by every adapter

/// `"ident"`, with embedded double quotes doubled
///
/// ```
/// use wf_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("orders"), r#""orders""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `` `path` `` for BigQuery, where the whole dotted path is quoted once
pub fn quote_backtick(path: &str) -> String {
    format!("`{}`", path.replace('`', "\\`"))
}

/// Body of a single-quoted string literal
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_quote_ident_keeps_dots() {
        assert_eq!(quote_ident("weft.orders"), r#""weft.orders""#);
    }

    #[test]
    fn test_quote_backtick() {
        assert_eq!(quote_backtick("proj.ds.t"), "`proj.ds.t`");
        assert_eq!(quote_backtick("a`b"), "`a\\`b`");
    }

    #[test]
    fn test_escape_sql_string() {
        assert_eq!(escape_sql_string("o'brien"), "o''brien");
    }
}
