//! Search statement planning.

use pg_gateway_mcp::error::DbError;
use pg_gateway_mcp::tools::{SearchPlan, plan_search};

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn zero_text_columns_issue_no_query() {
    match plan_search("counters", &[], "ann").unwrap() {
        SearchPlan::NoTextColumns(message) => {
            assert_eq!(message, "No text columns found in table 'counters' to search.");
        }
        other => panic!("expected a message, got {other:?}"),
    }
}

#[test]
fn name_and_bio_are_or_combined_and_capped() {
    let SearchPlan::Query { sql, pattern } =
        plan_search("people", &columns(&["name", "bio"]), "ann").unwrap()
    else {
        panic!("expected a query");
    };
    assert_eq!(
        sql,
        r#"SELECT * FROM "people" WHERE "name" ILIKE $1 OR "bio" ILIKE $1 LIMIT 50"#
    );
    assert_eq!(pattern, "%ann%");
}

#[test]
fn single_column_has_no_or() {
    let SearchPlan::Query { sql, .. } = plan_search("t", &columns(&["c"]), "x").unwrap() else {
        panic!("expected a query");
    };
    assert!(!sql.contains(" OR "));
}

#[test]
fn unsafe_table_names_are_validation_errors() {
    for table in ["peo ple", "people;", "\"people\"", "public.people", "", "lé"] {
        let err = plan_search(table, &columns(&["name"]), "a").unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }), "{table:?}");
    }
}

#[test]
fn search_term_wildcards_pass_through() {
    let SearchPlan::Query { pattern, .. } =
        plan_search("people", &columns(&["name"]), "50%_off").unwrap()
    else {
        panic!("expected a query");
    };
    assert_eq!(pattern, "%50%_off%");
}
