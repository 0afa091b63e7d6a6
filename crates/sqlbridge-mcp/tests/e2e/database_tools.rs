//! Built-in tools against a live Postgres.

use super::common::*;
use serde_json::json;
use sqlbridge_mcp::McpError;

pub async fn test_list_tables(ctx: &TestContext) {
    println!("  🧪 test_list_tables");

    let result = ctx.executor().call("list_tables", &args(json!({}))).await.unwrap();
    assert_success(&result, "list_tables should succeed");

    let data = extract_json(&result).expect("Should have JSON response");
    let names: Vec<_> = data
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["table_name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"customers".to_string()), "{names:?}");
    assert!(names.contains(&"orders".to_string()), "{names:?}");
    assert!(names.contains(&"empty_t".to_string()), "{names:?}");

    println!("     ✓ tables across schemas listed");
}

pub async fn test_describe_table(ctx: &TestContext) {
    println!("  🧪 test_describe_table");

    let executor = ctx.executor();
    let result = executor
        .call("describe_table", &args(json!({ "table_name": "customers" })))
        .await
        .unwrap();
    assert_success(&result, "describe_table should succeed");

    let data = extract_json(&result).unwrap();
    let columns = data.as_array().unwrap();
    assert_eq!(columns[0]["column_name"], "customer_id");
    assert_eq!(columns[1]["column_name"], "name");
    assert_eq!(columns[1]["is_nullable"], "NO");

    let missing = executor
        .call("describe_table", &args(json!({ "table_name": "ghosts" })))
        .await
        .unwrap();
    assert!(missing.is_error);

    println!("     ✓ column metadata returned, unknown table reported");
}

pub async fn test_describe_table_matches_listing(ctx: &TestContext) {
    println!("  🧪 test_describe_table_matches_listing");

    let executor = ctx.executor();
    let orders = executor
        .call("describe_table", &args(json!({ "table_name": "orders" })))
        .await
        .unwrap();
    assert_success(&orders, "table outside current_schema should be described");
    let columns = extract_json(&orders).unwrap();
    assert_eq!(columns.as_array().unwrap().len(), 3);
    assert_eq!(columns[2]["column_name"], "total");

    let empty = executor
        .call("describe_table", &args(json!({ "table_name": "empty_t" })))
        .await
        .unwrap();
    assert_success(&empty, "table without columns exists");
    assert_eq!(extract_json(&empty).unwrap(), json!([]));

    println!("     ✓ other schemas and zero-column tables described");
}

pub async fn test_execute_query_rows(ctx: &TestContext) {
    println!("  🧪 test_execute_query_rows");

    let result = ctx
        .executor()
        .call(
            "execute_query",
            &args(json!({
                "query": "select name, email, lifetime_value, tags, profile from customers order by customer_id"
            })),
        )
        .await
        .unwrap();
    assert_success(&result, "execute_query should succeed");

    let data = extract_json(&result).unwrap();
    assert_eq!(data[0]["name"], "Ada Lovelace");
    assert_eq!(data[0]["lifetime_value"], 15000.0);
    assert_eq!(data[0]["tags"], json!(["vip", "early"]));
    assert_eq!(data[0]["profile"], json!({ "tier": "gold" }));
    assert_eq!(data[1]["email"], json!(null));
    assert_eq!(data[1]["lifetime_value"], 1199.88);

    println!("     ✓ rows normalized to plain JSON");
}

pub async fn test_execute_query_typed_columns(ctx: &TestContext) {
    println!("  🧪 test_execute_query_typed_columns");

    let result = ctx
        .executor()
        .call(
            "execute_query",
            &args(json!({
                "query": "SELECT interval '1 day 02:30:00' AS span, \
                          inet '10.0.0.1' AS host, \
                          cidr '10.0.0.0/8' AS net, \
                          '12.50'::money AS cash, \
                          ARRAY[1.5, 2.5]::float8[] AS weights, \
                          ARRAY[true, false] AS flags, \
                          timetz '12:00:00+02' AS noon, \
                          'happy'::mood AS feeling, \
                          point(1, 2) AS spot"
            })),
        )
        .await
        .unwrap();
    assert_success(&result, "typed select should succeed");

    let text = result.first_text().unwrap();
    assert!(!text.contains("\\u0"), "wire bytes leaked into output: {text}");

    let data = extract_json(&result).unwrap();
    let row = &data[0];
    assert_eq!(row["span"], "P1DT2H30M");
    assert_eq!(row["host"], "10.0.0.1");
    assert_eq!(row["net"], "10.0.0.0/8");
    assert_eq!(row["cash"], 12.5);
    assert_eq!(row["weights"], json!([1.5, 2.5]));
    assert_eq!(row["flags"], json!([true, false]));
    assert_eq!(row["noon"], "12:00:00+02:00");
    assert_eq!(row["feeling"], "happy");
    assert_eq!(row["spot"], json!(null));

    println!("     ✓ non-text column types rendered as JSON");
}

pub async fn test_execute_query_rejects_writes(ctx: &TestContext) {
    println!("  🧪 test_execute_query_rejects_writes");

    let err = ctx
        .executor()
        .call("execute_query", &args(json!({ "query": "DELETE FROM customers" })))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ForbiddenOperation { .. }));

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM customers")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    println!("     ✓ DELETE refused, rows intact");
}

pub async fn test_execute_update(ctx: &TestContext) {
    println!("  🧪 test_execute_update");

    let executor = ctx.executor();
    let result = executor
        .call(
            "execute_update",
            &args(json!({ "query": "UPDATE customers SET email = 'grace@example.com' WHERE email IS NULL" })),
        )
        .await
        .unwrap();
    assert_success(&result, "execute_update should succeed");
    assert_eq!(extract_json(&result).unwrap(), json!({ "rowsAffected": 1 }));

    let failed = executor
        .call("execute_update", &args(json!({ "query": "INSERT INTO nowhere VALUES (1)" })))
        .await
        .unwrap();
    assert!(failed.is_error);
    assert!(failed.first_text().unwrap().starts_with("Error executing update:"));

    println!("     ✓ rowsAffected reported, failures returned as results");
}

pub async fn test_execute_update_single_statement(ctx: &TestContext) {
    println!("  🧪 test_execute_update_single_statement");

    let result = ctx
        .executor()
        .call(
            "execute_update",
            &args(json!({
                "query": "INSERT INTO customers (name) VALUES ('Mallory'); TRUNCATE customers CASCADE"
            })),
        )
        .await
        .unwrap();
    assert!(result.is_error, "batched statements must fail: {result:?}");

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM customers")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    println!("     ✓ trailing statement refused, rows intact");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📦 Database tools");
    test_list_tables(ctx).await;
    test_describe_table(ctx).await;
    test_describe_table_matches_listing(ctx).await;
    test_execute_query_rows(ctx).await;
    test_execute_query_typed_columns(ctx).await;
    test_execute_query_rejects_writes(ctx).await;
    test_execute_update_single_statement(ctx).await;
    test_execute_update(ctx).await;
}
