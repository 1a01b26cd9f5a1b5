//! End-to-end tests for RedshiftToS3::execute with recording backends.

use serde_json::json;
use unload_core::{Connection, InMemoryConnectionStore};
use unload_redshift::*;

use crate::fakes::{role_connection, Call, FakeCredentials, Recorder};

const ARN: &str = "arn:aws:iam::123:role/x";

fn role_provider() -> FakeCredentials {
    FakeCredentials::new(InMemoryConnectionStore::new().with(role_connection("aws_default", ARN)))
}

#[tokio::test]
async fn sql_backend_receives_statement() {
    let mut params = UnloadParams::new("my-bucket", "exports")
        .table("public", "orders")
        .unload_options(["CSV"]);
    params.include_header = true;
    params.autocommit = true;
    let task = RedshiftToS3::new(params).unwrap();

    let recorder = Recorder::default();
    let provider = role_provider();
    task.execute(&recorder, &provider).await.unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let Call::Sql { statement, autocommit, parameters } = &calls[0] else {
        panic!("expected SQL backend, got {:?}", calls[0]);
    };

    assert!(*autocommit);
    assert_eq!(*parameters, None);
    assert_eq!(
        statement,
        "UNLOAD ($$SELECT * FROM public.orders$$)\n\
         TO 's3://my-bucket/exports/orders_'\n\
         credentials\n\
         'aws_iam_role=arn:aws:iam::123:role/x'\n\
         CSV\n\t\t\tHEADER;"
    );
    assert_eq!(*recorder.requested_conn_ids.lock().unwrap(), vec!["redshift_default"]);
    assert_eq!(provider.fetches(), 0);
}

#[tokio::test]
async fn data_api_backend_receives_options_and_parameters() {
    let mut params = UnloadParams::new("my-bucket", "exports/daily.csv")
        .select_query("SELECT * FROM sales WHERE day = :day");
    params.table_as_file_name = false;
    params.redshift_conn_id = "redshift_data".into();
    params.parameters = Some(QueryParameters::Named(
        json!({ "day": "2024-01-01" }).as_object().unwrap().clone(),
    ));
    params.data_api_options.insert("database".into(), json!("dev"));
    params.data_api_options.insert("workgroup_name".into(), json!("analytics"));
    let task = RedshiftToS3::new(params).unwrap();

    let recorder = Recorder::default();
    task.execute(&recorder, &role_provider()).await.unwrap();

    let calls = recorder.calls();
    let Call::DataApi { sql, parameters, options } = &calls[0] else {
        panic!("expected Data API backend, got {:?}", calls[0]);
    };

    assert!(sql.starts_with("UNLOAD ($$SELECT * FROM sales WHERE day = :day$$)"));
    assert!(sql.contains("TO 's3://my-bucket/exports/daily.csv'"));
    assert!(matches!(parameters, Some(QueryParameters::Named(m)) if m["day"] == "2024-01-01"));
    assert_eq!(options["database"], "dev");
    assert_eq!(options["workgroup_name"], "analytics");
    assert!(!options.contains_key("sql"));
    assert_eq!(*recorder.requested_conn_ids.lock().unwrap(), vec!["redshift_data"]);
}

#[tokio::test]
async fn key_pair_credentials_rendered_into_statement() {
    let mut provider =
        FakeCredentials::new(InMemoryConnectionStore::new().with(Connection::new("aws_default")));
    provider.creds.session_token = Some("tok".into());

    let task = RedshiftToS3::new(UnloadParams::new("b", "k").select_query("SELECT 1")).unwrap();
    let recorder = Recorder::default();
    task.execute(&recorder, &provider).await.unwrap();

    let calls = recorder.calls();
    let Call::Sql { statement, autocommit, .. } = &calls[0] else {
        panic!("expected SQL backend");
    };
    assert!(!*autocommit);
    assert!(statement.contains(
        "'aws_access_key_id=AKIAFAKE;aws_secret_access_key=fake-secret;token=tok'"
    ));
    assert_eq!(provider.fetches(), 1);
}

#[tokio::test]
async fn doubled_quotes_unescaped_before_submission() {
    let task = RedshiftToS3::new(
        UnloadParams::new("b", "k").select_query("SELECT * FROM t WHERE name = ''O'Brien''"),
    )
    .unwrap();

    let recorder = Recorder::default();
    task.execute(&recorder, &role_provider()).await.unwrap();

    let calls = recorder.calls();
    let Call::Sql { statement, .. } = &calls[0] else {
        panic!("expected SQL backend");
    };
    assert!(statement.starts_with("UNLOAD ($$SELECT * FROM t WHERE name = 'O'Brien'$$)"));
    assert!(statement.trim().ends_with(';'));
}

#[tokio::test]
async fn backend_error_propagates_unchanged() {
    let recorder = Recorder::default();
    *recorder.fail_with.lock().unwrap() = Some("permission denied for relation orders".into());

    let task = RedshiftToS3::new(UnloadParams::new("b", "k").select_query("SELECT 1")).unwrap();
    let err = task.execute(&recorder, &role_provider()).await.unwrap_err();

    match err {
        ExecutionError::StatementFailed { statement_id, reason } => {
            assert_eq!(statement_id, "fake-1");
            assert_eq!(reason, "permission denied for relation orders");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn credential_error_stops_before_submission() {
    let mut provider = FakeCredentials::new(InMemoryConnectionStore::new());
    provider.fail_fetch = true;

    let mut params = UnloadParams::new("b", "k").select_query("SELECT 1");
    params.aws_conn_id = None;
    let task = RedshiftToS3::new(params).unwrap();

    let recorder = Recorder::default();
    let err = task.execute(&recorder, &provider).await.unwrap_err();

    assert!(matches!(err, ExecutionError::Credentials(ref m) if m == "token expired"));
    assert!(recorder.calls().is_empty());
}

#[test]
fn job_file_deserializes_from_toml() {
    let job = r#"
        s3_bucket = "analytics-exports"
        s3_key = "daily"
        schema = "public"
        table = "orders"
        unload_options = ["CSV", "PARALLEL OFF"]
        include_header = true

        [data_api_options]
        database = "dev"
        cluster_identifier = "analytics"
    "#;

    let params: UnloadParams = toml::from_str(job).unwrap();
    let task = RedshiftToS3::new(params).unwrap();

    assert_eq!(task.s3_key(), "daily/orders_");
    assert_eq!(task.unload_options(), ["CSV", "PARALLEL OFF", "HEADER"]);
    assert!(task.uses_data_api());
}
