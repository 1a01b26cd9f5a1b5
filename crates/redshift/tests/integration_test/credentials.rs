//! Tests for credential resolution against a fake provider.

use unload_core::{Connection, InMemoryConnectionStore};
use unload_redshift::*;

use crate::fakes::{role_connection, FakeCredentials};

#[tokio::test]
async fn role_arn_skips_key_fetch() {
    let store = InMemoryConnectionStore::new()
        .with(role_connection("aws_default", "arn:aws:iam::123:role/x"));
    let provider = FakeCredentials::new(store);

    let credential = resolve_credential(&provider, Some("aws_default"), None)
        .await
        .unwrap();

    assert_eq!(credentials_clause(&credential), "aws_iam_role=arn:aws:iam::123:role/x");
    assert_eq!(provider.fetches(), 0);
}

#[tokio::test]
async fn connection_without_role_fetches_keys() {
    let store = InMemoryConnectionStore::new().with(Connection::new("aws_default"));
    let provider = FakeCredentials::new(store);

    let credential = resolve_credential(&provider, Some("aws_default"), None)
        .await
        .unwrap();

    assert_eq!(
        credentials_clause(&credential),
        "aws_access_key_id=AKIAFAKE;aws_secret_access_key=fake-secret"
    );
    assert_eq!(provider.fetches(), 1);
}

#[tokio::test]
async fn no_connection_id_goes_straight_to_keys() {
    let mut provider = FakeCredentials::new(InMemoryConnectionStore::new());
    provider.creds.session_token = Some("sts-token".into());

    let credential = resolve_credential(&provider, None, None).await.unwrap();

    assert!(matches!(credential, Credential::KeyPair(_)));
    assert!(credentials_clause(&credential).ends_with(";token=sts-token"));
    assert_eq!(provider.fetches(), 1);
}

#[tokio::test]
async fn each_resolution_fetches_fresh_credentials() {
    let provider = FakeCredentials::new(InMemoryConnectionStore::new());

    resolve_credential(&provider, None, None).await.unwrap();
    resolve_credential(&provider, None, None).await.unwrap();

    assert_eq!(provider.fetches(), 2);
}

#[tokio::test]
async fn missing_connection_propagates() {
    let provider = FakeCredentials::new(InMemoryConnectionStore::new());

    let err = resolve_credential(&provider, Some("aws_default"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::ConnectionNotFound(ref id) if id == "aws_default"));
    assert_eq!(provider.fetches(), 0);
}
