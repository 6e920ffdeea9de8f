//! End-to-end tests for the Glitter client.
//!
//! Each test drives a [`Database`] or the lower-level assembly functions
//! against the in-memory [`MockLedger`], which checks sequence numbers the
//! way a chain would and records every broadcast transaction.

use glitter_core::address::Address;
use glitter_core::argument::{Argument, Arguments, ValueType};
use glitter_core::error::{CodecError, StatementError, TransportError};
use glitter_core::result::{decode_rows, TaggedColumn, TaggedRow};
use glitter_core::statement::Statement;
use glitter_core::types::{GrantRole, Msg, SignedTransaction};
use glitter_core::value::Value;
use glitter_tests::helpers::*;
use glitter_wallet::{assemble_and_sign, derive, ChainConfig, Database, Mnemonic, WalletError};

fn open(ledger: MockLedger) -> Database<MockLedger> {
    Database::from_mnemonic(&dev_mnemonic(), 0, ChainConfig::new(CHAIN_ID), ledger).unwrap()
}

fn exec_parts(tx: &SignedTransaction) -> (String, Vec<Argument>) {
    match &tx.body.msgs[0] {
        Msg::SqlExec { sql, arguments, .. } => (sql.clone(), arguments.iter().cloned().collect()),
        other => panic!("expected sql exec, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Statement scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_insert_scenario() {
    let db = open(MockLedger::default());
    let rows = vec![
        vec![("id", Value::from("a")), ("title", Value::from("Book A"))],
        vec![("id", Value::from("b")), ("title", Value::from("Book B"))],
    ];
    db.batch_insert("db", "tbl", &rows).await.unwrap();

    let sent = db.transport().broadcasts();
    assert_eq!(sent.len(), 1);
    let (sql, args) = exec_parts(&sent[0]);
    assert_eq!(sql, "INSERT INTO db.tbl (id,title) VALUES (?,?),(?,?)");
    assert_eq!(
        args,
        vec![
            Argument::from_parts(ValueType::String, "a"),
            Argument::from_parts(ValueType::String, "Book A"),
            Argument::from_parts(ValueType::String, "b"),
            Argument::from_parts(ValueType::String, "Book B"),
        ]
    );
}

#[tokio::test]
async fn update_scenario() {
    let db = open(MockLedger::default());
    db.update("db", "tbl", &[("status", Value::Int(1))], &[("author", Value::from("0xABC"))])
        .await
        .unwrap();

    let (sql, args) = exec_parts(&db.transport().broadcasts()[0]);
    assert_eq!(sql, "UPDATE db.tbl SET status=? WHERE author=?");
    assert_eq!(
        args,
        vec![
            Argument::from_parts(ValueType::Int, "1"),
            Argument::from_parts(ValueType::String, "0xABC"),
        ]
    );
}

#[tokio::test]
async fn delete_with_order_and_limit() {
    let db = open(MockLedger::default());
    db.delete("db", "tbl", &[("author", Value::from("x"))], Some("created_at"), false, 50)
        .await
        .unwrap();
    let (sql, args) = exec_parts(&db.transport().broadcasts()[0]);
    assert_eq!(sql, "DELETE FROM db.tbl WHERE author=? ORDER BY created_at DESC LIMIT 50");
    assert_eq!(args, vec![Argument::from_parts(ValueType::String, "x")]);
}

#[tokio::test]
async fn rejected_statements_never_reach_the_ledger() {
    let db = open(MockLedger::default());
    let none: [(&str, Value); 0] = [];

    let err = db.delete("db", "tbl", &none, None, true, 1).await.unwrap_err();
    assert_eq!(
        err,
        WalletError::Statement(StatementError::EmptyWhereClause { table: "db.tbl".into() })
    );
    let err = db.delete("db", "tbl", &[("id", Value::Int(1))], None, true, 51).await.unwrap_err();
    assert_eq!(err, WalletError::Statement(StatementError::LimitExceeded { limit: 51, max: 50 }));
    let err = db.update("db", "tbl", &none, &[("id", Value::Int(1))]).await.unwrap_err();
    assert_eq!(err, WalletError::Statement(StatementError::EmptyColumnSet));
    let err = db.insert("db", "tbl; DROP", &[("id", Value::Int(1))]).await.unwrap_err();
    assert!(matches!(err, WalletError::Statement(StatementError::InvalidIdentifier(_))));
    let err = db.insert("db", "tbl", &[("a`", Value::Int(1)), ("`b", Value::Int(2))]).await.unwrap_err();
    assert_eq!(err, WalletError::Statement(StatementError::InvalidIdentifier("a`".into())));
    let rows = vec![
        vec![("id", Value::from("a")), ("id", Value::from("b"))],
        vec![("id", Value::from("c")), ("title", Value::from("LOST"))],
    ];
    let err = db.batch_insert("db", "tbl", &rows).await.unwrap_err();
    assert_eq!(err, WalletError::Statement(StatementError::DuplicateColumn("id".into())));

    assert!(db.transport().broadcasts().is_empty());
    assert_eq!(db.transport().account_lookups(), 0);
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn address_derivation_scenario() {
    let (_, address) = derive(&dev_mnemonic(), 0, 0, 60).unwrap();
    assert_eq!(address.to_string(), DEV_ADDRESS);
    assert_eq!(address.to_hex(), DEV_ADDRESS_HEX);

    let (_, second) = derive(&dev_mnemonic(), 0, 1, 60).unwrap();
    assert_eq!(second.to_string(), DEV_ADDRESS_1);

    let abandon = Mnemonic::parse(
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
    )
    .unwrap();
    let (_, address) = derive(&abandon, 0, 0, 60).unwrap();
    assert_eq!(address.to_hex(), "0x9858effd232b4033e47d90003d41ec34ecaeda94");
}

#[test]
fn invalid_mnemonic_rejected() {
    // Valid words, bad checksum.
    let err = Mnemonic::parse(&["abandon"; 12].join(" ")).unwrap_err();
    assert!(matches!(err, WalletError::InvalidMnemonic(_)));
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn consecutive_writes_advance_sequence() {
    let db = open(MockLedger::new(42, 7));
    db.insert("library", "books", &[("id", Value::from("a"))]).await.unwrap();
    db.update("library", "books", &[("title", Value::from("B"))], &[("id", Value::from("a"))])
        .await
        .unwrap();
    let result = db
        .delete("library", "books", &[("id", Value::from("a"))], None, true, 1)
        .await
        .unwrap();
    assert_eq!(result["code"], 0);

    let ledger = db.transport();
    assert_eq!(ledger.sequence(), 10);
    assert_eq!(ledger.account_lookups(), 3);

    let sent = ledger.broadcasts();
    let sequences: Vec<u64> = sent.iter().map(|tx| tx.sequence).collect();
    assert_eq!(sequences, vec![7, 8, 9]);
    for tx in &sent {
        tx.verify().unwrap();
        assert_eq!(tx.account_number, 42);
        assert_eq!(tx.chain_id, CHAIN_ID);
        assert_eq!(tx.body.memo, "sql transaction!");
        assert_eq!(tx.fee.denom, "agli");
        assert_eq!(tx.body.msgs[0].signer(), DEV_ADDRESS);

        let wire = tx.to_wire().unwrap();
        assert_eq!(&SignedTransaction::from_wire(&wire).unwrap(), tx);
    }
    assert_eq!(result["txhash"], sent[2].tx_hash().unwrap());
}

#[tokio::test]
async fn assemble_and_sign_fetches_only_when_needed() {
    let ledger = MockLedger::new(5, 11);
    let config = ChainConfig::new(CHAIN_ID);
    let (signer, _) = derive(&dev_mnemonic(), 0, 0, 60).unwrap();
    let stmt = Statement::new(
        "INSERT INTO db.tbl (id) VALUES (?)",
        Arguments::new().with_value(&Value::Int(9)).unwrap(),
    )
    .unwrap();

    let tx = assemble_and_sign(&config, &ledger, &signer, stmt.clone(), Some(1), Some(2))
        .await
        .unwrap();
    assert_eq!(ledger.account_lookups(), 0);
    assert_eq!((tx.account_number, tx.sequence), (1, 2));
    tx.verify().unwrap();

    let tx = assemble_and_sign(&config, &ledger, &signer, stmt, Some(1), None).await.unwrap();
    assert_eq!(ledger.account_lookups(), 1);
    assert_eq!((tx.account_number, tx.sequence), (1, 11));
}

#[tokio::test]
async fn account_lookup_failure_propagates_unchanged() {
    let ledger = MockLedger::default();
    ledger.fail_lookups(true);
    let db = open(ledger);

    let err = db.insert("db", "tbl", &[("id", Value::Int(1))]).await.unwrap_err();
    assert_eq!(
        err,
        WalletError::Transport(TransportError::new(Some(503), "account service unavailable"))
    );
    assert_eq!(db.transport().account_lookups(), 1);
    assert!(db.transport().broadcasts().is_empty());
}

#[tokio::test]
async fn broadcast_failure_is_not_retried() {
    let ledger = MockLedger::default();
    ledger.fail_broadcasts(true);
    let db = open(ledger);

    let err = db.insert("db", "tbl", &[("id", Value::Int(1))]).await.unwrap_err();
    assert!(matches!(err, WalletError::Transport(TransportError { status: Some(500), .. })));
    assert_eq!(db.transport().account_lookups(), 1);
    assert_eq!(db.transport().sequence(), 0);

    db.transport().fail_broadcasts(false);
    db.insert("db", "tbl", &[("id", Value::Int(1))]).await.unwrap();
    assert_eq!(db.transport().sequence(), 1);
}

#[tokio::test]
async fn grants_carry_role_and_grant_memo() {
    let db = open(MockLedger::default());
    let reader: Address = DEV_ADDRESS_1.parse().unwrap();
    db.grant_reader(&reader, "library", None).await.unwrap();
    db.grant_admin(&reader, "library", Some("books")).await.unwrap();

    let sent = db.transport().broadcasts();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body.memo, "grant transaction!");
    match &sent[1].body.msgs[0] {
        Msg::SqlGrant { uid, to_uid, role, on_database, on_table } => {
            assert_eq!(uid, DEV_ADDRESS);
            assert_eq!(to_uid, DEV_ADDRESS_1);
            assert_eq!(*role, GrantRole::Admin);
            assert_eq!(on_database, "library");
            assert_eq!(on_table.as_deref(), Some("books"));
        }
        other => panic!("expected grant, got {other:?}"),
    }
    assert!(sent.iter().all(|tx| tx.verify().is_ok()));
}

#[tokio::test]
async fn transfer_shares_the_write_sequence() {
    let db = open(MockLedger::default());
    let to: Address = DEV_ADDRESS_1.parse().unwrap();
    db.insert("db", "tbl", &[("id", Value::Int(1))]).await.unwrap();
    db.transfer(&to, 1_000_000).await.unwrap();

    let sent = db.transport().broadcasts();
    assert_eq!(sent.iter().map(|tx| tx.sequence).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(sent[1].body.memo, "ban send transaction!");
    match &sent[1].body.msgs[0] {
        Msg::Send { from, to, amount, denom } => {
            assert_eq!(from, DEV_ADDRESS);
            assert_eq!(to, DEV_ADDRESS_1);
            assert_eq!(*amount, 1_000_000);
            assert_eq!(denom, "agli");
        }
        other => panic!("expected send, got {other:?}"),
    }
    assert!(sent[1].verify().is_ok());
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_decodes_every_tag() {
    let ledger = MockLedger::default();
    ledger.set_rows(vec![TaggedRow::default()
        .with("id", TaggedColumn::new(ValueType::Int, "-3"))
        .with("big", TaggedColumn::new(ValueType::Int, "18446744073709551615"))
        .with("price", TaggedColumn::new(ValueType::Float, "2.5"))
        .with("active", TaggedColumn::new(ValueType::Bool, "True"))
        .with("title", TaggedColumn::new(ValueType::String, "Dune"))
        .with("blob", TaggedColumn::new(ValueType::Bytes, "AAE="))
        .with("raw", TaggedColumn::new(ValueType::Invalid, "as is"))
        .with("geo", TaggedColumn { column_value_type: "PointColumn".into(), value: "1,2".into() })]);
    let db = open(ledger);

    let stmt = Statement::raw("SELECT * FROM db.tbl").unwrap();
    let rows = db.query(&stmt).await.unwrap();
    assert_eq!(db.transport().queries(), vec![stmt]);
    assert!(db.transport().broadcasts().is_empty());

    let row = &rows[0];
    assert_eq!(row["id"], Value::Int(-3));
    assert_eq!(row["big"], Value::Uint(u64::MAX));
    assert_eq!(row["price"], Value::Float(2.5));
    assert_eq!(row["active"], Value::Bool(true));
    assert_eq!(row["title"], Value::from("Dune"));
    assert_eq!(row["blob"], Value::Bytes(vec![0, 1]));
    assert_eq!(row["raw"], Value::from("as is"));
    assert!(!row.contains_key("geo"));
}

#[test]
fn malformed_column_fails_whole_batch() {
    let rows = vec![
        TaggedRow::default().with("n", TaggedColumn::new(ValueType::Int, "1")),
        TaggedRow::default().with("n", TaggedColumn::new(ValueType::Int, "one")),
    ];
    let err = decode_rows(&rows).unwrap_err();
    match err {
        CodecError::Decode { context, .. } => assert_eq!(context, "row 1, column n"),
        other => panic!("unexpected error {other:?}"),
    }
}
