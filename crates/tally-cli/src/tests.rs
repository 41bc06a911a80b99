//! CLI command tests

use std::io::Write;
use std::time::Duration;

use tally_core::db::Database;
use tally_core::{Error, DEFAULT_CATEGORY};
use tempfile::NamedTempFile;

use crate::commands::{self, truncate};

const STATEMENT: &str = "date,title,amount\n\
2024-01-03,Netflix,39.90\n\
2024-01-05,Uber - NuPay,12.30\n\
2024-01-09,Uber,25.25\n\
2024-01-10,Mercado Livre - Parcela 1/3,120.00\n\
2024-01-12,Pagamento recebido,-500.00\n\
2024-02-03,Netflix,39.90\n";

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_category(DEFAULT_CATEGORY).unwrap();
    db
}

fn write_statement(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long title", 10), "this is...");
    assert_eq!(truncate("Pão de Açúcar Delivery", 10), "Pão de ...");
}

#[test]
fn test_store_timeout_flag_wins() {
    assert_eq!(commands::store_timeout(Some(250)), Duration::from_millis(250));
}

// ========== Init Tests ==========

#[test]
fn test_cmd_init_seeds_default_category() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");

    commands::cmd_init(&path).unwrap();
    // Running it again is harmless
    commands::cmd_init(&path).unwrap();

    let db = commands::open_db(&path).unwrap();
    let categories = db.list_categories(true).unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, commands::default_category());
}

// ========== Import Tests ==========

#[test]
fn test_import_statement() {
    let db = setup_test_db();
    let file = write_statement(STATEMENT);

    let outcome = commands::import_statement(&db, file.path(), Some(5000)).unwrap();
    assert_eq!(outcome.expenses.len(), 3);
    assert_eq!(outcome.inserted, 3);
    assert_eq!(outcome.matched, 0);
    assert_eq!(outcome.expenses["Uber"].value.to_string(), "37.55");
    assert_eq!(outcome.expenses["Netflix"].value.to_string(), "79.80");
    assert!(outcome.expenses.values().all(|e| e.id > 0));
    assert_eq!(db.list_expenses(true).unwrap().len(), 3);
}

#[test]
fn test_import_twice_matches_existing() {
    let db = setup_test_db();
    let file = write_statement(STATEMENT);

    commands::import_statement(&db, file.path(), Some(5000)).unwrap();
    let second = commands::import_statement(&db, file.path(), Some(5000)).unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.matched, 3);
    assert_eq!(db.list_expenses(true).unwrap().len(), 3);
}

#[test]
fn test_cmd_import_prints_summary() {
    let db = setup_test_db();
    let file = write_statement(STATEMENT);

    assert!(commands::cmd_import(&db, file.path(), None, false).is_ok());
    assert!(commands::cmd_import(&db, file.path(), None, true).is_ok());
}

#[test]
fn test_import_missing_file() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();

    let result = commands::import_statement(&db, &dir.path().join("nope.csv"), None);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to open"));
}

#[test]
fn test_import_malformed_amount_inserts_nothing() {
    let db = setup_test_db();
    let file = write_statement("date,title,amount\n2024-01-03,Netflix,39.90\n2024-01-04,Uber,abc\n");

    let err = commands::import_statement(&db, file.path(), None).unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::Parse { line, .. }) => assert_eq!(*line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(db.list_expenses(true).unwrap().is_empty());
}

#[test]
fn test_import_amount_overflow_inserts_nothing() {
    let db = setup_test_db();
    let file = write_statement(
        "date,title,amount\n2024-01-03,Big,79228162514264337593543950335\n2024-01-04,Big,1\n",
    );

    let err = commands::cmd_import(&db, file.path(), None, false).unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::Parse { line, message }) => {
            assert_eq!(*line, 3);
            assert!(message.contains("overflow"));
        }
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(db.list_expenses(true).unwrap().is_empty());
}

#[test]
fn test_import_without_default_category() {
    let db = Database::in_memory().unwrap();
    let file = write_statement(STATEMENT);

    let err = commands::import_statement(&db, file.path(), None).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Precondition(_))));
    assert!(db.list_expenses(true).unwrap().is_empty());
}

// ========== Category Command Tests ==========

#[test]
fn test_cmd_categories_list() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_list(&db, true).is_ok());
    assert!(commands::cmd_categories_list(&db, false).is_ok());
}

#[test]
fn test_cmd_categories_add_rename_disable() {
    let db = setup_test_db();

    commands::cmd_categories_add(&db, "Streaming").unwrap();
    let category = db.get_category_by_name("Streaming").unwrap().unwrap();

    commands::cmd_categories_rename(&db, category.id, "Assinaturas").unwrap();
    let renamed = db.get_category(category.id).unwrap().unwrap();
    assert_eq!(renamed.name, "Assinaturas");
    assert!(renamed.active);

    commands::cmd_categories_disable(&db, category.id).unwrap();
    assert!(!db.get_category(category.id).unwrap().unwrap().active);
}

#[test]
fn test_cmd_categories_add_duplicate() {
    let db = setup_test_db();
    let result = commands::cmd_categories_add(&db, DEFAULT_CATEGORY);
    assert!(result.is_err());
}

#[test]
fn test_cmd_categories_rename_missing() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_rename(&db, 9999, "Whatever").is_err());
    assert!(commands::cmd_categories_disable(&db, 9999).is_err());
}

// ========== Expense Command Tests ==========

#[test]
fn test_cmd_expenses_add_with_category() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, "Streaming").unwrap();

    commands::cmd_expenses_add(&db, "Netflix", Some("streaming")).unwrap();

    let expenses = db.list_expenses(true).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].title, "Netflix");
    assert_eq!(expenses[0].category.as_deref(), Some("Streaming"));
    assert!(commands::cmd_expenses_list(&db, true).is_ok());
}

#[test]
fn test_cmd_expenses_add_unknown_category() {
    let db = setup_test_db();
    let result = commands::cmd_expenses_add(&db, "Netflix", Some("Nope"));
    assert!(result.is_err());
    assert!(db.list_expenses(true).unwrap().is_empty());
}

#[test]
fn test_cmd_expenses_disable() {
    let db = setup_test_db();
    commands::cmd_expenses_add(&db, "Netflix", None).unwrap();
    let id = db.list_expenses(true).unwrap()[0].id;

    commands::cmd_expenses_disable(&db, id).unwrap();
    assert!(db.list_expenses(true).unwrap().is_empty());
    assert_eq!(db.list_expenses(false).unwrap().len(), 1);
    assert!(commands::cmd_expenses_disable(&db, 9999).is_err());
}
