//! Reconciliation of aggregated expenses against the catalogue
//!
//! The pipeline for one statement upload:
//! 1. Parse and aggregate rows by canonical title (`import`)
//! 2. Enrich each title with its catalogue identity and category (`reconcile`)
//! 3. Insert unseen titles under the fallback category in one batch (`insert_new`)
//!
//! Each stage is all-or-nothing. An error from any stage is returned as-is and
//! no partially enriched map is handed back.

use std::io::Read;

use crate::context::IngestContext;
use crate::error::{Error, Result};
use crate::import::aggregate_statement;
use crate::models::ExpenseMap;
use crate::normalize::TitleRules;
use crate::store::ExpenseStore;

/// Category assigned to expenses seen for the first time
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Result of matching an aggregated map against the catalogue
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub expenses: ExpenseMap,
    /// At least one title is not in the catalogue yet
    pub has_new: bool,
    pub matched: usize,
}

/// Look up every title and copy identity, category and lifecycle flag from
/// the stored record. Summed values are kept.
pub fn reconcile<S>(mut expenses: ExpenseMap, store: &S, ctx: &IngestContext) -> Result<Reconciled>
where
    S: ExpenseStore + ?Sized,
{
    let mut has_new = false;
    let mut matched = 0;

    for (title, expense) in expenses.iter_mut() {
        ctx.checkpoint("reconciliation")?;
        match store.find_expense_by_title(title, ctx)? {
            Some(stored) => {
                expense.id = stored.id;
                expense.active = stored.active;
                expense.category = stored.category;
                expense.category_id = stored.category_id;
                matched += 1;
            }
            None => has_new = true,
        }
    }

    Ok(Reconciled {
        expenses,
        has_new,
        matched,
    })
}

/// Persist every transient expense under the fallback category
///
/// The category is resolved only when there is something to insert, and
/// before the batch opens. The map is updated only after the batch commits.
/// Returns the number of inserted expenses.
pub fn insert_new<S>(
    expenses: &mut ExpenseMap,
    store: &S,
    default_category: &str,
    ctx: &IngestContext,
) -> Result<usize>
where
    S: ExpenseStore + ?Sized,
{
    let titles: Vec<&str> = expenses
        .values()
        .filter(|e| !e.is_persisted())
        .map(|e| e.title.as_str())
        .collect();
    if titles.is_empty() {
        return Ok(0);
    }

    let category = store
        .find_category_by_name(default_category, ctx)?
        .ok_or_else(|| {
            Error::Precondition(format!(
                "default category '{}' does not exist",
                default_category
            ))
        })?;

    ctx.checkpoint("batch insert")?;
    let ids = store.insert_expenses_batch(&titles, category.id, ctx)?;
    if ids.len() != titles.len() {
        return Err(Error::InvalidData(format!(
            "batch insert returned {} ids for {} expenses",
            ids.len(),
            titles.len()
        )));
    }

    let assigned: Vec<(String, i64)> = titles
        .into_iter()
        .map(str::to_string)
        .zip(ids)
        .collect();
    let inserted = assigned.len();

    for (title, id) in assigned {
        if let Some(expense) = expenses.get_mut(&title) {
            expense.id = id;
            expense.category = Some(category.name.clone());
            expense.category_id = Some(category.id);
            expense.active = true;
        }
    }

    Ok(inserted)
}

/// Options for a statement ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub rules: TitleRules,
    /// Name of the category that new expenses are filed under
    pub default_category: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            rules: TitleRules::default(),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Enriched expenses from one statement plus what happened to them
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Every expense on the statement, keyed by title, all persisted
    pub expenses: ExpenseMap,
    /// Titles that were already in the catalogue
    pub matched: usize,
    /// Titles inserted by this run
    pub inserted: usize,
}

/// Parse, aggregate, reconcile and persist one statement
pub fn ingest_statement<R, S>(
    reader: R,
    store: &S,
    options: &IngestOptions,
    ctx: &IngestContext,
) -> Result<IngestOutcome>
where
    R: Read,
    S: ExpenseStore + ?Sized,
{
    let aggregated = aggregate_statement(reader, &options.rules, ctx)?;
    if aggregated.is_empty() {
        return Ok(IngestOutcome {
            expenses: aggregated,
            matched: 0,
            inserted: 0,
        });
    }

    let Reconciled {
        mut expenses,
        has_new,
        matched,
    } = reconcile(aggregated, store, ctx)?;

    let inserted = if has_new {
        insert_new(&mut expenses, store, &options.default_category, ctx)?
    } else {
        0
    };

    Ok(IngestOutcome {
        expenses,
        matched,
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::aggregate;
    use crate::import::StatementReader;
    use crate::test_utils::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn aggregated(csv: &str) -> ExpenseMap {
        let rows = StatementReader::new(csv.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();
        aggregate(rows, &TitleRules::default()).unwrap()
    }

    const STATEMENT: &str = "date,title,amount\n\
        2024-01-05,Netflix - Parcela 2/3,39.90\n\
        2024-02-05,Netflix - Parcela 3/3,39.90\n\
        2024-02-06,Uber,15.20\n\
        2024-02-07,Pagamento recebido,-150.00\n";

    // ========== Reconcile Tests ==========

    #[test]
    fn test_reconcile_copies_stored_fields() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let streaming = store.add_category("Streaming");
        let stored = store.add_expense("Netflix", Some(&streaming), false);

        let result = reconcile(aggregated(STATEMENT), &store, &IngestContext::new()).unwrap();

        let netflix = &result.expenses["Netflix"];
        assert_eq!(netflix.id, stored.id);
        assert!(!netflix.active);
        assert_eq!(netflix.category.as_deref(), Some("Streaming"));
        assert_eq!(netflix.category_id, Some(streaming.id));
        assert_eq!(netflix.value, dec("79.80"));

        assert_eq!(result.expenses["Uber"].id, 0);
        assert!(result.has_new);
        assert_eq!(result.matched, 1);
        assert_eq!(store.lookups.get(), 2);
    }

    #[test]
    fn test_reconcile_all_known_has_no_new() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        store.add_expense("Netflix", None, true);
        store.add_expense("Uber", None, true);

        let result = reconcile(aggregated(STATEMENT), &store, &IngestContext::new()).unwrap();
        assert!(!result.has_new);
        assert_eq!(result.matched, 2);
        assert_eq!(store.expense_count(), 2);
    }

    #[test]
    fn test_reconcile_lookup_failure_aborts() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        *store.fail_lookup_on.borrow_mut() = Some("Netflix".to_string());

        let err = reconcile(aggregated(STATEMENT), &store, &IngestContext::new()).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    // ========== Insert Tests ==========

    #[test]
    fn test_insert_new_assigns_ids_and_category() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let ctx = IngestContext::new();
        let Reconciled { mut expenses, .. } =
            reconcile(aggregated(STATEMENT), &store, &ctx).unwrap();

        let inserted = insert_new(&mut expenses, &store, DEFAULT_CATEGORY, &ctx).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(store.batches.get(), 1);
        for expense in expenses.values() {
            assert!(expense.is_persisted());
            assert!(expense.active);
            assert_eq!(expense.category.as_deref(), Some(DEFAULT_CATEGORY));
        }
        assert_eq!(expenses["Netflix"].id, store.get("Netflix").unwrap().id);
    }

    #[test]
    fn test_insert_new_skips_when_nothing_is_transient() {
        let store = MemoryStore::new();
        store.add_expense("Uber", None, true);
        let ctx = IngestContext::new();
        let Reconciled { mut expenses, .. } =
            reconcile(aggregated("d,t,a\n1,Uber,2.00\n"), &store, &ctx).unwrap();

        // No fallback category exists, but none is needed
        assert_eq!(insert_new(&mut expenses, &store, DEFAULT_CATEGORY, &ctx).unwrap(), 0);
        assert_eq!(store.category_lookups.get(), 0);
        assert_eq!(store.batches.get(), 0);
    }

    #[test]
    fn test_insert_new_missing_category_is_precondition() {
        let store = MemoryStore::new();
        let mut expenses = aggregated(STATEMENT);

        let err = insert_new(&mut expenses, &store, DEFAULT_CATEGORY, &IngestContext::new())
            .unwrap_err();

        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(store.batches.get(), 0);
        assert_eq!(store.expense_count(), 0);
    }

    #[test]
    fn test_insert_new_failure_leaves_map_untouched() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        store.fail_batch.set(true);
        let mut expenses = aggregated(STATEMENT);
        let before = expenses.clone();

        let err = insert_new(&mut expenses, &store, DEFAULT_CATEGORY, &IngestContext::new())
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(expenses, before);
        assert_eq!(store.expense_count(), 0);
    }

    #[test]
    fn test_insert_new_category_lookup_ignores_case() {
        let store = MemoryStore::with_category("outros");
        let mut expenses = aggregated("d,t,a\n1,Uber,2.00\n");
        insert_new(&mut expenses, &store, "Outros", &IngestContext::new()).unwrap();
        assert_eq!(expenses["Uber"].category.as_deref(), Some("outros"));
    }

    // ========== Ingest Tests ==========

    #[test]
    fn test_ingest_statement_end_to_end() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let outcome = ingest_statement(
            STATEMENT.as_bytes(),
            &store,
            &IngestOptions::default(),
            &IngestContext::new(),
        )
        .unwrap();

        assert_eq!(outcome.expenses.len(), 2);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.matched, 0);
        assert!(!outcome.expenses.contains_key("Pagamento recebido"));
        assert!(outcome.expenses.values().all(|e| e.is_persisted()));
    }

    #[test]
    fn test_ingest_statement_twice_is_idempotent() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let options = IngestOptions::default();
        let ctx = IngestContext::new();

        let first = ingest_statement(STATEMENT.as_bytes(), &store, &options, &ctx).unwrap();
        let second = ingest_statement(STATEMENT.as_bytes(), &store, &options, &ctx).unwrap();

        assert_eq!(store.batches.get(), 1);
        assert_eq!(store.expense_count(), 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.matched, 2);
        assert_eq!(first.expenses["Uber"].id, second.expenses["Uber"].id);
        assert_eq!(second.expenses["Netflix"].value, dec("79.80"));
    }

    #[test]
    fn test_ingest_header_only_touches_nothing() {
        let store = MemoryStore::new();
        let outcome = ingest_statement(
            "date,title,amount\n".as_bytes(),
            &store,
            &IngestOptions::default(),
            &IngestContext::new(),
        )
        .unwrap();

        assert!(outcome.expenses.is_empty());
        assert_eq!(store.lookups.get(), 0);
        assert_eq!(store.category_lookups.get(), 0);
        assert_eq!(store.batches.get(), 0);
    }

    #[test]
    fn test_ingest_parse_error_touches_nothing() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let err = ingest_statement(
            "date,title,amount\n2024-01-01,Padaria,8.00\n2024-01-02,Uber,abc\n".as_bytes(),
            &store,
            &IngestOptions::default(),
            &IngestContext::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Parse { line: 3, .. }));
        assert_eq!(store.lookups.get(), 0);
        assert_eq!(store.expense_count(), 0);
    }

    #[test]
    fn test_ingest_cancelled_before_reconcile() {
        let store = MemoryStore::with_category(DEFAULT_CATEGORY);
        let ctx = IngestContext::new();
        ctx.cancel_handle().cancel();

        let err =
            ingest_statement(STATEMENT.as_bytes(), &store, &IngestOptions::default(), &ctx)
                .unwrap_err();

        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(store.lookups.get(), 0);
        assert_eq!(store.batches.get(), 0);
    }
}
