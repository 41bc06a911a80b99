//! Statement CSV parsing and aggregation
//!
//! Statements are comma-separated with one header row:
//! `date,description,amount`. Extra trailing columns are ignored.

use std::collections::btree_map::Entry;
use std::io::Read;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;

use crate::context::IngestContext;
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseMap};
use crate::normalize::TitleRules;

/// One undecoded statement row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source file
    pub line: u64,
    pub date: String,
    pub description: String,
    pub amount: String,
}

/// Sequential reader over a statement export; the header row is skipped
pub struct StatementReader<R: Read> {
    rdr: csv::Reader<R>,
    record: StringRecord,
}

impl<R: Read> StatementReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self {
            rdr,
            record: StringRecord::new(),
        }
    }

    /// Next data row, or `None` at end of input
    pub fn next_row(&mut self) -> Result<Option<RawRow>> {
        let more = self.rdr.read_record(&mut self.record).map_err(|e| {
            let line = e
                .position()
                .map(|p| p.line())
                .unwrap_or_else(|| self.rdr.position().line());
            Error::parse(line, format!("unreadable row: {}", e))
        })?;
        if !more {
            return Ok(None);
        }

        let line = self
            .record
            .position()
            .map(|p| p.line())
            .unwrap_or_else(|| self.rdr.position().line());

        let date = self.record.get(0).unwrap_or_default().to_string();
        let description = self
            .record
            .get(1)
            .ok_or_else(|| Error::parse(line, "missing description"))?
            .to_string();
        let amount = self
            .record
            .get(2)
            .ok_or_else(|| Error::parse(line, "missing amount"))?
            .to_string();

        Ok(Some(RawRow {
            line,
            date,
            description,
            amount,
        }))
    }
}

impl<R: Read> Iterator for StatementReader<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Parse a signed decimal amount with `.` as the separator
///
/// Thousands separators, currency symbols and exponents are rejected.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);

    let mut digits = 0;
    let mut dots = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }

    let value = Decimal::from_str(unsigned).ok()?;
    if s.starts_with('-') {
        Some(-value)
    } else {
        Some(value)
    }
}

/// Fold one row into the map; incoming payments are skipped
fn fold_row(map: &mut ExpenseMap, row: &RawRow, rules: &TitleRules) -> Result<()> {
    let title = rules.normalize(&row.description);
    if rules.is_incoming_payment(title) {
        return Ok(());
    }
    if title.is_empty() {
        return Err(Error::parse(
            row.line,
            format!("empty title after normalization: '{}'", row.description),
        ));
    }

    let amount = parse_amount(&row.amount).ok_or_else(|| {
        Error::parse(
            row.line,
            format!("invalid amount '{}' for '{}'", row.amount, title),
        )
    })?;

    match map.entry(title.to_string()) {
        Entry::Occupied(mut e) => {
            let expense = e.get_mut();
            expense.value = expense
                .value
                .checked_add(amount)
                .ok_or_else(|| Error::parse(row.line, format!("amount overflow for '{}'", title)))?;
        }
        Entry::Vacant(e) => {
            e.insert(Expense::transient(title, amount));
        }
    }
    Ok(())
}

/// Aggregate rows by canonical title, summing their amounts
///
/// Any malformed row aborts the whole aggregation.
pub fn aggregate<I>(rows: I, rules: &TitleRules) -> Result<ExpenseMap>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut map = ExpenseMap::new();
    for row in rows {
        fold_row(&mut map, &row, rules)?;
    }
    Ok(map)
}

/// Read and aggregate a whole statement, stopping at the first row boundary
/// after cancellation or deadline expiry
pub fn aggregate_statement<R: Read>(
    reader: R,
    rules: &TitleRules,
    ctx: &IngestContext,
) -> Result<ExpenseMap> {
    let mut statement = StatementReader::new(reader);
    let mut map = ExpenseMap::new();

    loop {
        ctx.checkpoint("reading statement")?;
        match statement.next_row()? {
            Some(row) => fold_row(&mut map, &row, rules)?,
            None => break,
        }
    }

    Ok(map)
}

/// Merge a partial aggregation into another by summing values per title
///
/// On overflow `into` is left with every title merged before the failing one.
pub fn merge(into: &mut ExpenseMap, other: ExpenseMap) -> Result<()> {
    for (title, expense) in other {
        match into.entry(title) {
            Entry::Occupied(mut e) => {
                let merged = e.get().value.checked_add(expense.value).ok_or_else(|| {
                    Error::InvalidData(format!("amount overflow for '{}'", e.key()))
                })?;
                e.get_mut().value = merged;
            }
            Entry::Vacant(e) => {
                e.insert(expense);
            }
        }
    }
    Ok(())
}
