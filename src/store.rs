use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::editor::RecordTable;

/// Fixed table names the store is keyed by
pub const SALES_TABLE: &str = "transactions";
pub const EXPENSES_TABLE: &str = "expenditures";

/// Category labels recognized by the dashboard breakdown
pub const CATEGORY_MOBILE: &str = "Mobile";
pub const CATEGORY_ACCESSORIES: &str = "Accessories";
pub const CATEGORY_REPAIR: &str = "Repair";

// ============================================================================
// RECORD TYPES
// ============================================================================

/// A single sale/repair transaction row.
/// Identity is a surrogate UUID assigned at creation - display position is
/// separate and stays contiguous across deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(skip_serializing)]
    #[serde(default = "new_record_id")]
    pub id: Uuid,

    #[serde(rename = "Date")]
    #[serde(with = "lenient_date")]
    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(rename = "Type")]
    #[serde(default)]
    pub kind: String,

    #[serde(rename = "Category")]
    #[serde(default)]
    pub category: String,

    #[serde(rename = "Selling_Price")]
    #[serde(deserialize_with = "lenient_amount")]
    #[serde(default)]
    pub selling_price: f64,

    #[serde(rename = "Profit")]
    #[serde(deserialize_with = "lenient_amount")]
    #[serde(default)]
    pub profit: f64,

    #[serde(rename = "Left_Amount")]
    #[serde(deserialize_with = "lenient_amount")]
    #[serde(default)]
    pub left_amount: f64,
}

/// A single expenditure row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(skip_serializing)]
    #[serde(default = "new_record_id")]
    pub id: Uuid,

    #[serde(rename = "Date")]
    #[serde(with = "lenient_date")]
    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(rename = "Amount")]
    #[serde(deserialize_with = "lenient_amount")]
    #[serde(default)]
    pub amount: f64,
}

fn new_record_id() -> Uuid {
    Uuid::new_v4()
}

impl SaleRecord {
    pub fn new(
        date: Option<NaiveDate>,
        kind: &str,
        category: &str,
        selling_price: f64,
        profit: f64,
        left_amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            kind: kind.to_string(),
            category: category.to_string(),
            selling_price,
            profit,
            left_amount,
        }
    }
}

impl ExpenseRecord {
    pub fn new(date: Option<NaiveDate>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            amount,
        }
    }
}

// ============================================================================
// LENIENT FIELD COERCION
// Bad dates become None, bad amounts become 0.0 - ingest never aborts a
// whole table over one malformed field.
// ============================================================================

/// Parse a calendar date from the formats seen in exported data.
/// Returns None (the explicit "invalid" marker) instead of failing.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    // Timestamps (RFC 3339 and friends): keep the date part. get() instead
    // of slicing - byte 10 may fall inside a multibyte character.
    if raw.len() > 10 {
        if let Some(date) = raw
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        {
            return Some(date);
        }
    }

    None
}

/// Parse a currency amount; missing/non-numeric coerces to 0.0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_amount(&raw))
}

/// Serde adapter for `Option<NaiveDate>` columns: dates serialize as
/// `YYYY-MM-DD` (empty string when invalid), and anything unparseable
/// deserializes to None.
pub mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse_date(&raw))
    }
}

// ============================================================================
// LEDGER + SQLITE TABLE PROVIDER
// ============================================================================

/// Both record tables, fully in memory. The store hands this out wholesale
/// and takes the mutated copy back.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub sales: RecordTable<SaleRecord>,
    pub expenses: RecordTable<ExpenseRecord>,
}

/// SQLite-backed table provider for the two fixed tables.
pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger database at {}", path.display()))?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    /// Load both tables, ordered by stored position.
    pub fn load(&self) -> Result<Ledger> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, type, category, selling_price, profit, left_amount
             FROM transactions
             ORDER BY position ASC",
        )?;

        let sales = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let date: Option<String> = row.get(1)?;
                Ok(SaleRecord {
                    id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::new_v4()),
                    date: date.as_deref().and_then(parse_date),
                    kind: row.get(2)?,
                    category: row.get(3)?,
                    selling_price: row.get(4)?,
                    profit: row.get(5)?,
                    left_amount: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, date, amount
             FROM expenditures
             ORDER BY position ASC",
        )?;

        let expenses = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let date: Option<String> = row.get(1)?;
                Ok(ExpenseRecord {
                    id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::new_v4()),
                    date: date.as_deref().and_then(parse_date),
                    amount: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ledger {
            sales: RecordTable::from_rows(sales),
            expenses: RecordTable::from_rows(expenses),
        })
    }

    /// Replace both tables wholesale with the mutated ledger, in one
    /// SQLite transaction so a crash never leaves half a save.
    pub fn save(&mut self, ledger: &Ledger) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM transactions", [])?;
        for (position, sale) in ledger.sales.rows().iter().enumerate() {
            tx.execute(
                "INSERT INTO transactions (id, position, date, type, category, selling_price, profit, left_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    sale.id.to_string(),
                    position as i64,
                    sale.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    sale.kind,
                    sale.category,
                    sale.selling_price,
                    sale.profit,
                    sale.left_amount,
                ],
            )?;
        }

        tx.execute("DELETE FROM expenditures", [])?;
        for (position, expense) in ledger.expenses.rows().iter().enumerate() {
            tx.execute(
                "INSERT INTO expenditures (id, position, date, amount)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    expense.id.to_string(),
                    position as i64,
                    expense.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    expense.amount,
                ],
            )?;
        }

        tx.commit().context("Failed to commit ledger save")?;
        Ok(())
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            date TEXT,
            type TEXT NOT NULL,
            category TEXT NOT NULL,
            selling_price REAL NOT NULL,
            profit REAL NOT NULL,
            left_amount REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenditures (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            date TEXT,
            amount REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CSV IMPORT
// Export lives in report.rs alongside the other downloads.
// ============================================================================

pub fn load_sales_csv(csv_path: &Path) -> Result<Vec<SaleRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open transactions CSV")?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: SaleRecord = result.context("Failed to deserialize transaction row")?;
        records.push(record);
    }

    Ok(records)
}

pub fn load_expenses_csv(csv_path: &Path) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open expenditures CSV")?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: ExpenseRecord = result.context("Failed to deserialize expenditure row")?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-15"), d("2024-01-15"));
        assert_eq!(parse_date("01/15/2024"), d("2024-01-15"));
        assert_eq!(parse_date("15-01-2024"), d("2024-01-15"));
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), d("2024-01-15"));
        assert_eq!(parse_date("  2024-01-15  "), d("2024-01-15"));
    }

    #[test]
    fn test_parse_date_invalid_becomes_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }

    #[test]
    fn test_parse_date_multibyte_input_does_not_panic() {
        // Byte 10 lands inside a multibyte character here
        assert_eq!(parse_date("2024年01月15日"), None);
        assert_eq!(parse_date("sale début janvier"), None);
        // A valid ASCII date prefix followed by multibyte text still parses
        assert_eq!(parse_date("2024-01-15日付"), d("2024-01-15"));
    }

    #[test]
    fn test_parse_amount_lenient() {
        assert_eq!(parse_amount("1000"), 1000.0);
        assert_eq!(parse_amount("1,500.50"), 1500.50);
        assert_eq!(parse_amount("-200"), -200.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
    }

    #[test]
    fn test_csv_deserialize_lenient_fields() {
        let data = "\
Date,Type,Category,Selling_Price,Profit,Left_Amount
2024-01-15,Sale,Mobile,1000,200,0
garbage,Sale,Accessories,oops,100,50
";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<SaleRecord> = rdr.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d("2024-01-15"));
        assert_eq!(rows[0].selling_price, 1000.0);
        // Bad fields degrade instead of failing the import
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].selling_price, 0.0);
        assert_eq!(rows[1].left_amount, 50.0);
        // Fresh surrogate ids were assigned
        assert_ne!(rows[0].id, rows[1].id);
    }

    #[test]
    fn test_store_round_trip_preserves_order_and_identity() {
        let mut store = LedgerStore::open_in_memory().unwrap();

        let mut ledger = Ledger::default();
        ledger
            .sales
            .push(SaleRecord::new(d("2024-01-15"), "Sale", "Mobile", 1000.0, 200.0, 0.0));
        ledger
            .sales
            .push(SaleRecord::new(None, "Sale", "Repair", 500.0, 150.0, 100.0));
        ledger.expenses.push(ExpenseRecord::new(d("2024-01-15"), 300.0));

        let ids: Vec<Uuid> = ledger.sales.rows().iter().map(|r| r.id).collect();
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.sales.len(), 2);
        assert_eq!(loaded.expenses.len(), 1);
        assert_eq!(loaded.sales.rows()[0].id, ids[0]);
        assert_eq!(loaded.sales.rows()[1].id, ids[1]);
        assert_eq!(loaded.sales.rows()[0].date, d("2024-01-15"));
        assert_eq!(loaded.sales.rows()[1].date, None);
        assert_eq!(loaded.expenses.rows()[0].amount, 300.0);
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let mut store = LedgerStore::open_in_memory().unwrap();

        let mut ledger = Ledger::default();
        ledger
            .sales
            .push(SaleRecord::new(d("2024-01-15"), "Sale", "Mobile", 1000.0, 200.0, 0.0));
        store.save(&ledger).unwrap();

        // Save again with the row removed - the old row must not linger
        ledger.sales = RecordTable::from_rows(Vec::new());
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.sales.len(), 0);
    }
}
