// Shop Ledger - Core Library
// Exposes all modules for use in the CLI, the TUI, and tests

pub mod auth;
pub mod editor;
pub mod metrics;
pub mod report;
pub mod session;
pub mod store;

// Only compiled when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use auth::{AuthError, AuthGate, CredentialStore, DEFAULT_PASSWORD};
pub use editor::{FieldEditor, FieldValue, Record, RecordTable, Widget};
pub use metrics::{aggregate, daily_profit, DashboardMetrics, SALE_TYPE};
pub use report::{
    csv_file_name, expenses_csv, expenses_csv_file_name, pdf_file_name, period_report_pdf,
    sales_csv, ReportPeriod,
};
pub use session::{AuthState, Session};
pub use store::{
    load_expenses_csv, load_sales_csv, parse_amount, parse_date, ExpenseRecord, Ledger,
    LedgerStore, SaleRecord, CATEGORY_ACCESSORIES, CATEGORY_MOBILE, CATEGORY_REPAIR,
    EXPENSES_TABLE, SALES_TABLE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
