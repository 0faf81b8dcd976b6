use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::env;
use std::fs;
use std::path::PathBuf;

use shopbook::{
    load_expenses_csv, load_sales_csv, metrics, report, AuthGate, Ledger, LedgerStore,
    ReportPeriod, DEFAULT_PASSWORD,
};

fn db_path() -> PathBuf {
    env::var("SHOPBOOK_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("shopbook.db"))
}

fn credentials_path() -> PathBuf {
    env::var("SHOPBOOK_CREDENTIALS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("shopbook.cred"))
}

fn open_ledger() -> Result<(LedgerStore, Ledger)> {
    let store = LedgerStore::open(&db_path())?;
    let ledger = store.load()?;
    Ok((store, ledger))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => run_import(&args[2..]),
        Some("export") => run_export(&args[2..]),
        Some("report") => run_report(&args[2..]),
        Some("metrics") => run_metrics(&args[2..]),
        Some("help" | "--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => run_ui_mode(),
    }
}

fn print_usage() {
    println!("shopbook {}", shopbook::VERSION);
    println!();
    println!("USAGE:");
    println!("  shopbook                          start the dashboard UI");
    println!("  shopbook import <sales.csv> [expenditures.csv]");
    println!("  shopbook export [sales.csv] [expenditures.csv]");
    println!("                                    export both tables as CSV");
    println!("  shopbook report <period> [out.pdf]");
    println!("      period: daily | weekly | monthly | yearly | all_time");
    println!("  shopbook metrics [--json]         print the dashboard figures");
    println!();
    println!("  SHOPBOOK_DB / SHOPBOOK_CREDENTIALS override the default file paths");
}

fn run_import(args: &[String]) -> Result<()> {
    let sales_csv = args
        .first()
        .ok_or_else(|| anyhow!("Usage: shopbook import <sales.csv> [expenditures.csv]"))?;

    let (mut store, mut ledger) = open_ledger()?;

    println!("📂 Importing transactions from {}...", sales_csv);
    let sales = load_sales_csv(sales_csv.as_ref())?;
    let sales_count = sales.len();
    for record in sales {
        ledger.sales.push(record);
    }
    println!("✓ Imported {} transactions", sales_count);

    if let Some(expenses_csv) = args.get(1) {
        println!("📂 Importing expenditures from {}...", expenses_csv);
        let expenses = load_expenses_csv(expenses_csv.as_ref())?;
        let expenses_count = expenses.len();
        for record in expenses {
            ledger.expenses.push(record);
        }
        println!("✓ Imported {} expenditures", expenses_count);
    }

    store.save(&ledger)?;
    println!(
        "✓ Ledger now holds {} transactions, {} expenditures",
        ledger.sales.len(),
        ledger.expenses.len()
    );

    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let (_, ledger) = open_ledger()?;

    let sales_out = args
        .first()
        .cloned()
        .unwrap_or_else(report::csv_file_name);
    let expenses_out = args
        .get(1)
        .cloned()
        .unwrap_or_else(report::expenses_csv_file_name);

    let bytes = report::sales_csv(ledger.sales.rows())?;
    fs::write(&sales_out, bytes).with_context(|| format!("Failed to write {}", sales_out))?;
    println!(
        "✓ Exported {} transactions to {}",
        ledger.sales.len(),
        sales_out
    );

    let bytes = report::expenses_csv(ledger.expenses.rows())?;
    fs::write(&expenses_out, bytes)
        .with_context(|| format!("Failed to write {}", expenses_out))?;
    println!(
        "✓ Exported {} expenditures to {}",
        ledger.expenses.len(),
        expenses_out
    );

    Ok(())
}

fn run_report(args: &[String]) -> Result<()> {
    let period = args
        .first()
        .ok_or_else(|| anyhow!("Usage: shopbook report <period> [out.pdf]"))
        .and_then(|raw| ReportPeriod::parse(raw))?;

    let (_, ledger) = open_ledger()?;
    let today = Local::now().date_naive();

    let bytes = report::period_report_pdf(
        ledger.sales.rows(),
        ledger.expenses.rows(),
        period,
        today,
    )?;

    let out = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| report::pdf_file_name(period));
    fs::write(&out, bytes).with_context(|| format!("Failed to write {}", out))?;

    println!("✓ Wrote {} report to {}", period.label(), out);
    Ok(())
}

fn run_metrics(args: &[String]) -> Result<()> {
    let (_, ledger) = open_ledger()?;
    let today = Local::now().date_naive();

    let m = metrics::aggregate(ledger.sales.rows(), ledger.expenses.rows(), today);

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&m)?);
        return Ok(());
    }

    println!("📊 Dashboard metrics for {}", today);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Today's Sales:       {:>12.0}", m.today_sales);
    println!("Today's Profit:      {:>12.0}", m.today_profit);
    println!("Today's Expenditure: {:>12.0}", m.today_expenditure);
    println!("Total Sales:         {:>12.0}", m.total_sales);
    println!("Total Profit:        {:>12.0}", m.total_profit);
    println!("Total Expenditure:   {:>12.0}", m.total_expenditure);
    println!("Pending Payments:    {:>12.0}", m.pending_payments);
    println!("Mobile Sales:        {:>12.0}", m.mobile_sales);
    println!("Accessories Sales:   {:>12.0}", m.accessories_sales);
    println!("Service Sales:       {:>12.0}", m.service_sales);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Loading shop ledger...\n");

    let (gate, initialized_default) = AuthGate::open(&credentials_path())?;
    if initialized_default {
        println!("⚠️  No credential store found.");
        println!(
            "   Initialized with the default password '{}' - change it from the Password page before going live.\n",
            DEFAULT_PASSWORD
        );
    }

    let (store, ledger) = open_ledger()?;
    println!(
        "✓ Loaded {} transactions, {} expenditures\n",
        ledger.sales.len(),
        ledger.expenses.len()
    );
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = shopbook::ui::App::new(gate, store, ledger);
    shopbook::ui::run_ui(&mut app)?;

    println!("\n✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI subcommands: import / export / report / metrics");
    std::process::exit(1);
}
