// Report generation - period windows, the PDF summary, and the raw CSV
// export. Both generators return bytes for the caller to offer as a
// download or write to disk.

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate};

use crate::editor::Record;
use crate::metrics;
use crate::store::{ExpenseRecord, SaleRecord};

// ============================================================================
// REPORT PERIODS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    AllTime,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 5] = [
        ReportPeriod::Daily,
        ReportPeriod::Weekly,
        ReportPeriod::Monthly,
        ReportPeriod::Yearly,
        ReportPeriod::AllTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "Daily",
            ReportPeriod::Weekly => "Weekly",
            ReportPeriod::Monthly => "Monthly",
            ReportPeriod::Yearly => "Yearly",
            ReportPeriod::AllTime => "All Time",
        }
    }

    /// Identifier used in selectors and file names.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
            ReportPeriod::AllTime => "all_time",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|p| p.slug() == normalized)
            .ok_or_else(|| anyhow!("Unknown report period: {}", raw))
    }

    /// Inclusive date window ending today; None means unbounded.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let days_back = match self {
            ReportPeriod::Daily => 0,
            ReportPeriod::Weekly => 6,
            ReportPeriod::Monthly => 29,
            ReportPeriod::Yearly => 364,
            ReportPeriod::AllTime => return None,
        };
        Some((today - Duration::days(days_back), today))
    }
}

fn in_window(date: Option<NaiveDate>, window: Option<(NaiveDate, NaiveDate)>) -> bool {
    match window {
        // All-time reports take every row, dated or not
        None => true,
        Some((start, end)) => matches!(date, Some(d) if d >= start && d <= end),
    }
}

// ============================================================================
// PDF REPORT
// ============================================================================

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;

fn push_line(
    layer: &printpdf::PdfLayerReference,
    font: &printpdf::IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
) {
    use printpdf::Mm;
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn divider(layer: &printpdf::PdfLayerReference, y: f32) {
    use printpdf::{Line, Mm, Point};
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn format_money(v: f64) -> String {
    let negative = v < 0.0;
    let s = format!("{:.0}", v.abs());

    let mut grouped = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Render the period report as PDF bytes: the metric cards for the window
/// plus the transactions that fall inside it.
pub fn period_report_pdf(
    sales: &[SaleRecord],
    expenses: &[ExpenseRecord],
    period: ReportPeriod,
    today: NaiveDate,
) -> Result<Vec<u8>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let window = period.window(today);
    let window_sales: Vec<SaleRecord> = sales
        .iter()
        .filter(|s| in_window(s.date, window))
        .cloned()
        .collect();
    let window_expenses: Vec<ExpenseRecord> = expenses
        .iter()
        .filter(|e| in_window(e.date, window))
        .cloned()
        .collect();

    let m = metrics::aggregate(&window_sales, &window_expenses, today);

    let title = format!("{} Business Report", period.label());
    let (doc, page1, layer1) = PdfDocument::new(
        title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Failed to load PDF font: {}", e))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("Failed to load PDF font: {}", e))?;

    let mut y: f32 = 280.0;

    // Header
    push_line(&layer, &font_bold, &title, 18.0, MARGIN_MM, y);
    y -= 7.0;
    let window_text = match window {
        Some((start, end)) => format!("Period: {} to {}", start, end),
        None => "Period: all recorded data".to_string(),
    };
    push_line(&layer, &font, &window_text, 10.0, MARGIN_MM, y);
    y -= 5.0;
    push_line(
        &layer,
        &font,
        &format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        10.0,
        MARGIN_MM,
        y,
    );

    y -= 5.0;
    divider(&layer, y);
    y -= 10.0;

    // Metric cards
    push_line(&layer, &font_bold, "Summary", 13.0, MARGIN_MM, y);
    y -= 8.0;

    let cards = [
        ("Total Sales", m.total_sales),
        ("Total Profit", m.total_profit),
        ("Total Expenditure", m.total_expenditure),
        ("Pending Payments", m.pending_payments),
        ("Mobile Sales", m.mobile_sales),
        ("Accessories Sales", m.accessories_sales),
        ("Service Sales", m.service_sales),
    ];
    for (label, value) in cards {
        push_line(&layer, &font, label, 10.0, MARGIN_MM, y);
        push_line(&layer, &font_bold, &format_money(value), 10.0, 120.0, y);
        y -= 6.0;
    }

    y -= 4.0;
    divider(&layer, y);
    y -= 10.0;

    // Transaction table
    push_line(
        &layer,
        &font_bold,
        &format!("Transactions ({})", window_sales.len()),
        13.0,
        MARGIN_MM,
        y,
    );
    y -= 8.0;

    let x_date = MARGIN_MM;
    let x_type = 45.0;
    let x_category = 80.0;
    let x_price = 120.0;
    let x_profit = 150.0;
    let x_left = 175.0;

    push_line(&layer, &font_bold, "Date", 10.0, x_date, y);
    push_line(&layer, &font_bold, "Type", 10.0, x_type, y);
    push_line(&layer, &font_bold, "Category", 10.0, x_category, y);
    push_line(&layer, &font_bold, "Price", 10.0, x_price, y);
    push_line(&layer, &font_bold, "Profit", 10.0, x_profit, y);
    push_line(&layer, &font_bold, "Left", 10.0, x_left, y);
    y -= 3.5;
    divider(&layer, y);
    y -= 6.0;

    let mut shown = 0usize;
    for sale in &window_sales {
        if y < 25.0 {
            push_line(
                &layer,
                &font,
                &format!("... and {} more rows (see CSV export)", window_sales.len() - shown),
                9.0,
                x_date,
                y,
            );
            break;
        }

        let date = sale
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        push_line(&layer, &font, &date, 9.0, x_date, y);
        push_line(&layer, &font, &sale.kind, 9.0, x_type, y);
        push_line(&layer, &font, &sale.category, 9.0, x_category, y);
        push_line(&layer, &font, &format_money(sale.selling_price), 9.0, x_price, y);
        push_line(&layer, &font, &format_money(sale.profit), 9.0, x_profit, y);
        push_line(&layer, &font, &format_money(sale.left_amount), 9.0, x_left, y);

        y -= 5.0;
        shown += 1;
    }

    push_line(&layer, &font, "Generated by shopbook.", 8.0, MARGIN_MM, 10.0);

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| anyhow!("Failed to write PDF report: {}", e))?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush PDF report buffer: {}", e))
}

// ============================================================================
// CSV EXPORT
// ============================================================================

/// The whole transaction table as UTF-8 CSV with a header row.
pub fn sales_csv(sales: &[SaleRecord]) -> Result<Vec<u8>> {
    // Header written up front - the csv writer's lazy header never fires
    // for an empty table
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(SaleRecord::field_names())
        .context("Failed to write CSV header")?;
    for sale in sales {
        wtr.serialize(sale).context("Failed to serialize transaction row")?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV export buffer: {}", e))
}

/// The expenditure table as UTF-8 CSV with a header row.
pub fn expenses_csv(expenses: &[ExpenseRecord]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(ExpenseRecord::field_names())
        .context("Failed to write CSV header")?;
    for expense in expenses {
        wtr.serialize(expense)
            .context("Failed to serialize expenditure row")?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV export buffer: {}", e))
}

/// Suggested download name for the PDF report.
pub fn pdf_file_name(period: ReportPeriod) -> String {
    format!(
        "{}_report_{}.pdf",
        period.slug(),
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Suggested download name for the transactions CSV export.
pub fn csv_file_name() -> String {
    format!("business_data_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Suggested download name for the expenditures CSV export.
pub fn expenses_csv_file_name() -> String {
    format!("expenditures_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn day(s: &str) -> NaiveDate {
        d(s).unwrap()
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(ReportPeriod::parse("daily").unwrap(), ReportPeriod::Daily);
        assert_eq!(ReportPeriod::parse("Weekly").unwrap(), ReportPeriod::Weekly);
        assert_eq!(ReportPeriod::parse("all_time").unwrap(), ReportPeriod::AllTime);
        assert_eq!(ReportPeriod::parse("All Time").unwrap(), ReportPeriod::AllTime);
        assert!(ReportPeriod::parse("fortnightly").is_err());
    }

    #[test]
    fn test_period_windows() {
        let today = day("2024-01-15");

        assert_eq!(ReportPeriod::Daily.window(today), Some((today, today)));
        assert_eq!(
            ReportPeriod::Weekly.window(today),
            Some((day("2024-01-09"), today))
        );
        assert_eq!(
            ReportPeriod::Monthly.window(today),
            Some((day("2023-12-17"), today))
        );
        assert_eq!(ReportPeriod::AllTime.window(today), None);
    }

    #[test]
    fn test_window_membership() {
        let window = ReportPeriod::Weekly.window(day("2024-01-15"));

        assert!(in_window(d("2024-01-15"), window));
        assert!(in_window(d("2024-01-09"), window));
        assert!(!in_window(d("2024-01-08"), window));
        // Undated rows only appear in all-time reports
        assert!(!in_window(None, window));
        assert!(in_window(None, None));
    }

    #[test]
    fn test_format_money_grouping() {
        assert_eq!(format_money(0.0), "0");
        assert_eq!(format_money(1000.0), "1,000");
        assert_eq!(format_money(1234567.0), "1,234,567");
        assert_eq!(format_money(-1500.0), "-1,500");
    }

    #[test]
    fn test_pdf_report_produces_bytes() {
        let today = day("2024-01-15");
        let sales = vec![
            SaleRecord::new(Some(today), "Sale", "Mobile", 1000.0, 200.0, 0.0),
            SaleRecord::new(d("2023-06-01"), "Sale", "Repair", 300.0, 90.0, 0.0),
        ];
        let expenses = vec![ExpenseRecord::new(Some(today), 120.0)];

        let bytes = period_report_pdf(&sales, &expenses, ReportPeriod::Weekly, today).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_sales_csv_header_and_rows() {
        let sales = vec![
            SaleRecord::new(d("2024-01-15"), "Sale", "Mobile", 1000.0, 200.0, 0.0),
            SaleRecord::new(None, "Sale", "Accessories", 500.0, 100.0, 50.0),
        ];

        let bytes = sales_csv(&sales).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Type,Category,Selling_Price,Profit,Left_Amount");
        assert_eq!(lines[1], "2024-01-15,Sale,Mobile,1000.0,200.0,0.0");
        // Invalid date exports as the empty marker
        assert!(lines[2].starts_with(",Sale,Accessories"));
    }

    #[test]
    fn test_empty_tables_still_export_headers() {
        let sales = String::from_utf8(sales_csv(&[]).unwrap()).unwrap();
        assert_eq!(
            sales.trim_end(),
            "Date,Type,Category,Selling_Price,Profit,Left_Amount"
        );

        let expenses = String::from_utf8(expenses_csv(&[]).unwrap()).unwrap();
        assert_eq!(expenses.trim_end(), "Date,Amount");
    }

    #[test]
    fn test_expenses_csv_header_and_rows() {
        let expenses = vec![
            ExpenseRecord::new(d("2024-01-15"), 300.0),
            ExpenseRecord::new(None, 75.0),
        ];

        let bytes = expenses_csv(&expenses).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Amount");
        assert_eq!(lines[1], "2024-01-15,300.0");
        assert_eq!(lines[2], ",75.0");
    }

    #[test]
    fn test_file_names_embed_period() {
        assert!(pdf_file_name(ReportPeriod::Monthly).starts_with("monthly_report_"));
        assert!(csv_file_name().starts_with("business_data_"));
        assert!(csv_file_name().ends_with(".csv"));
        assert!(expenses_csv_file_name().starts_with("expenditures_"));
        assert!(expenses_csv_file_name().ends_with(".csv"));
    }
}
