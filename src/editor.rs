// Record Editor - listing, per-row edit mode, widget inference, save, delete.
// Rows are addressed by their surrogate UUID; display positions stay
// contiguous (0..N-1) because rows live in a plain Vec.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::session::Session;
use crate::store::{parse_amount, parse_date, ExpenseRecord, SaleRecord};

// ============================================================================
// FIELD VALUES & WIDGETS
// ============================================================================

/// Current value of one editable field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Date(Option<NaiveDate>),
    Text(String),
}

impl FieldValue {
    /// String form shown in listings and free-text editors.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Number(n) => format!("{}", n),
            FieldValue::Date(Some(d)) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Date(None) => String::new(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => *d,
            FieldValue::Text(s) => parse_date(s),
            FieldValue::Number(_) => None,
        }
    }

    fn as_number(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => parse_amount(s),
            FieldValue::Date(_) => 0.0,
        }
    }
}

/// Editor widget picked for a field, seeded with its current value.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Number { value: f64 },
    Date { value: Option<NaiveDate> },
    Text { value: String },
}

/// One entry of a rendered edit form.
#[derive(Debug, Clone)]
pub struct FieldEditor {
    pub field: &'static str,
    pub widget: Widget,
}

/// Pick the widget for a field: anything named like a date gets the date
/// editor, numeric values get the numeric editor, the rest free text.
fn widget_for(field: &str, value: &FieldValue) -> Widget {
    if field.to_ascii_lowercase().contains("date") {
        return Widget::Date {
            value: value.as_date(),
        };
    }
    match value {
        FieldValue::Number(n) => Widget::Number { value: *n },
        other => Widget::Text {
            value: other.display(),
        },
    }
}

// ============================================================================
// RECORD TRAIT
// ============================================================================

/// Field-level access the editor needs from a record type.
pub trait Record: Clone {
    /// User-facing label for messages ("transaction", "expenditure")
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn field_names() -> &'static [&'static str];
    fn get(&self, field: &str) -> Option<FieldValue>;
    fn set(&mut self, field: &str, value: &FieldValue) -> Result<()>;
}

impl Record for SaleRecord {
    const KIND: &'static str = "transaction";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field_names() -> &'static [&'static str] {
        &[
            "Date",
            "Type",
            "Category",
            "Selling_Price",
            "Profit",
            "Left_Amount",
        ]
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        match field {
            "Date" => Some(FieldValue::Date(self.date)),
            "Type" => Some(FieldValue::Text(self.kind.clone())),
            "Category" => Some(FieldValue::Text(self.category.clone())),
            "Selling_Price" => Some(FieldValue::Number(self.selling_price)),
            "Profit" => Some(FieldValue::Number(self.profit)),
            "Left_Amount" => Some(FieldValue::Number(self.left_amount)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: &FieldValue) -> Result<()> {
        match field {
            "Date" => self.date = value.as_date(),
            "Type" => self.kind = value.display(),
            "Category" => self.category = value.display(),
            "Selling_Price" => self.selling_price = value.as_number(),
            "Profit" => self.profit = value.as_number(),
            "Left_Amount" => self.left_amount = value.as_number(),
            other => return Err(anyhow!("Unknown transaction field: {}", other)),
        }
        Ok(())
    }
}

impl Record for ExpenseRecord {
    const KIND: &'static str = "expenditure";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field_names() -> &'static [&'static str] {
        &["Date", "Amount"]
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        match field {
            "Date" => Some(FieldValue::Date(self.date)),
            "Amount" => Some(FieldValue::Number(self.amount)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: &FieldValue) -> Result<()> {
        match field {
            "Date" => self.date = value.as_date(),
            "Amount" => self.amount = value.as_number(),
            other => return Err(anyhow!("Unknown expenditure field: {}", other)),
        }
        Ok(())
    }
}

// ============================================================================
// RECORD TABLE
// ============================================================================

/// An ordered record table. Display position is the index in row order and
/// re-packs after every delete.
#[derive(Debug, Clone)]
pub struct RecordTable<R> {
    rows: Vec<R>,
}

impl<R> Default for RecordTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> RecordTable<R> {
    pub fn from_rows(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }
}

impl<R: Record> RecordTable<R> {
    /// Every row paired with its current display position.
    pub fn list(&self) -> Vec<(usize, &R)> {
        self.rows.iter().enumerate().collect()
    }

    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.rows.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Mark a row as being edited. Idempotent - re-entering edit mode on a
    /// row already in edit mode is a no-op.
    pub fn begin_edit(&self, session: &mut Session, id: Uuid) -> Result<()> {
        if self.get(id).is_none() {
            return Err(anyhow!("No {} found for editing", R::KIND));
        }
        session.set_editing(id, true);
        Ok(())
    }

    /// Render the edit form for a row: one widget per field, each seeded
    /// with the row's current value.
    pub fn edit_form(&self, id: Uuid) -> Result<Vec<FieldEditor>> {
        let row = self
            .get(id)
            .ok_or_else(|| anyhow!("No {} found for editing", R::KIND))?;

        let mut form = Vec::with_capacity(R::field_names().len());
        for field in R::field_names().iter().copied() {
            let value = row
                .get(field)
                .ok_or_else(|| anyhow!("Unknown {} field: {}", R::KIND, field))?;
            form.push(FieldEditor {
                field,
                widget: widget_for(field, &value),
            });
        }

        Ok(form)
    }

    /// Overwrite the row's fields with the edited values and leave edit
    /// mode. All-or-nothing: an unknown field leaves the row untouched.
    pub fn save_edit(
        &mut self,
        session: &mut Session,
        id: Uuid,
        values: &[(&str, FieldValue)],
    ) -> Result<()> {
        let position = self
            .position_of(id)
            .ok_or_else(|| anyhow!("No {} found to save", R::KIND))?;

        let mut updated = self.rows[position].clone();
        for (field, value) in values {
            updated.set(*field, value)?;
        }

        self.rows[position] = updated;
        session.clear_editing(id);
        Ok(())
    }

    /// Leave edit mode without touching the row.
    pub fn cancel_edit(&self, session: &mut Session, id: Uuid) {
        session.clear_editing(id);
    }

    /// Remove the row. Later rows shift down one position so display
    /// positions stay contiguous; any edit flag the row held is dropped.
    pub fn delete(&mut self, session: &mut Session, id: Uuid) -> Result<R> {
        let position = self
            .position_of(id)
            .ok_or_else(|| anyhow!("No {} found to delete", R::KIND))?;

        session.clear_editing(id);
        Ok(self.rows.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SaleRecord;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn sample_table() -> RecordTable<SaleRecord> {
        let mut table = RecordTable::default();
        table.push(SaleRecord::new(d("2024-01-15"), "Sale", "Mobile", 1000.0, 200.0, 0.0));
        table.push(SaleRecord::new(d("2024-01-16"), "Sale", "Accessories", 500.0, 100.0, 0.0));
        table.push(SaleRecord::new(d("2024-01-17"), "Sale", "Repair", 800.0, 300.0, 250.0));
        table
    }

    #[test]
    fn test_list_positions_are_contiguous() {
        let table = sample_table();
        let listed = table.list();

        assert_eq!(listed.len(), 3);
        for (expected, (position, _)) in listed.iter().enumerate() {
            assert_eq!(*position, expected);
        }
    }

    #[test]
    fn test_begin_edit_idempotent() {
        let table = sample_table();
        let mut session = Session::new();
        let id = table.rows()[1].id;

        table.begin_edit(&mut session, id).unwrap();
        assert!(session.is_editing(id));

        // Second begin_edit is a no-op, not an error
        table.begin_edit(&mut session, id).unwrap();
        assert!(session.is_editing(id));
        assert_eq!(session.editing_count(), 1);
    }

    #[test]
    fn test_begin_edit_unknown_row_fails() {
        let table = sample_table();
        let mut session = Session::new();

        assert!(table.begin_edit(&mut session, Uuid::new_v4()).is_err());
        assert_eq!(session.editing_count(), 0);
    }

    #[test]
    fn test_edit_form_widget_inference() {
        let table = sample_table();
        let id = table.rows()[0].id;

        let form = table.edit_form(id).unwrap();
        assert_eq!(form.len(), 6);

        // Date-named field gets the date editor seeded with the parsed value
        assert_eq!(form[0].field, "Date");
        assert_eq!(form[0].widget, Widget::Date { value: d("2024-01-15") });

        // Plain text fields get free-text editors
        assert_eq!(form[1].widget, Widget::Text { value: "Sale".to_string() });
        assert_eq!(form[2].widget, Widget::Text { value: "Mobile".to_string() });

        // Numeric fields get numeric editors seeded with the current value
        assert_eq!(form[3].widget, Widget::Number { value: 1000.0 });
        assert_eq!(form[4].widget, Widget::Number { value: 200.0 });
        assert_eq!(form[5].widget, Widget::Number { value: 0.0 });
    }

    #[test]
    fn test_save_edit_overwrites_and_exits_edit_mode() {
        let mut table = sample_table();
        let mut session = Session::new();
        let id = table.rows()[0].id;

        table.begin_edit(&mut session, id).unwrap();
        table
            .save_edit(
                &mut session,
                id,
                &[
                    ("Selling_Price", FieldValue::Number(1200.0)),
                    ("Category", FieldValue::Text("Accessories".to_string())),
                    ("Date", FieldValue::Text("2024-02-01".to_string())),
                ],
            )
            .unwrap();

        let row = table.get(id).unwrap();
        assert_eq!(row.selling_price, 1200.0);
        assert_eq!(row.category, "Accessories");
        assert_eq!(row.date, d("2024-02-01"));
        assert!(!session.is_editing(id));
    }

    #[test]
    fn test_cancel_edit_leaves_row_untouched() {
        let table = sample_table();
        let mut session = Session::new();
        let id = table.rows()[0].id;

        table.begin_edit(&mut session, id).unwrap();
        table.cancel_edit(&mut session, id);

        assert!(!session.is_editing(id));
        assert_eq!(table.get(id).unwrap().selling_price, 1000.0);
    }

    #[test]
    fn test_delete_shifts_positions_down() {
        let mut table = sample_table();
        let mut session = Session::new();
        let ids: Vec<Uuid> = table.rows().iter().map(|r| r.id).collect();

        table.delete(&mut session, ids[0]).unwrap();

        assert_eq!(table.len(), 2);
        // Every later row moved down one position, no gaps
        assert_eq!(table.position_of(ids[1]), Some(0));
        assert_eq!(table.position_of(ids[2]), Some(1));
        // Surrogate identity did not drift
        assert_eq!(table.rows()[0].id, ids[1]);
    }

    #[test]
    fn test_delete_clears_edit_flag() {
        let mut table = sample_table();
        let mut session = Session::new();
        let id = table.rows()[2].id;

        table.begin_edit(&mut session, id).unwrap();
        table.delete(&mut session, id).unwrap();

        assert!(!session.is_editing(id));
        assert!(table.get(id).is_none());
    }

    #[test]
    fn test_delete_unknown_row_fails() {
        let mut table = sample_table();
        let mut session = Session::new();

        assert!(table.delete(&mut session, Uuid::new_v4()).is_err());
        assert_eq!(table.len(), 3);
    }
}
