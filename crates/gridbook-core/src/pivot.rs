//! Pivot table definitions
//!
//! A pivot table is a field builder over a bound source range. Every
//! field-adding call validates its column index against the source width
//! immediately; an invalid index is rejected at the call and never reaches
//! serialization.

use crate::addr::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// Synthetic col-field value meaning "the data fields themselves form the
/// column axis". Written once more than one column label exists.
pub const DATA_FIELDS_AS_COLUMNS: i32 = -2;

/// Aggregation functions for pivot data fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFunction {
    Sum,
    Count,
    Average,
    Max,
    Min,
    Product,
    CountNums,
    StdDev,
    StdDevP,
    Var,
    VarP,
}

impl DataFunction {
    /// The `subtotal` attribute value in pivot XML.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFunction::Sum => "sum",
            DataFunction::Count => "count",
            DataFunction::Average => "average",
            DataFunction::Max => "max",
            DataFunction::Min => "min",
            DataFunction::Product => "product",
            DataFunction::CountNums => "countNums",
            DataFunction::StdDev => "stdDev",
            DataFunction::StdDevP => "stdDevp",
            DataFunction::Var => "var",
            DataFunction::VarP => "varp",
        }
    }

    /// Default caption prefix, matching what Excel generates.
    pub fn caption_prefix(&self) -> &'static str {
        match self {
            DataFunction::Sum => "Sum of",
            DataFunction::Count | DataFunction::CountNums => "Count of",
            DataFunction::Average => "Average of",
            DataFunction::Max => "Max of",
            DataFunction::Min => "Min of",
            DataFunction::Product => "Product of",
            DataFunction::StdDev | DataFunction::StdDevP => "StdDev of",
            DataFunction::Var | DataFunction::VarP => "Var of",
        }
    }
}

/// What the pivot table aggregates over.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSource {
    /// Resolved cell range on the source sheet
    pub range: CellRange,
    /// Name of the source sheet
    pub sheet_name: String,
    /// Set when the source was given as a named range; kept for
    /// serialization, the resolved range above is authoritative
    pub named_range: Option<String>,
}

impl PivotSource {
    /// Number of columns the source spans; the exclusive upper bound for
    /// every field index.
    pub fn width(&self) -> u16 {
        self.range.width()
    }
}

/// One aggregated data field.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub function: DataFunction,
    /// Column index relative to the source range
    pub source_column: u16,
    /// Explicit caption; `None` falls back to "<Function> of <field>"
    pub name: Option<String>,
}

/// How a source column participates in the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    RowLabel,
    ColumnLabel,
    DataColumn,
    ReportFilter,
}

/// One configured pivot field.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotField {
    pub source_column: u16,
    pub role: FieldRole,
}

/// A pivot table bound to a source range and an anchor cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub name: String,
    /// Numeric id, unique per workbook; also numbers the cache definition
    pub id: u32,
    pub source: PivotSource,
    /// Top-left cell of the pivot output area
    pub location: CellAddress,
    fields: Vec<PivotField>,
    data_fields: Vec<DataField>,
    /// Count of column labels added; the col-field record list is derived
    /// from it, never stored
    column_label_count: usize,
}

impl PivotTable {
    pub fn new(name: impl Into<String>, id: u32, source: PivotSource, location: CellAddress) -> Self {
        Self {
            name: name.into(),
            id,
            source,
            location,
            fields: Vec::new(),
            data_fields: Vec::new(),
            column_label_count: 0,
        }
    }

    fn check_column(&self, col_index: u16) -> Result<()> {
        let width = self.source.width();
        if col_index >= width {
            return Err(Error::out_of_range(
                "pivot source column",
                col_index as i64,
                width as i64 - 1,
            ));
        }
        Ok(())
    }

    /// Use the source column as a row label.
    pub fn add_row_label(&mut self, col_index: u16) -> Result<()> {
        self.check_column(col_index)?;
        self.fields.push(PivotField {
            source_column: col_index,
            role: FieldRole::RowLabel,
        });
        Ok(())
    }

    /// Aggregate the source column and lay the result out on the column
    /// axis. Always appends a data field; repeated functions over
    /// different columns simply accumulate.
    pub fn add_column_label(
        &mut self,
        function: DataFunction,
        col_index: u16,
        name: Option<&str>,
    ) -> Result<()> {
        self.check_column(col_index)?;
        self.fields.push(PivotField {
            source_column: col_index,
            role: FieldRole::ColumnLabel,
        });
        self.data_fields.push(DataField {
            function,
            source_column: col_index,
            name: name.map(str::to_string),
        });
        self.column_label_count += 1;
        Ok(())
    }

    /// Mark the source column as a data column, optionally as a data field.
    pub fn add_data_column(&mut self, col_index: u16, is_data_field: bool) -> Result<()> {
        self.check_column(col_index)?;
        self.fields.push(PivotField {
            source_column: col_index,
            role: FieldRole::DataColumn,
        });
        if is_data_field {
            self.data_fields.push(DataField {
                function: DataFunction::Sum,
                source_column: col_index,
                name: None,
            });
        }
        Ok(())
    }

    /// Use the source column as a report (page) filter.
    pub fn add_report_filter(&mut self, col_index: u16) -> Result<()> {
        self.check_column(col_index)?;
        self.fields.push(PivotField {
            source_column: col_index,
            role: FieldRole::ReportFilter,
        });
        Ok(())
    }

    /// All configured fields, in addition order.
    pub fn fields(&self) -> &[PivotField] {
        &self.fields
    }

    /// Source columns used as row labels, in addition order.
    pub fn row_label_columns(&self) -> Vec<u16> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::RowLabel)
            .map(|f| f.source_column)
            .collect()
    }

    /// Source columns used as report filters, in addition order.
    pub fn report_filter_columns(&self) -> Vec<u16> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::ReportFilter)
            .map(|f| f.source_column)
            .collect()
    }

    pub fn data_fields(&self) -> &[DataField] {
        &self.data_fields
    }

    /// The col-field record list: empty while at most one column label
    /// exists, a single [`DATA_FIELDS_AS_COLUMNS`] sentinel afterwards.
    pub fn col_field_values(&self) -> Vec<i32> {
        if self.column_label_count > 1 {
            vec![DATA_FIELDS_AS_COLUMNS]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pivot() -> PivotTable {
        // Source A1:C2 -> three columns, two rows
        let source = PivotSource {
            range: CellRange::parse("A1:C2").unwrap(),
            sheet_name: "Sheet1".to_string(),
            named_range: None,
        };
        PivotTable::new("Pivot1", 1, source, CellAddress::parse("H5").unwrap())
    }

    #[test]
    fn row_labels_accumulate_in_order() {
        let mut p = pivot();
        p.add_row_label(0).unwrap();
        p.add_row_label(1).unwrap();
        assert_eq!(p.row_label_columns(), [0, 1]);
        assert_eq!(p.fields().len(), 2);
    }

    #[test]
    fn index_at_width_fails_width_minus_one_succeeds() {
        let mut p = pivot();
        assert!(p.add_row_label(2).is_ok());
        let err = p.add_row_label(3).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { index: 3, max: 2, .. }));
        // Rejection leaves the builder unchanged
        assert_eq!(p.row_label_columns(), [2]);

        assert!(p.add_column_label(DataFunction::Sum, 3, None).is_err());
        assert!(p.add_data_column(3, true).is_err());
        assert!(p.add_report_filter(3).is_err());
        assert_eq!(p.data_fields().len(), 0);
    }

    #[test]
    fn single_column_label_creates_no_col_field() {
        let mut p = pivot();
        p.add_column_label(DataFunction::Sum, 0, None).unwrap();
        assert_eq!(p.col_field_values(), Vec::<i32>::new());
        assert_eq!(p.data_fields().len(), 1);
    }

    #[test]
    fn second_column_label_collapses_to_sentinel() {
        let mut p = pivot();
        p.add_column_label(DataFunction::Sum, 0, None).unwrap();
        p.add_column_label(DataFunction::Sum, 1, None).unwrap();
        assert_eq!(p.col_field_values(), [DATA_FIELDS_AS_COLUMNS]);
        assert_eq!(p.data_fields().len(), 2);

        // A third keeps the single sentinel
        p.add_column_label(DataFunction::Average, 2, Some("avg"))
            .unwrap();
        assert_eq!(p.col_field_values(), [DATA_FIELDS_AS_COLUMNS]);
        assert_eq!(p.data_fields().len(), 3);
    }

    #[test]
    fn data_column_flag_controls_data_field_creation() {
        let mut p = pivot();
        p.add_data_column(0, false).unwrap();
        assert_eq!(p.data_fields().len(), 0);
        p.add_data_column(1, true).unwrap();
        assert_eq!(p.data_fields().len(), 1);
    }

    #[test]
    fn captions() {
        assert_eq!(DataFunction::Sum.caption_prefix(), "Sum of");
        assert_eq!(DataFunction::Average.as_str(), "average");
        assert_eq!(DataFunction::StdDevP.as_str(), "stdDevp");
    }
}
