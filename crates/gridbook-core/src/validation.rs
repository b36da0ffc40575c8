//! Data validation
//!
//! Validation rules restrict what may be entered into the cells of one or
//! more rectangular ranges. A `List` constraint's source is either an
//! explicit literal list (the whole source wrapped in double quotes,
//! comma-separated) or a formula/named-range reference; the two are
//! mutually exclusive and [`DataValidation::explicit_list_values`] tells
//! them apart.

use crate::addr::CellRange;

/// Data validation rule for cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    /// Constraint kind
    pub constraint: ValidationConstraint,
    /// Cell ranges this validation applies to
    pub ranges: Vec<CellRange>,
    /// Allow blank/empty cells
    pub allow_blank: bool,
    /// Show dropdown for list validation
    pub show_dropdown: bool,
    /// Show input message when cell is selected
    pub show_input_message: bool,
    pub input_title: Option<String>,
    pub input_message: Option<String>,
    /// Show error alert when invalid data entered
    pub show_error_alert: bool,
    pub error_style: ValidationErrorStyle,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            constraint: ValidationConstraint::None,
            ranges: Vec::new(),
            allow_blank: true,
            show_dropdown: true,
            show_input_message: false,
            input_title: None,
            input_message: None,
            show_error_alert: true,
            error_style: ValidationErrorStyle::Stop,
            error_title: None,
            error_message: None,
        }
    }
}

impl DataValidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// List validation (dropdown).
    ///
    /// `source` is either an explicit literal list in its quoted form
    /// (`"\"Yes, No, Maybe\""`) or a cell/named-range reference
    /// (`"$A$1:$A$5"` or `"Colors"`).
    pub fn list(source: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::List {
                source: source.into(),
            },
            ..Self::default()
        }
    }

    /// List validation from literal values, quoting them into the stored
    /// source form.
    pub fn explicit_list<S: AsRef<str>>(values: &[S]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        Self::list(format!("\"{joined}\""))
    }

    pub fn whole_number(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::Whole {
                operator,
                value1: value1.into(),
                value2: None,
            },
            ..Self::default()
        }
    }

    pub fn whole_number_between(value1: impl Into<String>, value2: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::Whole {
                operator: ValidationOperator::Between,
                value1: value1.into(),
                value2: Some(value2.into()),
            },
            ..Self::default()
        }
    }

    pub fn decimal(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::Decimal {
                operator,
                value1: value1.into(),
                value2: None,
            },
            ..Self::default()
        }
    }

    pub fn date(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::Date {
                operator,
                value1: value1.into(),
                value2: None,
            },
            ..Self::default()
        }
    }

    pub fn text_length(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::TextLength {
                operator,
                value1: value1.into(),
                value2: None,
            },
            ..Self::default()
        }
    }

    /// Custom formula validation; the formula returns TRUE for valid input.
    pub fn custom(formula: impl Into<String>) -> Self {
        Self {
            constraint: ValidationConstraint::Custom {
                formula: formula.into(),
            },
            ..Self::default()
        }
    }

    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn with_ranges(mut self, ranges: Vec<CellRange>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    pub fn with_dropdown(mut self, show: bool) -> Self {
        self.show_dropdown = show;
        self
    }

    pub fn with_input_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.show_input_message = true;
        self.input_title = Some(title.into());
        self.input_message = Some(message.into());
        self
    }

    pub fn with_error_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.show_error_alert = true;
        self.error_title = Some(title.into());
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_style(mut self, style: ValidationErrorStyle) -> Self {
        self.error_style = style;
        self
    }

    /// Whether this validation covers the cell at (row, col).
    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(row, col))
    }

    /// The literal values of an explicit list source.
    ///
    /// Returns `Some` only for a `List` constraint whose source is the
    /// quoted literal form: the surrounding quotes are stripped, entries
    /// split on commas, surrounding whitespace trimmed, and any quotes
    /// INSIDE an entry preserved as written. A list backed by a cell or
    /// named-range reference has no literal values and returns `None`.
    pub fn explicit_list_values(&self) -> Option<Vec<String>> {
        let ValidationConstraint::List { source } = &self.constraint else {
            return None;
        };
        let inner = source
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))?;
        Some(inner.split(',').map(|v| v.trim().to_string()).collect())
    }
}

/// Constraint kinds for data validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValidationConstraint {
    /// No restriction
    #[default]
    None,
    /// Whole number
    Whole {
        operator: ValidationOperator,
        value1: String,
        value2: Option<String>,
    },
    /// Decimal number
    Decimal {
        operator: ValidationOperator,
        value1: String,
        value2: Option<String>,
    },
    /// Value from a list: either a quoted literal list or a reference
    List { source: String },
    /// Date
    Date {
        operator: ValidationOperator,
        value1: String,
        value2: Option<String>,
    },
    /// Time
    Time {
        operator: ValidationOperator,
        value1: String,
        value2: Option<String>,
    },
    /// Text length
    TextLength {
        operator: ValidationOperator,
        value1: String,
        value2: Option<String>,
    },
    /// Custom formula returning TRUE/FALSE
    Custom { formula: String },
}

impl ValidationConstraint {
    /// The `type` attribute value in sheet XML.
    pub fn xlsx_type(&self) -> &'static str {
        match self {
            ValidationConstraint::None => "none",
            ValidationConstraint::Whole { .. } => "whole",
            ValidationConstraint::Decimal { .. } => "decimal",
            ValidationConstraint::List { .. } => "list",
            ValidationConstraint::Date { .. } => "date",
            ValidationConstraint::Time { .. } => "time",
            ValidationConstraint::TextLength { .. } => "textLength",
            ValidationConstraint::Custom { .. } => "custom",
        }
    }

    /// Formula1/formula2 contents for sheet XML.
    pub fn formulas(&self) -> (Option<&str>, Option<&str>) {
        match self {
            ValidationConstraint::None => (None, None),
            ValidationConstraint::List { source } => (Some(source), None),
            ValidationConstraint::Custom { formula } => (Some(formula), None),
            ValidationConstraint::Whole { value1, value2, .. }
            | ValidationConstraint::Decimal { value1, value2, .. }
            | ValidationConstraint::Date { value1, value2, .. }
            | ValidationConstraint::Time { value1, value2, .. }
            | ValidationConstraint::TextLength { value1, value2, .. } => {
                (Some(value1), value2.as_deref())
            }
        }
    }

    pub fn operator(&self) -> Option<ValidationOperator> {
        match self {
            ValidationConstraint::Whole { operator, .. }
            | ValidationConstraint::Decimal { operator, .. }
            | ValidationConstraint::Date { operator, .. }
            | ValidationConstraint::Time { operator, .. }
            | ValidationConstraint::TextLength { operator, .. } => Some(*operator),
            _ => None,
        }
    }
}

/// Comparison operators for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ValidationOperator {
    pub fn xlsx_operator(&self) -> &'static str {
        match self {
            ValidationOperator::Between => "between",
            ValidationOperator::NotBetween => "notBetween",
            ValidationOperator::Equal => "equal",
            ValidationOperator::NotEqual => "notEqual",
            ValidationOperator::GreaterThan => "greaterThan",
            ValidationOperator::LessThan => "lessThan",
            ValidationOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            ValidationOperator::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "between" => Some(ValidationOperator::Between),
            "notBetween" => Some(ValidationOperator::NotBetween),
            "equal" => Some(ValidationOperator::Equal),
            "notEqual" => Some(ValidationOperator::NotEqual),
            "greaterThan" => Some(ValidationOperator::GreaterThan),
            "lessThan" => Some(ValidationOperator::LessThan),
            "greaterThanOrEqual" => Some(ValidationOperator::GreaterThanOrEqual),
            "lessThanOrEqual" => Some(ValidationOperator::LessThanOrEqual),
            _ => None,
        }
    }

    pub fn requires_two_values(&self) -> bool {
        matches!(
            self,
            ValidationOperator::Between | ValidationOperator::NotBetween
        )
    }
}

/// Error alert styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    /// Reject invalid data (default)
    #[default]
    Stop,
    /// Warn but allow
    Warning,
    /// Just inform
    Information,
}

impl ValidationErrorStyle {
    pub fn xlsx_style(&self) -> &'static str {
        match self {
            ValidationErrorStyle::Stop => "stop",
            ValidationErrorStyle::Warning => "warning",
            ValidationErrorStyle::Information => "information",
        }
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(ValidationErrorStyle::Stop),
            "warning" => Some(ValidationErrorStyle::Warning),
            "information" => Some(ValidationErrorStyle::Information),
            _ => None,
        }
    }
}
