//! Search expression construction.
//!
//! The expression is always a disjunction over [`SUBSTANCES`]; callers cannot
//! inject free text. An optional inclusive post-date range can be attached.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Date format accepted on the command line and sent to the API.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Closed keyword vocabulary searched for.
pub const SUBSTANCES: &[&str] = &[
    "MDMA",
    "psilocybin",
    "ketamine",
    "ayahuasca",
    "kratom",
    "DMT",
    "psilocin",
    "ibogaine",
    "iboga",
    "2C-B",
    "mescaline",
    "peyote",
    "salvia divinorum",
];

/// Inclusive calendar range, `begin <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    begin: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Parse two `mm/dd/yyyy` dates.
    pub fn parse(begin: &str, end: &str) -> Result<Self, ValidationError> {
        let b = parse_date(begin)?;
        let e = parse_date(end)?;
        if b > e {
            return Err(ValidationError::DateOrder {
                begin: begin.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { begin: b, end: e })
    }

    pub fn begin(&self) -> NaiveDate {
        self.begin
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::DateFormat {
        value: value.to_string(),
    })
}

/// Immutable search configuration for one aggregation run.
#[derive(Debug, Clone)]
pub struct Query {
    terms: Vec<String>,
    range: Option<DateRange>,
    filter_by_post_date: bool,
}

impl Query {
    /// Query over the built-in substance vocabulary.
    pub fn substances(range: Option<DateRange>) -> Self {
        Self {
            terms: SUBSTANCES.iter().map(|s| s.to_string()).collect(),
            range,
            filter_by_post_date: false,
        }
    }

    /// Restrict results to studies first posted within the date range.
    pub fn with_post_date_filter(mut self, enabled: bool) -> Self {
        self.filter_by_post_date = enabled;
        self
    }

    /// Render the API search expression.
    pub fn expression(&self) -> String {
        let mut expr = format!("({})", self.terms.join(" OR "));
        if let (true, Some(range)) = (self.filter_by_post_date, self.range) {
            expr.push_str(&format!(
                " AND AREA[StudyFirstPostDate]RANGE[{}, {}]",
                range.begin.format(DATE_FORMAT),
                range.end.format(DATE_FORMAT)
            ));
        }
        expr
    }
}
