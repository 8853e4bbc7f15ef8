//! # Search Module
//!
//! Exact, case-insensitive lookup of participants in the fetched table.
//!
//! ## Features
//!
//! - Combined search: surname, name, patronymic and class must all match
//! - Single-column search for any header
//! - Values are compared after trimming and lowercasing; records are never modified
//! - Parsing of the one-line combined query typed by the user

use tracing::{debug, info, warn};

use crate::config::ColumnsConfig;
use crate::record::Record;

/// Normalize a value for comparison
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// The four logical search fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Surname,
    Name,
    Patronymic,
    Class,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Surname,
        SearchField::Name,
        SearchField::Patronymic,
        SearchField::Class,
    ];

    /// Header name of this field in the configured table layout
    pub fn column<'a>(&self, columns: &'a ColumnsConfig) -> &'a str {
        match self {
            SearchField::Surname => &columns.surname,
            SearchField::Name => &columns.name,
            SearchField::Patronymic => &columns.patronymic,
            SearchField::Class => &columns.class,
        }
    }
}

/// Why a combined query could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    /// Nothing but whitespace was entered
    Empty,
    /// Fewer than four whitespace-separated parts
    TooFewParts { found: usize },
}

impl std::fmt::Display for QueryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryParseError::Empty => write!(f, "empty query"),
            QueryParseError::TooFewParts { found } => {
                write!(f, "expected at least 4 parts, found {found}")
            }
        }
    }
}

impl std::error::Error for QueryParseError {}

/// Raw query values as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub class_label: String,
}

impl Query {
    pub fn new(
        surname: impl Into<String>,
        name: impl Into<String>,
        patronymic: impl Into<String>,
        class_label: impl Into<String>,
    ) -> Self {
        Self {
            surname: surname.into(),
            name: name.into(),
            patronymic: patronymic.into(),
            class_label: class_label.into(),
        }
    }

    /// Parse "Surname Name Patronymic Class"; everything after the third part is the class
    pub fn parse(text: &str) -> Result<Self, QueryParseError> {
        let parts: Vec<&str> = text.split_whitespace().collect();

        match parts.len() {
            0 => Err(QueryParseError::Empty),
            found @ 1..=3 => Err(QueryParseError::TooFewParts { found }),
            _ => Ok(Self::new(parts[0], parts[1], parts[2], parts[3..].join(" "))),
        }
    }

    pub fn value(&self, field: SearchField) -> &str {
        match field {
            SearchField::Surname => &self.surname,
            SearchField::Name => &self.name,
            SearchField::Patronymic => &self.patronymic,
            SearchField::Class => &self.class_label,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.surname, self.name, self.patronymic, self.class_label
        )
    }
}

/// Match engine over header-keyed records
#[derive(Debug, Clone, Default)]
pub struct SearchService {
    columns: ColumnsConfig,
}

impl SearchService {
    pub fn new(columns: ColumnsConfig) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &ColumnsConfig {
        &self.columns
    }

    /// Records whose `field_name` column equals `search_value`
    pub fn search_by_field<'a, I>(
        &self,
        records: I,
        field_name: &str,
        search_value: &str,
    ) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        if search_value.is_empty() {
            warn!(field = field_name, "Search called with empty search value");
            return Vec::new();
        }
        // A whitespace-only value normalizes to "" and matches blank cells
        let needle = normalize(search_value);
        if !self.columns.is_searchable(field_name) {
            debug!(field = field_name, "Searching a column outside the four lookup fields");
        }

        let results: Vec<&Record> = records
            .into_iter()
            .filter(|record| normalize(record.get(field_name).unwrap_or("")) == needle)
            .collect();

        info!(
            field = field_name,
            value = search_value,
            results = results.len(),
            "Search by field completed"
        );
        results
    }

    /// Records matching all four query fields, in table order
    pub fn search_by_all_fields<'a, I>(&self, records: I, query: &Query) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let wanted: Vec<(&str, String)> = SearchField::ALL
            .iter()
            .map(|field| (field.column(&self.columns), normalize(query.value(*field))))
            .collect();

        let results: Vec<&Record> = records
            .into_iter()
            .filter(|record| {
                wanted
                    .iter()
                    .all(|(column, value)| normalize(record.get(column).unwrap_or("")) == *value)
            })
            .collect();

        info!(query = %query, results = results.len(), "Search by all fields completed");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combined_query() {
        let query = Query::parse("  Иванов  Иван Иванович 10 А ").unwrap();
        assert_eq!(query, Query::new("Иванов", "Иван", "Иванович", "10 А"));
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert_eq!(Query::parse("   "), Err(QueryParseError::Empty));
        assert_eq!(
            Query::parse("Иванов Иван"),
            Err(QueryParseError::TooFewParts { found: 2 })
        );
        assert_eq!(
            Query::parse("Иванов Иван Иванович"),
            Err(QueryParseError::TooFewParts { found: 3 })
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  ИВАНОВ\t"), "иванов");
        assert_eq!(normalize("10А"), "10а");
    }

    #[test]
    fn test_field_columns() {
        let columns = ColumnsConfig::default();
        let headers: Vec<&str> = SearchField::ALL.iter().map(|f| f.column(&columns)).collect();
        assert_eq!(headers, vec!["Фамилия", "Имя", "Отчество", "Класс"]);
    }
}
