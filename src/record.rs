//! Spreadsheet rows as header-keyed records.

use std::sync::Arc;

/// One data row of the table, keyed by column header
///
/// All records built from the same header row share one header list, so every
/// record of a [`RecordSet`] has exactly the same key set in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Build a standalone record from `(header, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (headers, row): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        let (headers, slots) = dedup_headers(&headers);
        Self::from_row(headers, &slots, &row)
    }

    fn from_row(headers: Arc<[String]>, slots: &[usize], row: &[String]) -> Self {
        let mut values = vec![String::new(); headers.len()];
        // Cells past the header width are dropped; missing cells stay empty
        for (slot, cell) in slots.iter().zip(row) {
            values[*slot] = cell.clone();
        }
        Self { headers, values }
    }

    /// Value of `column`, or `None` when the table has no such header
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .map(|index| self.values[index].as_str())
    }

    /// Column headers in table order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    /// `(header, value)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The full fetched table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Build records from raw rows; the first row is the header row
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let Some(header_row) = rows.next() else {
            return Self::default();
        };

        let (headers, slots) = dedup_headers(&header_row);
        let records = rows
            .map(|row| Record::from_row(Arc::clone(&headers), &slots, &row))
            .collect();

        Self {
            headers: headers.to_vec(),
            records,
        }
    }

    /// Unique column headers in table order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Collapse repeated headers: the first occurrence keeps its position, later cells
/// under the same header overwrite the value. Returns the unique headers and, for
/// every raw column, the slot it writes to.
fn dedup_headers(raw: &[String]) -> (Arc<[String]>, Vec<usize>) {
    let mut unique: Vec<String> = Vec::with_capacity(raw.len());
    let mut slots = Vec::with_capacity(raw.len());

    for header in raw {
        match unique.iter().position(|existing| existing == header) {
            Some(slot) => slots.push(slot),
            None => {
                slots.push(unique.len());
                unique.push(header.clone());
            }
        }
    }

    (unique.into(), slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_short_rows_are_padded() {
        let set = RecordSet::from_rows(rows(&[&["A", "B", "C"], &["1"], &["1", "2", "3"]]));

        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].get("A"), Some("1"));
        assert_eq!(set.records()[0].get("B"), Some(""));
        assert_eq!(set.records()[0].get("C"), Some(""));
        assert_eq!(set.records()[1].get("C"), Some("3"));
    }

    #[test]
    fn test_extra_cells_are_ignored() {
        let set = RecordSet::from_rows(rows(&[&["A", "B"], &["1", "2", "overflow"]]));

        let record = &set.records()[0];
        assert_eq!(record.len(), 2);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(record.iter().all(|(_, value)| value != "overflow"));
    }

    #[test]
    fn test_every_record_has_the_header_key_set() {
        let set = RecordSet::from_rows(rows(&[&["X", "Y"], &[], &["a"], &["a", "b"]]));

        for record in &set {
            assert_eq!(record.keys().collect::<Vec<_>>(), vec!["X", "Y"]);
        }
    }

    #[test]
    fn test_header_only_and_empty_tables() {
        let set = RecordSet::from_rows(rows(&[&["A", "B"]]));
        assert!(set.is_empty());
        assert_eq!(set.headers(), &["A".to_string(), "B".to_string()]);

        let set = RecordSet::from_rows(Vec::new());
        assert!(set.is_empty());
        assert!(set.headers().is_empty());
    }

    #[test]
    fn test_duplicate_headers_keep_last_value() {
        let set = RecordSet::from_rows(rows(&[&["A", "B", "A"], &["first", "b", "last"]]));

        let record = &set.records()[0];
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(record.get("A"), Some("last"));
    }

    #[test]
    fn test_missing_column_lookup() {
        let record = Record::from_pairs([("A", "1")]);
        assert_eq!(record.get("A"), Some("1"));
        assert_eq!(record.get("Z"), None);
    }
}
