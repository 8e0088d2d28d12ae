//! Product and characteristic records, and the ordered set they accumulate into.

use std::collections::HashSet;

/// Column holding the resume key in the checkpoint file.
pub const URL_COLUMN: &str = "url";

/// Base fields of one product page. Built fresh for every URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    pub url: String,
    pub name: String,
    /// Breadcrumb labels, outer to inner, joined with `", "`.
    pub categories: String,
    pub price: String,
    pub unit: Option<String>,
}

impl Product {
    pub fn new(url: &str) -> Self {
        Product {
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Product fields as the default layer of a record. `url` sits in the fifth
    /// column so checkpoints stay readable by older positional readers.
    pub fn fields(&self) -> CharacteristicRecord {
        let mut record = CharacteristicRecord::new();
        record.insert("name", &self.name);
        record.insert("categories", &self.categories);
        record.insert("price", &self.price);
        record.insert("unit", self.unit.as_deref().unwrap_or_default());
        record.insert(URL_COLUMN, &self.url);
        record
    }
}

/// Insertion-ordered attribute map. Re-inserting a key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicRecord {
    fields: Vec<(String, String)>,
}

impl CharacteristicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn url(&self) -> Option<&str> {
        self.get(URL_COLUMN)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overlay merge: `self` provides defaults, `scraped` wins on key collision.
    /// Existing keys keep their position; new keys are appended in scrape order.
    pub fn overlay<I, K, V>(mut self, scraped: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in scraped {
            self.insert(key, value);
        }
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CharacteristicRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        CharacteristicRecord::new().overlay(iter)
    }
}

/// Pairs consecutive texts as `(name, value)`. A trailing unpaired name is dropped.
pub fn pair_characteristics<I>(texts: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = String>,
{
    let mut pairs = Vec::new();
    let mut texts = texts.into_iter();
    while let (Some(name), Some(value)) = (texts.next(), texts.next()) {
        pairs.push((name, value));
    }
    pairs
}

/// Every record produced so far in a run, restored ones first.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<CharacteristicRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CharacteristicRecord) {
        self.records.push(record);
    }

    pub fn extend<I: IntoIterator<Item = CharacteristicRecord>>(&mut self, records: I) {
        self.records.extend(records);
    }

    /// Drops everything after the first `len` records.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacteristicRecord> {
        self.records.iter()
    }

    /// Union of every record's keys in first-seen order.
    pub fn schema(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for key in self.records.iter().flat_map(|r| r.keys()) {
            if seen.insert(key) {
                columns.push(key.to_string());
            }
        }
        columns
    }
}
