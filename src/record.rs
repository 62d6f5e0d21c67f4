use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{FieldError, Result};
use crate::format::DuplicateHeaderMode;

/// The header name→index map shared by a `Parser` and every `Record` it
/// produces.
///
/// Shared via `Rc` (spec §9's "shared header map" design note) rather than
/// copied into each record: header resolution happens once, and records
/// are cheap to hand around without re-deriving it. This crate is
/// single-threaded by design (spec §5), so `Rc` rather than `Arc`.
#[derive(Debug, PartialEq, Eq)]
pub struct Headers {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub(crate) fn build(
        names: Vec<String>,
        mode: DuplicateHeaderMode,
    ) -> std::result::Result<Headers, String> {
        let mut index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if index.contains_key(name) {
                match mode {
                    DuplicateHeaderMode::Disallow => return Err(name.clone()),
                    DuplicateHeaderMode::AllowEmpty => return Err(name.clone()),
                    DuplicateHeaderMode::AllowAll => {
                        // Keep the first occurrence; later ones are present
                        // positionally but not addressable by name.
                    }
                }
            } else {
                index.insert(name.clone(), i);
            }
        }
        Ok(Headers { names, index })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One parsed row: an ordered sequence of fields plus the metadata that
/// accompanied it (record number, source position, any preceding
/// comments).
///
/// Equality compares only field values, matching spec §8's round-trip
/// property (`parse(print(R, F)) == R`) without requiring the two records
/// to share the same header handle or have come from the same stream
/// position.
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) values: Vec<String>,
    pub(crate) null_mask: Vec<bool>,
    pub(crate) header: Option<Rc<Headers>>,
    pub(crate) record_number: u64,
    pub(crate) character_position: i64,
    pub(crate) byte_position: i64,
    pub(crate) comment: Option<String>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.values == other.values
    }
}

impl Eq for Record {}

impl Record {
    /// The field at `index`, or `FieldError::MissingIndex` if the record
    /// is shorter than that. A value equal to the format's null sentinel
    /// is reported as `Ok(None)`.
    pub fn get(&self, index: usize) -> Result<Option<&str>> {
        if index >= self.values.len() {
            return Err(FieldError::MissingIndex.into());
        }
        if self.null_mask[index] {
            Ok(None)
        } else {
            Ok(Some(&self.values[index]))
        }
    }

    /// The field named `name` in the header, or `FieldError::UnknownName`
    /// if no such column exists, or `FieldError::MissingIndex` if this
    /// particular record is shorter than that column's position (spec
    /// §4.4: short rows are valid, always checked against this record's
    /// own length, regardless of `allow_missing_column_names`).
    pub fn get_by_name(&self, name: &str) -> Result<Option<&str>> {
        let header = self
            .header
            .as_ref()
            .and_then(|h| h.index_of(name))
            .ok_or(FieldError::UnknownName)?;
        self.get(header)
    }

    /// A defensive copy of every field, in order, including the raw
    /// sentinel text for null fields.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The number of fields in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether this record's length matches the header's length (always
    /// `true` when there is no header).
    pub fn is_consistent(&self) -> bool {
        match &self.header {
            Some(h) => h.len() == self.values.len(),
            None => true,
        }
    }

    /// Whether `name` is a column of the shared header (irrespective of
    /// whether this particular record is long enough to have that field).
    pub fn is_mapped(&self, name: &str) -> bool {
        self.header
            .as_ref()
            .map_or(false, |h| h.index_of(name).is_some())
    }

    /// A name→value map built from the header, skipping names beyond this
    /// record's length and empty (unnamed) header slots.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(header) = &self.header {
            for (name, &idx) in &header.index {
                if idx < self.values.len() {
                    map.insert(name.clone(), self.values[idx].clone());
                }
            }
        }
        map
    }

    /// This record's 1-based position among records yielded by the
    /// parser that produced it. The header row, if consumed from the
    /// stream, does not count.
    pub fn record_number(&self) -> u64 {
        self.record_number
    }

    /// The character offset at which this record started, always tracked
    /// in this implementation (see `SPEC_FULL.md` §B.3).
    pub fn character_position(&self) -> i64 {
        self.character_position
    }

    /// The byte offset at which this record started, always tracked in
    /// this implementation.
    pub fn byte_position(&self) -> i64 {
        self.byte_position
    }

    /// Comment text (newline-joined, for consecutive comment lines)
    /// accumulated since the previous record, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}
