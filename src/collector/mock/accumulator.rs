//! In-memory record sink for asserting gather output in tests.

use crate::collector::traits::Accumulator;
use crate::model::{FieldMap, Record, TagMap};

/// Record sink that keeps everything it is given, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccumulator {
    records: Vec<Record>,
}

impl MemoryAccumulator {
    /// Creates a new empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in emission order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Fields of the record with the given measurement and `path` tag.
    pub fn tagged_fields(&self, measurement: &str, path: &str) -> Option<&FieldMap> {
        self.records
            .iter()
            .find(|r| {
                r.measurement == measurement && r.tags.get("path").is_some_and(|p| p == path)
            })
            .map(|r| &r.fields)
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_fields(&mut self, measurement: &str, fields: FieldMap, tags: TagMap) {
        self.records.push(Record {
            measurement: measurement.to_string(),
            fields,
            tags,
        });
    }
}
