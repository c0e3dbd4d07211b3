//! Detection and parsing of control file layouts.
//!
//! Control files use a handful of fixed textual layouts. Each layout
//! carries an anchored whole-content pattern used for detection and an
//! item pattern used for extraction. Detection walks the table in
//! declaration order and the first whole match wins; the single-value
//! form must come before the multi-line forms that would otherwise
//! shadow it.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::GatherError;
use crate::model::{FieldMap, FieldValue, TagMap};

/// Key token of the key/value layout.
const KEY_PATTERN: &str = "[[:alpha:]_]+";
/// Value token shared by all layouts. Dashes are admitted anywhere in
/// the token, so `12-781` detects fine and stays text after coercion.
const VALUE_PATTERN: &str = r"[\d-]+";

/// One recognized control file layout.
struct FileFormat {
    name: &'static str,
    /// Anchored match over the entire file content.
    whole: Regex,
    /// Per-item capture pattern driven by `build`.
    item: Regex,
    build: fn(&Regex, &str, &mut FieldMap),
}

impl FileFormat {
    fn matches(&self, content: &str) -> bool {
        self.whole.is_match(content)
    }

    /// Extracts fields and tags from content that matched this layout.
    ///
    /// No current layout emits tags; the empty tag map is an extension
    /// point for future layouts.
    fn extract(&self, content: &str) -> (FieldMap, TagMap) {
        let mut fields = FieldMap::new();
        (self.build)(&self.item, content, &mut fields);
        (fields, TagMap::new())
    }
}

/// The recognized layouts, tried in declaration order.
static FILE_FORMATS: LazyLock<[FileFormat; 4]> = LazyLock::new(|| {
    [
        // VAL\n
        FileFormat {
            name: "single value",
            whole: layout_regex(&format!("^{VALUE_PATTERN}\n$")),
            item: layout_regex(&format!("^({VALUE_PATTERN})\n$")),
            build: build_single,
        },
        // VAL0\n
        // VAL1\n
        // ...
        FileFormat {
            name: "newline separated values",
            whole: layout_regex(&format!("^({VALUE_PATTERN}\n){{2,}}$")),
            item: layout_regex(&format!("({VALUE_PATTERN})\n")),
            build: build_numbered,
        },
        // VAL0 VAL1 ...\n
        FileFormat {
            name: "space separated values",
            whole: layout_regex(&format!("^({VALUE_PATTERN} )+\n$")),
            item: layout_regex(&format!("({VALUE_PATTERN}) ")),
            build: build_numbered,
        },
        // KEY0 VAL0\n
        // KEY1 VAL1\n
        // ...
        FileFormat {
            name: "newline separated key/value pairs",
            whole: layout_regex(&format!("^({KEY_PATTERN} {VALUE_PATTERN}\n)+$")),
            item: layout_regex(&format!("({KEY_PATTERN}) ({VALUE_PATTERN})\n")),
            build: build_keyed,
        },
    ]
});

fn layout_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("layout pattern must compile")
}

fn build_single(item: &Regex, content: &str, fields: &mut FieldMap) {
    if let Some(caps) = item.captures(content) {
        fields.insert("value".to_string(), FieldValue::coerce(&caps[1]));
    }
}

fn build_numbered(item: &Regex, content: &str, fields: &mut FieldMap) {
    for (i, caps) in item.captures_iter(content).enumerate() {
        fields.insert(format!("value_{}", i), FieldValue::coerce(&caps[1]));
    }
}

fn build_keyed(item: &Regex, content: &str, fields: &mut FieldMap) {
    for caps in item.captures_iter(content) {
        fields.insert(caps[1].to_string(), FieldValue::coerce(&caps[2]));
    }
}

/// Detects the layout of `content` and extracts its fields and tags.
///
/// `path` only names the file in errors and logs. Same content always
/// yields the same result.
pub(super) fn parse(path: &Path, content: &str) -> Result<(FieldMap, TagMap), GatherError> {
    let format = FILE_FORMATS
        .iter()
        .find(|f| f.matches(content))
        .ok_or_else(|| GatherError::UnknownFormat(path.to_path_buf()))?;

    trace!(path = %path.display(), layout = format.name, "parsed control file");
    Ok(format.extract(content))
}
