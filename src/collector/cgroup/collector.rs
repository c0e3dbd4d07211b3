//! Rule orchestration and per-directory aggregation.

use std::path::Path;

use tracing::debug;

use super::expand::expand;
use super::{GatherError, format};
use crate::collector::traits::{Accumulator, FileSystem};
use crate::config::Config;
use crate::model::{FieldMap, TagMap};

/// Namespace token prepended to every measurement name.
const MEASUREMENT_PREFIX: &str = "cgroup:";

/// One collection rule: directory patterns paired with control file names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rule {
    /// Path prefix joined in front of every pattern. A blank prefix is
    /// replaced by the collector-wide one; when both are blank the
    /// patterns must be absolute.
    pub prefix: String,
    /// Directory patterns with single-segment `*` wildcards.
    pub paths: Vec<String>,
    /// Control file names read from every matched directory.
    pub fields: Vec<String>,
}

impl Rule {
    /// Measurement name of the per-directory record: the first declared
    /// field name up to its first `.`.
    fn measurement(&self) -> &str {
        let first = self.fields.first().map(String::as_str).unwrap_or_default();
        first.split('.').next().unwrap_or(first)
    }
}

/// Rule-driven control-group statistics collector.
///
/// Expands each rule's path patterns into concrete directories, parses
/// the declared control files in every matched directory and pushes the
/// resulting records into an [`Accumulator`].
#[derive(Debug)]
pub struct CgroupCollector<F: FileSystem> {
    fs: F,
    rules: Vec<Rule>,
}

impl<F: FileSystem> CgroupCollector<F> {
    /// Creates a collector from a global prefix and a set of rules.
    ///
    /// Prefixes are trimmed and defaulted once here; the rules are
    /// read-only afterwards. Fails before any I/O when a rule declares
    /// no usable path or field.
    pub fn new(fs: F, prefix: &str, rules: Vec<Rule>) -> Result<Self, GatherError> {
        let rules = normalize(prefix, rules)?;
        Ok(Self { fs, rules })
    }

    /// Creates a collector from a loaded rules file.
    pub fn from_config(fs: F, config: &Config) -> Result<Self, GatherError> {
        let rules = config
            .rules
            .iter()
            .map(|r| Rule {
                prefix: r.prefix.clone(),
                paths: r.paths.clone(),
                fields: r.fields.clone(),
            })
            .collect();
        Self::new(fs, &config.prefix, rules)
    }

    /// Runs one gather cycle over all rules.
    ///
    /// The first failure aborts the cycle for all rules; records already
    /// pushed into `acc` stay there.
    pub fn gather<A: Accumulator>(&self, acc: &mut A) -> Result<(), GatherError> {
        for rule in &self.rules {
            self.gather_rule(rule, acc)?;
        }
        Ok(())
    }

    fn gather_rule<A: Accumulator>(&self, rule: &Rule, acc: &mut A) -> Result<(), GatherError> {
        for pattern in &rule.paths {
            for dir in expand(&rule.prefix, pattern)? {
                self.gather_dir(&dir?, rule, acc)?;
            }
        }
        Ok(())
    }

    /// Reads every declared control file under `dir` and folds the
    /// results into records.
    ///
    /// Files whose layout yields exactly one field fold into the
    /// per-directory record, emitted unconditionally at the end even
    /// when it carries no fields. Files with more than one field become
    /// standalone records immediately, tagged with the file path. Empty
    /// files contribute nothing.
    fn gather_dir<A: Accumulator>(
        &self,
        dir: &Path,
        rule: &Rule,
        acc: &mut A,
    ) -> Result<(), GatherError> {
        debug!(dir = %dir.display(), "gathering control files");
        let mut single_values = FieldMap::new();

        for file in &rule.fields {
            let path = dir.join(file);
            let raw = self
                .fs
                .read_to_string(&path)
                .map_err(|source| GatherError::Io {
                    path: path.clone(),
                    source,
                })?;
            if raw.is_empty() {
                continue;
            }

            let (fields, mut tags) = format::parse(&path, &raw)?;

            if fields.len() == 1 {
                if let Some((_, value)) = fields.into_iter().next() {
                    single_values.insert(file.clone(), value);
                }
            } else {
                tags.insert("path".to_string(), path.to_string_lossy().into_owned());
                acc.add_fields(&format!("{}{}", MEASUREMENT_PREFIX, file), fields, tags);
            }
        }

        let mut tags = TagMap::new();
        tags.insert("path".to_string(), dir.to_string_lossy().into_owned());
        acc.add_fields(
            &format!("{}{}", MEASUREMENT_PREFIX, rule.measurement()),
            single_values,
            tags,
        );

        Ok(())
    }
}

/// Trims and defaults rule prefixes and checks that every rule keeps at
/// least one non-blank path and one non-blank field.
fn normalize(prefix: &str, mut rules: Vec<Rule>) -> Result<Vec<Rule>, GatherError> {
    let prefix = prefix.trim();

    for (i, rule) in rules.iter_mut().enumerate() {
        rule.prefix = rule.prefix.trim().to_string();
        if rule.prefix.is_empty() {
            rule.prefix = prefix.to_string();
        }

        if !rule.paths.iter().any(|p| !p.trim().is_empty()) {
            return Err(GatherError::Config(format!("rule #{} has no usable path", i)));
        }
        if !rule.fields.iter().any(|f| !f.trim().is_empty()) {
            return Err(GatherError::Config(format!(
                "rule #{} has no usable field",
                i
            )));
        }
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MemoryAccumulator, MockFs};
    use crate::model::FieldValue;

    fn rule(fields: &[&str]) -> Rule {
        Rule {
            prefix: String::new(),
            paths: vec!["/".to_string()],
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn collector(fs: MockFs) -> CgroupCollector<MockFs> {
        CgroupCollector::new(fs, "", vec![rule(&["memory.limit_in_bytes"])]).unwrap()
    }

    #[test]
    fn test_gather_dir_folds_single_values() {
        let mut fs = MockFs::new();
        fs.add_file("/cg/memory/memory.limit_in_bytes", "1073741824\n");
        fs.add_file("/cg/memory/memory.use_hierarchy", "12-781\n");

        let c = collector(fs);
        let r = rule(&["memory.limit_in_bytes", "memory.use_hierarchy"]);
        let mut acc = MemoryAccumulator::new();
        c.gather_dir(Path::new("/cg/memory"), &r, &mut acc).unwrap();

        assert_eq!(acc.records().len(), 1);
        let fields = acc.tagged_fields("cgroup:memory", "/cg/memory").unwrap();
        assert_eq!(
            fields.get("memory.limit_in_bytes"),
            Some(&FieldValue::Int(1073741824))
        );
        assert_eq!(
            fields.get("memory.use_hierarchy"),
            Some(&FieldValue::from("12-781"))
        );
    }

    #[test]
    fn test_gather_dir_emits_multi_value_record() {
        let mut fs = MockFs::new();
        fs.add_file("/cg/memory/memory.stat", "cache 123\nrss 456\n");

        let c = collector(fs);
        let r = rule(&["memory.stat"]);
        let mut acc = MemoryAccumulator::new();
        c.gather_dir(Path::new("/cg/memory"), &r, &mut acc).unwrap();

        // One standalone record for the file, one for the directory.
        assert_eq!(acc.records().len(), 2);
        let stat = acc
            .tagged_fields("cgroup:memory.stat", "/cg/memory/memory.stat")
            .unwrap();
        assert_eq!(stat.get("cache"), Some(&FieldValue::Int(123)));
        assert_eq!(stat.get("rss"), Some(&FieldValue::Int(456)));

        let dir = acc.tagged_fields("cgroup:memory", "/cg/memory").unwrap();
        assert!(dir.is_empty());
    }

    #[test]
    fn test_gather_dir_skips_empty_files() {
        let mut fs = MockFs::new();
        fs.add_file("/cg/memory/memory.empty", "");
        fs.add_file("/cg/memory/memory.limit_in_bytes", "1\n");

        let c = collector(fs);
        let r = rule(&["memory.empty", "memory.limit_in_bytes"]);
        let mut acc = MemoryAccumulator::new();
        c.gather_dir(Path::new("/cg/memory"), &r, &mut acc).unwrap();

        // The directory record still derives its name from the first field.
        let fields = acc.tagged_fields("cgroup:memory", "/cg/memory").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.get("memory.limit_in_bytes"),
            Some(&FieldValue::Int(1))
        );
    }

    #[test]
    fn test_gather_dir_single_keyed_line_folds_under_file_name() {
        let mut fs = MockFs::new();
        fs.add_file("/cg/memory/memory.oom_control", "oom_kill_disable 0\n");

        let c = collector(fs);
        let r = rule(&["memory.oom_control"]);
        let mut acc = MemoryAccumulator::new();
        c.gather_dir(Path::new("/cg/memory"), &r, &mut acc).unwrap();

        let fields = acc.tagged_fields("cgroup:memory", "/cg/memory").unwrap();
        assert_eq!(
            fields.get("memory.oom_control"),
            Some(&FieldValue::Int(0))
        );
    }

    #[test]
    fn test_gather_dir_missing_file_aborts() {
        let c = collector(MockFs::new());
        let r = rule(&["memory.limit_in_bytes"]);
        let mut acc = MemoryAccumulator::new();

        let err = c
            .gather_dir(Path::new("/cg/memory"), &r, &mut acc)
            .unwrap_err();
        assert!(matches!(err, GatherError::Io { .. }));
        // No directory record once a read has failed.
        assert!(acc.records().is_empty());
    }

    #[test]
    fn test_gather_dir_unknown_format_aborts() {
        let mut fs = MockFs::new();
        fs.add_file("/cg/memory/memory.limit_in_bytes", "not numbers\n");

        let c = collector(fs);
        let r = rule(&["memory.limit_in_bytes"]);
        let mut acc = MemoryAccumulator::new();

        let err = c
            .gather_dir(Path::new("/cg/memory"), &r, &mut acc)
            .unwrap_err();
        assert!(matches!(err, GatherError::UnknownFormat(_)));
        assert!(acc.records().is_empty());
    }

    #[test]
    fn test_normalize_requires_paths_and_fields() {
        let no_paths = Rule {
            prefix: String::new(),
            paths: vec![" ".to_string()],
            fields: vec!["memory.limit_in_bytes".to_string()],
        };
        let err = CgroupCollector::new(MockFs::new(), "", vec![no_paths]).unwrap_err();
        assert_eq!(err.to_string(), "rule #0 has no usable path");

        let no_fields = Rule {
            prefix: String::new(),
            paths: vec!["/".to_string()],
            fields: Vec::new(),
        };
        let err = CgroupCollector::new(MockFs::new(), "", vec![no_fields]).unwrap_err();
        assert_eq!(err.to_string(), "rule #0 has no usable field");
    }

    #[test]
    fn test_normalize_defaults_rule_prefix() {
        let r = Rule {
            prefix: "  ".to_string(),
            paths: vec!["/".to_string()],
            fields: vec!["pids.max".to_string()],
        };
        let normalized = normalize(" /sys/fs/cgroup ", vec![r.clone()]).unwrap();
        assert_eq!(normalized[0].prefix, "/sys/fs/cgroup");

        let own = Rule {
            prefix: "/other".to_string(),
            ..r
        };
        let normalized = normalize("/sys/fs/cgroup", vec![own]).unwrap();
        assert_eq!(normalized[0].prefix, "/other");
    }

    #[test]
    fn test_rule_measurement() {
        let r = rule(&["memory.limit_in_bytes", "memory.stat"]);
        assert_eq!(r.measurement(), "memory");

        let plain = rule(&["pids"]);
        assert_eq!(plain.measurement(), "pids");
    }
}
