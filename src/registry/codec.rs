//! Encoding and decoding of individual registry lines.

use crate::context::LockScope;
use crate::error::{Result, SimpleLockError};

/// Separator between the fields of a registry line.
pub const FIELD_DELIMITER: char = '\t';

/// Number of fields in a well-formed registry line.
pub const FIELD_COUNT: usize = 5;

/// One active lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub repo_id: String,
    pub branch: String,
    pub path: String,
    pub owner: String,
    pub purpose: String,
}

impl LockRecord {
    /// Create a record for `path` in `scope`.
    pub fn new(scope: &LockScope, path: &str, owner: &str, purpose: &str) -> Self {
        Self {
            repo_id: scope.repo_id.clone(),
            branch: scope.branch.clone(),
            path: path.to_string(),
            owner: owner.to_string(),
            purpose: purpose.to_string(),
        }
    }

    /// Encode as a newline-terminated registry line.
    ///
    /// Fails if any field contains the delimiter or a line break, since such a
    /// record could not be read back.
    pub fn encode(&self) -> Result<String> {
        let fields = self.fields();
        for (name, value) in ["repo id", "branch", "path", "owner", "purpose"]
            .iter()
            .zip(fields)
        {
            if value.contains([FIELD_DELIMITER, '\n', '\r']) {
                return Err(SimpleLockError::UserError(format!(
                    "lock {} '{}' must not contain tabs or newlines",
                    name,
                    value.escape_debug()
                )));
            }
        }

        let delimiter = FIELD_DELIMITER.to_string();
        let mut line = fields.join(delimiter.as_str());
        line.push('\n');
        Ok(line)
    }

    /// Decode one registry line; `None` when it does not have exactly five fields.
    pub fn decode(line: &str) -> Option<Self> {
        let mut fields = line
            .trim_end_matches(['\n', '\r'])
            .split(FIELD_DELIMITER);
        let record = Self {
            repo_id: fields.next()?.to_string(),
            branch: fields.next()?.to_string(),
            path: fields.next()?.to_string(),
            owner: fields.next()?.to_string(),
            purpose: fields.next()?.to_string(),
        };

        if fields.next().is_some() {
            return None;
        }
        Some(record)
    }

    /// Whether this record belongs to `scope`.
    pub fn in_scope(&self, scope: &LockScope) -> bool {
        self.repo_id == scope.repo_id && self.branch == scope.branch
    }

    fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            self.repo_id.as_str(),
            self.branch.as_str(),
            self.path.as_str(),
            self.owner.as_str(),
            self.purpose.as_str(),
        ]
    }
}

/// Result of tolerant registry parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRegistry {
    /// Well-formed records in file order.
    pub records: Vec<LockRecord>,

    /// Number of non-empty lines that were not well-formed.
    pub skipped: usize,
}

/// Parse a whole registry file, skipping (and counting) malformed lines.
///
/// Blank lines are ignored without being counted.
pub fn parse_registry(content: &str) -> ParsedRegistry {
    let mut parsed = ParsedRegistry::default();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match LockRecord::decode(line) {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO_A: &str = "1111111111111111111111111111111111111111";
    const REPO_B: &str = "2222222222222222222222222222222222222222";

    fn scope(repo_id: &str, branch: &str) -> LockScope {
        LockScope {
            repo_id: repo_id.to_string(),
            branch: branch.to_string(),
        }
    }

    #[test]
    fn test_encode_joins_fields_with_tabs() {
        let record = LockRecord::new(&scope(REPO_A, "main"), "art/hero.psd", "alice", "editing");
        assert_eq!(
            record.encode().unwrap(),
            format!("{}\tmain\tart/hero.psd\talice\tediting\n", REPO_A)
        );
    }

    #[test]
    fn test_decode_well_formed_line_round_trips() {
        let line = format!("{}\tmain\tfoo.psd\tAlice <a@example.com>\tediting asset\n", REPO_A);
        let record = LockRecord::decode(&line).unwrap();

        assert_eq!(record.repo_id, REPO_A);
        assert_eq!(record.path, "foo.psd");
        assert_eq!(record.owner, "Alice <a@example.com>");
        assert_eq!(record.purpose, "editing asset");
        assert_eq!(record.encode().unwrap(), line);
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert!(LockRecord::decode("garbage").is_none());
        assert!(LockRecord::decode(&format!("{}\tmain\tfoo.psd\talice", REPO_A)).is_none());
        assert!(
            LockRecord::decode(&format!("{}\tmain\tfoo.psd\talice\tediting\textra", REPO_A))
                .is_none()
        );
    }

    #[test]
    fn test_decode_allows_empty_purpose() {
        let record = LockRecord::decode(&format!("{}\tmain\tfoo.psd\talice\t", REPO_A)).unwrap();
        assert_eq!(record.purpose, "");
    }

    #[test]
    fn test_encode_rejects_delimiter_in_fields() {
        let record = LockRecord::new(&scope(REPO_A, "main"), "foo.psd", "alice", "tab\there");
        let err = record.encode().unwrap_err();
        assert!(err.to_string().contains("purpose"));

        let record = LockRecord::new(&scope(REPO_A, "main"), "foo\n.psd", "alice", "editing");
        assert!(record.encode().is_err());
    }

    #[test]
    fn test_parse_registry_counts_skipped_lines() {
        let content = format!(
            "{a}\tmain\tfoo.psd\talice\tediting\n\
             not a lock line\n\
             \n\
             {b}\tdev\tbar.psd\tbob\trigging\n\
             {a}\tmain\ttoo\tfew\n",
            a = REPO_A,
            b = REPO_B
        );

        let parsed = parse_registry(&content);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records[1].branch, "dev");
    }

    #[test]
    fn test_in_scope() {
        let record = LockRecord::new(&scope(REPO_A, "main"), "foo.psd", "alice", "editing");
        assert!(record.in_scope(&scope(REPO_A, "main")));
        assert!(!record.in_scope(&scope(REPO_A, "dev")));
        assert!(!record.in_scope(&scope(REPO_B, "main")));
    }
}
