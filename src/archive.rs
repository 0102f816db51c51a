//! Archive Facade
//!
//! [`ArchiveReader`] is the public surface: one accessor per entity type,
//! each returning a fresh lazy stream over the matching member file, plus an
//! aggregate accessor and the collect-policy failure report. The facade
//! holds only configuration (archive path, error policy, collect buffer);
//! all validation happens in the decoder, all I/O in the streams.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use zip::ZipArchive;

use crate::error::{ArchiveError, RecordedFailure, Result};
use crate::model::{
    Character, Episode, Person, PersonCharacter, Record, Subject, SubjectCharacter,
    SubjectPerson, SubjectRelation,
};
use crate::registry;
use crate::schema::Schema;
use crate::stream::{ErrorPolicy, FailureSink, RecordStream};

/// A type-erased record stream, for the aggregate accessor
pub type RecordIter = Box<dyn Iterator<Item = Result<Record>>>;

/// Read-only facade over one snapshot archive.
///
/// Every accessor opens an independent archive handle, so streams can be
/// driven separately and re-requested from the start at any time. The
/// facade is intentionally not `Send`: evaluation is single-threaded and
/// pull-based, and the collect buffer is plain shared state within one
/// thread.
#[derive(Debug)]
pub struct ArchiveReader {
    path: PathBuf,
    policy: ErrorPolicy,
    failures: FailureSink,
}

impl ArchiveReader {
    /// Open a facade over the archive at `path`.
    ///
    /// Container-level problems (missing file, not a zip) surface here,
    /// before any sequence exists. The probe handle is released immediately;
    /// accessors open their own.
    pub fn open(path: impl AsRef<Path>, policy: ErrorPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArchiveError::NotFound(path.clone()),
            _ => ArchiveError::Io(e),
        })?;
        ZipArchive::new(BufReader::new(file)).map_err(ArchiveError::Corrupt)?;

        Ok(Self {
            path,
            policy,
            failures: Rc::new(RefCell::new(BTreeMap::new())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    fn stream<T: DeserializeOwned>(&self, schema: &'static Schema) -> Result<RecordStream<T>> {
        let sink = matches!(self.policy, ErrorPolicy::Collect)
            .then(|| Rc::clone(&self.failures));
        RecordStream::open(&self.path, schema, self.policy, sink)
    }

    pub fn subjects(&self) -> Result<RecordStream<Subject>> {
        self.stream(&registry::SUBJECT)
    }

    pub fn persons(&self) -> Result<RecordStream<Person>> {
        self.stream(&registry::PERSON)
    }

    pub fn characters(&self) -> Result<RecordStream<Character>> {
        self.stream(&registry::CHARACTER)
    }

    pub fn episodes(&self) -> Result<RecordStream<Episode>> {
        self.stream(&registry::EPISODE)
    }

    pub fn subject_relations(&self) -> Result<RecordStream<SubjectRelation>> {
        self.stream(&registry::SUBJECT_RELATIONS)
    }

    pub fn subject_persons(&self) -> Result<RecordStream<SubjectPerson>> {
        self.stream(&registry::SUBJECT_PERSONS)
    }

    pub fn subject_characters(&self) -> Result<RecordStream<SubjectCharacter>> {
        self.stream(&registry::SUBJECT_CHARACTERS)
    }

    pub fn person_characters(&self) -> Result<RecordStream<PersonCharacter>> {
        self.stream(&registry::PERSON_CHARACTERS)
    }

    /// All member streams, keyed by member file name
    pub fn load_all(&self) -> Result<BTreeMap<&'static str, RecordIter>> {
        let mut all: BTreeMap<&'static str, RecordIter> = BTreeMap::new();
        all.insert(
            registry::SUBJECT_MEMBER,
            Box::new(self.subjects()?.map(|r| r.map(Record::Subject))),
        );
        all.insert(
            registry::PERSON_MEMBER,
            Box::new(self.persons()?.map(|r| r.map(Record::Person))),
        );
        all.insert(
            registry::CHARACTER_MEMBER,
            Box::new(self.characters()?.map(|r| r.map(Record::Character))),
        );
        all.insert(
            registry::EPISODE_MEMBER,
            Box::new(self.episodes()?.map(|r| r.map(Record::Episode))),
        );
        all.insert(
            registry::SUBJECT_RELATIONS_MEMBER,
            Box::new(self.subject_relations()?.map(|r| r.map(Record::SubjectRelation))),
        );
        all.insert(
            registry::SUBJECT_PERSONS_MEMBER,
            Box::new(self.subject_persons()?.map(|r| r.map(Record::SubjectPerson))),
        );
        all.insert(
            registry::SUBJECT_CHARACTERS_MEMBER,
            Box::new(
                self.subject_characters()?
                    .map(|r| r.map(Record::SubjectCharacter)),
            ),
        );
        all.insert(
            registry::PERSON_CHARACTERS_MEMBER,
            Box::new(
                self.person_characters()?
                    .map(|r| r.map(Record::PersonCharacter)),
            ),
        );
        Ok(all)
    }

    /// Snapshot of the failures accumulated so far under collect policy.
    ///
    /// Meaningful once the relevant streams have been exhausted; empty under
    /// the other policies.
    pub fn failure_report(&self) -> FailureReport {
        FailureReport {
            by_member: self.failures.borrow().clone(),
        }
    }
}

/// Accumulated decode failures, keyed by member file name
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    by_member: BTreeMap<&'static str, Vec<RecordedFailure>>,
}

impl FailureReport {
    pub fn is_empty(&self) -> bool {
        self.by_member.values().all(Vec::is_empty)
    }

    /// Total failure count across all members
    pub fn total(&self) -> usize {
        self.by_member.values().map(Vec::len).sum()
    }

    /// Failures for one member, in encounter order
    pub fn failures(&self, member: &str) -> &[RecordedFailure] {
        self.by_member.get(member).map_or(&[], Vec::as_slice)
    }

    /// Iterate members that recorded at least one failure
    pub fn members(&self) -> impl Iterator<Item = (&'static str, &[RecordedFailure])> {
        self.by_member
            .iter()
            .filter(|(_, failures)| !failures.is_empty())
            .map(|(member, failures)| (*member, failures.as_slice()))
    }

    /// Distinct offending raw values recorded for one member
    pub fn distinct_values(&self, member: &str) -> BTreeSet<&str> {
        self.failures(member)
            .iter()
            .filter_map(|f| f.failure.value.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeFailure, FailureKind};

    fn recorded(member: &'static str, line: usize, value: &str) -> RecordedFailure {
        RecordedFailure {
            member,
            line,
            failure: DecodeFailure::with_value(FailureKind::UnknownEnumValue, "type", value),
        }
    }

    #[test]
    fn report_totals_and_distinct_values() {
        let mut by_member = BTreeMap::new();
        by_member.insert(
            registry::EPISODE_MEMBER,
            vec![
                recorded(registry::EPISODE_MEMBER, 1, "999"),
                recorded(registry::EPISODE_MEMBER, 4, "999"),
                recorded(registry::EPISODE_MEMBER, 9, "-1"),
            ],
        );
        by_member.insert(registry::PERSON_MEMBER, Vec::new());
        let report = FailureReport { by_member };

        assert!(!report.is_empty());
        assert_eq!(report.total(), 3);
        assert_eq!(report.failures(registry::EPISODE_MEMBER).len(), 3);
        assert_eq!(report.failures("other.jsonlines").len(), 0);
        assert_eq!(report.members().count(), 1);

        let distinct = report.distinct_values(registry::EPISODE_MEMBER);
        assert_eq!(distinct, BTreeSet::from(["-1", "999"]));
    }

    #[test]
    fn empty_report_is_empty() {
        let report = FailureReport::default();
        assert!(report.is_empty());
        assert_eq!(report.total(), 0);
    }
}
