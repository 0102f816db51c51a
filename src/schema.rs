//! Schema description types
//!
//! Schemas are plain data: an ordered list of field specs plus an
//! unknown-field policy, consumed by one generic decode function. There is no
//! per-record-type validation code; adding or revising an entity schema means
//! editing the table in [`crate::registry`].

/// What the decoder does with fields the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Unknown fields are ignored (schema revisions may trail upstream)
    Permissive,
    /// Unknown fields reject the record outright
    Strict,
}

/// An inclusive code range belonging to one namespace of a namespaced domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRange {
    pub lo: i64,
    pub hi: i64,
    /// Which subject-type namespace this range belongs to
    pub namespace: &'static str,
}

impl CodeRange {
    pub const fn new(lo: i64, hi: i64, namespace: &'static str) -> Self {
        Self { lo, hi, namespace }
    }

    pub fn contains(&self, code: i64) -> bool {
        self.lo <= code && code <= self.hi
    }
}

/// An enumerated integer domain.
///
/// Closed domains enumerate every member with its label. Ranged domains are
/// the namespaced ones (relation types, staff positions) where the same
/// numeric field is reinterpreted per subject type; membership is checked
/// against the union of all declared ranges, never against the sibling
/// subject-type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDomain {
    Closed {
        name: &'static str,
        members: &'static [(i64, &'static str)],
    },
    Ranged {
        name: &'static str,
        ranges: &'static [CodeRange],
    },
}

impl EnumDomain {
    /// Domain name, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            EnumDomain::Closed { name, .. } => name,
            EnumDomain::Ranged { name, .. } => name,
        }
    }

    /// Whether `code` is a member of this domain
    pub fn contains(&self, code: i64) -> bool {
        match self {
            EnumDomain::Closed { members, .. } => members.iter().any(|(c, _)| *c == code),
            EnumDomain::Ranged { ranges, .. } => ranges.iter().any(|r| r.contains(code)),
        }
    }

    /// Textual label for a closed member, or the namespace a ranged code
    /// falls in
    pub fn label(&self, code: i64) -> Option<&'static str> {
        match self {
            EnumDomain::Closed { members, .. } => members
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, label)| *label),
            EnumDomain::Ranged { ranges, .. } => ranges
                .iter()
                .find(|r| r.contains(code))
                .map(|r| r.namespace),
        }
    }
}

/// Value kind a field must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON integer
    Int,
    /// JSON number (integer literals accepted)
    Float,
    /// JSON boolean
    Bool,
    /// JSON string
    Text,
    /// Integer code constrained to an enumerated domain
    Code(&'static EnumDomain),
    /// Array of strings
    TextList,
    /// Array of `{name: string, count: integer}` objects
    TagList,
    /// Object keyed by the digit strings "1".."10", integer values; absent
    /// buckets default to zero
    ScoreBuckets,
    /// Object with the five integer collection counters
    /// (wish/done/doing/on_hold/dropped), all required
    FavoriteCounts,
}

/// One field of a record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// The declared shape of one entity's records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Member file name inside the archive (e.g. `subject.jsonlines`)
    pub member: &'static str,
    /// Entity name, for reports and logs
    pub entity: &'static str,
    /// Active schema revision for this entity
    pub revision: u32,
    pub unknown_fields: UnknownFieldPolicy,
    /// Ordered field specs; validation reports the first violation in this
    /// order
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Look up a field spec by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}
