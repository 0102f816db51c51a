//! Schema Registry
//!
//! The static table mapping each archive member name to its record schema,
//! plus the enumerated code domains those schemas reference. Built once,
//! never mutated; [`schema_for`] is a pure lookup.
//!
//! Revision notes: primary entities are permissive toward unknown fields
//! because the upstream snapshot grows fields over time (`meta_tags`
//! appeared mid-history); relationship members have small, stable shapes and
//! are strict.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::schema::{CodeRange, EnumDomain, FieldKind, FieldSpec, Schema, UnknownFieldPolicy};

// Member file names inside the snapshot container. Any of these may be
// absent from a given snapshot.
pub const SUBJECT_MEMBER: &str = "subject.jsonlines";
pub const PERSON_MEMBER: &str = "person.jsonlines";
pub const CHARACTER_MEMBER: &str = "character.jsonlines";
pub const EPISODE_MEMBER: &str = "episode.jsonlines";
pub const SUBJECT_RELATIONS_MEMBER: &str = "subject-relations.jsonlines";
pub const SUBJECT_PERSONS_MEMBER: &str = "subject-persons.jsonlines";
pub const SUBJECT_CHARACTERS_MEMBER: &str = "subject-characters.jsonlines";
pub const PERSON_CHARACTERS_MEMBER: &str = "person-characters.jsonlines";

// ---------------------------------------------------------------------------
// Enumerated domains
// ---------------------------------------------------------------------------

pub static SUBJECT_TYPE: EnumDomain = EnumDomain::Closed {
    name: "SubjectType",
    members: &[
        (1, "book"),
        (2, "anime"),
        (3, "music"),
        (4, "game"),
        (6, "real"),
    ],
};

pub static PERSON_TYPE: EnumDomain = EnumDomain::Closed {
    name: "PersonType",
    members: &[
        (0, "other"),
        (1, "individual"),
        (2, "company"),
        (3, "association"),
    ],
};

pub static CHARACTER_ROLE: EnumDomain = EnumDomain::Closed {
    name: "CharacterRole",
    members: &[(1, "main"), (2, "supporting"), (3, "guest"), (4, "other")],
};

pub static EPISODE_TYPE: EnumDomain = EnumDomain::Closed {
    name: "EpisodeType",
    members: &[
        (0, "main"),
        (1, "special"),
        (2, "opening"),
        (3, "ending"),
        (4, "trailer"),
        (5, "fan-work"),
        (6, "other"),
    ],
};

pub static CHARACTER_SUBJECT_TYPE: EnumDomain = EnumDomain::Closed {
    name: "CharacterSubjectType",
    members: &[(1, "main"), (2, "supporting"), (3, "guest")],
};

/// Relation codes, namespaced by subject type. 0-99 is the common range
/// shared by anime/book/game relations (0 = "other" in upstream data); the
/// 1000/3000/4000 bands redefine the numeric space for book, music and game
/// subjects. Membership is checked against the union only; consistency with
/// the sibling subject-type field is out of scope here.
pub static RELATION_TYPE: EnumDomain = EnumDomain::Ranged {
    name: "RelationType",
    ranges: &[
        CodeRange::new(0, 99, "common"),
        CodeRange::new(1000, 1099, "book"),
        CodeRange::new(3000, 3099, "music"),
        CodeRange::new(4000, 4099, "game"),
    ],
};

/// Staff position codes, one disjoint band per subject type.
pub static POSITION: EnumDomain = EnumDomain::Ranged {
    name: "Position",
    ranges: &[
        CodeRange::new(1, 99, "anime"),
        CodeRange::new(1001, 1099, "book"),
        CodeRange::new(3001, 3099, "music"),
        CodeRange::new(4001, 4099, "game"),
        CodeRange::new(6001, 6099, "real"),
    ],
};

// ---------------------------------------------------------------------------
// Entity schemas
// ---------------------------------------------------------------------------

pub static SUBJECT: Schema = Schema {
    member: SUBJECT_MEMBER,
    entity: "subject",
    revision: 2,
    unknown_fields: UnknownFieldPolicy::Permissive,
    fields: &[
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::required("type", FieldKind::Code(&SUBJECT_TYPE)),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("name_cn", FieldKind::Text),
        FieldSpec::required("infobox", FieldKind::Text),
        FieldSpec::required("platform", FieldKind::Int),
        FieldSpec::required("summary", FieldKind::Text),
        FieldSpec::required("nsfw", FieldKind::Bool),
        FieldSpec::optional("tags", FieldKind::TagList),
        FieldSpec::required("score", FieldKind::Float),
        FieldSpec::optional("score_details", FieldKind::ScoreBuckets),
        FieldSpec::required("rank", FieldKind::Int),
        FieldSpec::required("date", FieldKind::Text),
        FieldSpec::required("favorite", FieldKind::FavoriteCounts),
        FieldSpec::required("series", FieldKind::Bool),
        FieldSpec::optional("meta_tags", FieldKind::Text),
    ],
};

pub static PERSON: Schema = Schema {
    member: PERSON_MEMBER,
    entity: "person",
    revision: 2,
    unknown_fields: UnknownFieldPolicy::Permissive,
    fields: &[
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("type", FieldKind::Code(&PERSON_TYPE)),
        FieldSpec::optional("career", FieldKind::TextList),
        FieldSpec::required("infobox", FieldKind::Text),
        FieldSpec::required("summary", FieldKind::Text),
        FieldSpec::required("comments", FieldKind::Int),
        FieldSpec::required("collects", FieldKind::Int),
    ],
};

pub static CHARACTER: Schema = Schema {
    member: CHARACTER_MEMBER,
    entity: "character",
    revision: 1,
    unknown_fields: UnknownFieldPolicy::Permissive,
    fields: &[
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::required("role", FieldKind::Code(&CHARACTER_ROLE)),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("infobox", FieldKind::Text),
        FieldSpec::required("summary", FieldKind::Text),
        FieldSpec::required("comments", FieldKind::Int),
        FieldSpec::required("collects", FieldKind::Int),
    ],
};

pub static EPISODE: Schema = Schema {
    member: EPISODE_MEMBER,
    entity: "episode",
    revision: 1,
    unknown_fields: UnknownFieldPolicy::Permissive,
    fields: &[
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("name_cn", FieldKind::Text),
        FieldSpec::required("description", FieldKind::Text),
        FieldSpec::required("airdate", FieldKind::Text),
        FieldSpec::required("disc", FieldKind::Int),
        FieldSpec::required("duration", FieldKind::Text),
        FieldSpec::required("subject_id", FieldKind::Int),
        // upstream emits both integer and fractional sort keys
        FieldSpec::required("sort", FieldKind::Float),
        FieldSpec::required("type", FieldKind::Code(&EPISODE_TYPE)),
    ],
};

pub static SUBJECT_RELATIONS: Schema = Schema {
    member: SUBJECT_RELATIONS_MEMBER,
    entity: "subject_relation",
    revision: 1,
    unknown_fields: UnknownFieldPolicy::Strict,
    fields: &[
        FieldSpec::required("subject_id", FieldKind::Int),
        FieldSpec::required("relation_type", FieldKind::Code(&RELATION_TYPE)),
        FieldSpec::required("related_subject_id", FieldKind::Int),
        FieldSpec::required("order", FieldKind::Int),
    ],
};

pub static SUBJECT_PERSONS: Schema = Schema {
    member: SUBJECT_PERSONS_MEMBER,
    entity: "subject_person",
    revision: 2,
    unknown_fields: UnknownFieldPolicy::Strict,
    fields: &[
        FieldSpec::required("person_id", FieldKind::Int),
        FieldSpec::required("subject_id", FieldKind::Int),
        FieldSpec::required("position", FieldKind::Code(&POSITION)),
    ],
};

pub static SUBJECT_CHARACTERS: Schema = Schema {
    member: SUBJECT_CHARACTERS_MEMBER,
    entity: "subject_character",
    revision: 1,
    unknown_fields: UnknownFieldPolicy::Strict,
    fields: &[
        FieldSpec::required("character_id", FieldKind::Int),
        FieldSpec::required("subject_id", FieldKind::Int),
        FieldSpec::required("type", FieldKind::Code(&CHARACTER_SUBJECT_TYPE)),
        FieldSpec::required("order", FieldKind::Int),
    ],
};

pub static PERSON_CHARACTERS: Schema = Schema {
    member: PERSON_CHARACTERS_MEMBER,
    entity: "person_character",
    revision: 1,
    unknown_fields: UnknownFieldPolicy::Strict,
    fields: &[
        FieldSpec::required("person_id", FieldKind::Int),
        FieldSpec::required("subject_id", FieldKind::Int),
        FieldSpec::required("character_id", FieldKind::Int),
        FieldSpec::required("summary", FieldKind::Text),
    ],
};

/// All schemas, in the order member files are conventionally listed
pub static SCHEMAS: &[&Schema] = &[
    &SUBJECT,
    &PERSON,
    &CHARACTER,
    &EPISODE,
    &SUBJECT_RELATIONS,
    &SUBJECT_PERSONS,
    &SUBJECT_CHARACTERS,
    &PERSON_CHARACTERS,
];

static BY_MEMBER: Lazy<HashMap<&'static str, &'static Schema>> =
    Lazy::new(|| SCHEMAS.iter().map(|s| (s.member, *s)).collect());

/// Look up the active schema for a member file name
pub fn schema_for(member: &str) -> Option<&'static Schema> {
    BY_MEMBER.get(member).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_member_resolves_to_its_schema() {
        for schema in SCHEMAS {
            let found = schema_for(schema.member).expect("member registered");
            assert_eq!(found.entity, schema.entity);
        }
    }

    #[test]
    fn unknown_member_is_not_found() {
        assert!(schema_for("nope.jsonlines").is_none());
    }

    #[test]
    fn relation_codes_cover_the_namespaced_bands() {
        assert!(RELATION_TYPE.contains(0));
        assert!(RELATION_TYPE.contains(1));
        assert!(RELATION_TYPE.contains(1003));
        assert!(RELATION_TYPE.contains(3050));
        assert!(RELATION_TYPE.contains(4006));
        assert!(!RELATION_TYPE.contains(999));
        assert!(!RELATION_TYPE.contains(2000));
        assert_eq!(RELATION_TYPE.label(4006), Some("game"));
    }

    #[test]
    fn position_bands_are_disjoint_per_subject_type() {
        assert!(POSITION.contains(1));
        assert!(POSITION.contains(1001));
        assert!(POSITION.contains(6099));
        assert!(!POSITION.contains(0));
        assert!(!POSITION.contains(100));
        assert_eq!(POSITION.label(3001), Some("music"));
    }

    #[test]
    fn relationship_schemas_are_strict() {
        for schema in [
            &SUBJECT_RELATIONS,
            &SUBJECT_PERSONS,
            &SUBJECT_CHARACTERS,
            &PERSON_CHARACTERS,
        ] {
            assert_eq!(schema.unknown_fields, UnknownFieldPolicy::Strict);
        }
        assert_eq!(SUBJECT.unknown_fields, UnknownFieldPolicy::Permissive);
    }

    #[test]
    fn episode_type_domain_matches_declared_labels() {
        assert_eq!(EPISODE_TYPE.label(0), Some("main"));
        assert_eq!(EPISODE_TYPE.label(5), Some("fan-work"));
        assert!(!EPISODE_TYPE.contains(7));
    }
}
