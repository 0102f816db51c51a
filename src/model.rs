//! Typed records decoded from the archive
//!
//! Field shapes mirror the upstream snapshot format one-to-one. Integer-coded
//! enums convert through `TryFrom<i64>` so an out-of-domain code can never
//! reach a constructed record; the namespaced code fields (relation type,
//! staff position) stay as validated newtypes because their meaning depends
//! on the parent subject's type, which this layer does not cross-check.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry;

/// An integer code outside its declared enum domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {domain} code: {code}")]
pub struct UnknownCode {
    pub domain: &'static str,
    pub code: i64,
}

macro_rules! coded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal => $label:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// The wire code for this member
            pub fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Human-readable label
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl TryFrom<i64> for $name {
            type Error = UnknownCode;

            fn try_from(code: i64) -> Result<Self, UnknownCode> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(UnknownCode {
                        domain: stringify!($name),
                        code,
                    }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.code()
            }
        }
    };
}

coded_enum! {
    /// Kind of a subject (the top-level work entity)
    SubjectType {
        Book = 1 => "book",
        Anime = 2 => "anime",
        Music = 3 => "music",
        Game = 4 => "game",
        Real = 6 => "real",
    }
}

coded_enum! {
    /// Kind of a person entry
    PersonType {
        Other = 0 => "other",
        Individual = 1 => "individual",
        Company = 2 => "company",
        Association = 3 => "association",
    }
}

coded_enum! {
    /// Role a character plays
    CharacterRole {
        Main = 1 => "main",
        Supporting = 2 => "supporting",
        Guest = 3 => "guest",
        Other = 4 => "other",
    }
}

coded_enum! {
    /// Kind of an episode
    EpisodeType {
        Main = 0 => "main",
        Special = 1 => "special",
        Opening = 2 => "opening",
        Ending = 3 => "ending",
        Trailer = 4 => "trailer",
        FanWork = 5 => "fan-work",
        Other = 6 => "other",
    }
}

coded_enum! {
    /// Billing of a character within one subject
    CharacterSubjectType {
        Main = 1 => "main",
        Supporting = 2 => "supporting",
        Guest = 3 => "guest",
    }
}

/// A subject-to-subject relation code.
///
/// The numeric space is namespaced by subject type (see
/// [`registry::RELATION_TYPE`]); the decoder guarantees membership in the
/// union of known bands, and [`RelationCode::namespace`] reports which band
/// a code falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationCode(pub i64);

impl RelationCode {
    pub fn code(self) -> i64 {
        self.0
    }

    /// The subject-type namespace this code belongs to, if known
    pub fn namespace(self) -> Option<&'static str> {
        registry::RELATION_TYPE.label(self.0)
    }
}

/// A staff position code, namespaced per subject type like [`RelationCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub i64);

impl Position {
    pub fn code(self) -> i64 {
        self.0
    }

    pub fn namespace(self) -> Option<&'static str> {
        registry::POSITION.label(self.0)
    }
}

/// A user tag on a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub count: i64,
}

/// Score distribution, one bucket per rating 1-10. Buckets absent from the
/// source default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetails {
    #[serde(rename = "1", default)]
    pub score_1: i64,
    #[serde(rename = "2", default)]
    pub score_2: i64,
    #[serde(rename = "3", default)]
    pub score_3: i64,
    #[serde(rename = "4", default)]
    pub score_4: i64,
    #[serde(rename = "5", default)]
    pub score_5: i64,
    #[serde(rename = "6", default)]
    pub score_6: i64,
    #[serde(rename = "7", default)]
    pub score_7: i64,
    #[serde(rename = "8", default)]
    pub score_8: i64,
    #[serde(rename = "9", default)]
    pub score_9: i64,
    #[serde(rename = "10", default)]
    pub score_10: i64,
}

/// Collection counters for a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub wish: i64,
    pub done: i64,
    pub doing: i64,
    pub on_hold: i64,
    pub dropped: i64,
}

/// A work: anime, book, music, game or real-world production
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub name: String,
    pub name_cn: String,
    pub infobox: String,
    pub platform: i64,
    pub summary: String,
    pub nsfw: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub score: f64,
    pub score_details: Option<ScoreDetails>,
    pub rank: i64,
    pub date: String,
    pub favorite: Favorite,
    pub series: bool,
    pub meta_tags: Option<String>,
}

/// An individual, company or association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub person_type: PersonType,
    #[serde(default)]
    pub career: Vec<String>,
    pub infobox: String,
    pub summary: String,
    pub comments: i64,
    pub collects: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub role: CharacterRole,
    pub name: String,
    pub infobox: String,
    pub summary: String,
    pub comments: i64,
    pub collects: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub name: String,
    pub name_cn: String,
    pub description: String,
    pub airdate: String,
    pub disc: i64,
    pub duration: String,
    pub subject_id: i64,
    /// Sort key; upstream emits both integer and fractional values
    pub sort: f64,
    #[serde(rename = "type")]
    pub episode_type: EpisodeType,
}

/// A relation between two subjects. `related_subject_id` carries no
/// existence guarantee; dangling references are structurally valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRelation {
    pub subject_id: i64,
    pub relation_type: RelationCode,
    pub related_subject_id: i64,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCharacter {
    pub character_id: i64,
    pub subject_id: i64,
    #[serde(rename = "type")]
    pub character_type: CharacterSubjectType,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectPerson {
    pub person_id: i64,
    pub subject_id: i64,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCharacter {
    pub person_id: i64,
    pub subject_id: i64,
    pub character_id: i64,
    pub summary: String,
}

/// Any decoded record, for the aggregate accessor
#[derive(Debug, Clone)]
pub enum Record {
    Subject(Subject),
    Person(Person),
    Character(Character),
    Episode(Episode),
    SubjectRelation(SubjectRelation),
    SubjectPerson(SubjectPerson),
    SubjectCharacter(SubjectCharacter),
    PersonCharacter(PersonCharacter),
}

impl Record {
    /// Entity name of the wrapped record
    pub fn entity(&self) -> &'static str {
        match self {
            Record::Subject(_) => "subject",
            Record::Person(_) => "person",
            Record::Character(_) => "character",
            Record::Episode(_) => "episode",
            Record::SubjectRelation(_) => "subject_relation",
            Record::SubjectPerson(_) => "subject_person",
            Record::SubjectCharacter(_) => "subject_character",
            Record::PersonCharacter(_) => "person_character",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coded_enum_round_trips_through_codes() {
        assert_eq!(SubjectType::try_from(2).unwrap(), SubjectType::Anime);
        assert_eq!(SubjectType::Anime.code(), 2);
        assert_eq!(SubjectType::Real.label(), "real");
        let err = SubjectType::try_from(5).unwrap_err();
        assert_eq!(err.domain, "SubjectType");
        assert_eq!(err.code, 5);
    }

    #[test]
    fn episode_deserializes_with_integer_code() {
        let episode: Episode = serde_json::from_str(
            r#"{"id":1,"name":"","name_cn":"","description":"","airdate":"2020-01-01",
                "disc":1,"duration":"24:00","subject_id":10,"sort":1,"type":0}"#,
        )
        .unwrap();
        assert_eq!(episode.episode_type, EpisodeType::Main);
        assert_eq!(episode.sort, 1.0);
    }

    #[test]
    fn episode_rejects_out_of_domain_code() {
        let result: Result<Episode, _> = serde_json::from_str(
            r#"{"id":1,"name":"","name_cn":"","description":"","airdate":"",
                "disc":1,"duration":"","subject_id":10,"sort":1,"type":999}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn score_details_buckets_are_digit_keyed_and_default_to_zero() {
        let details: ScoreDetails =
            serde_json::from_str(r#"{"1":5,"10":120}"#).unwrap();
        assert_eq!(details.score_1, 5);
        assert_eq!(details.score_10, 120);
        assert_eq!(details.score_5, 0);
    }

    #[test]
    fn relation_code_reports_its_namespace() {
        assert_eq!(RelationCode(2).namespace(), Some("common"));
        assert_eq!(RelationCode(1003).namespace(), Some("book"));
        assert_eq!(RelationCode(2000).namespace(), None);
        assert_eq!(Position(4001).namespace(), Some("game"));
    }

    #[test]
    fn subject_defaults_apply_to_absent_optional_fields() {
        let subject: Subject = serde_json::from_str(
            r#"{"id":1,"type":2,"name":"n","name_cn":"","infobox":"","platform":0,
                "summary":"","nsfw":false,"score":7.2,"rank":100,"date":"2020-01-01",
                "favorite":{"wish":1,"done":2,"doing":3,"on_hold":4,"dropped":5},
                "series":false}"#,
        )
        .unwrap();
        assert!(subject.tags.is_empty());
        assert!(subject.score_details.is_none());
        assert!(subject.meta_tags.is_none());
        assert_eq!(subject.favorite.on_hold, 4);
    }
}
