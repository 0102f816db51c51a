//! Record Decoder
//!
//! One generic, policy-free decode function: raw line bytes in, a fully
//! typed record or a categorized [`DecodeFailure`] out. Steps, in order:
//! UTF-8 decode, JSON parse, required/kind validation against the schema,
//! enum-domain membership, unknown-field rejection under the strict policy,
//! then the typed conversion. No I/O, deterministic.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeFailure, FailureKind};
use crate::schema::{FieldKind, Schema, UnknownFieldPolicy};

/// Longest offending-value excerpt carried in a failure
const VALUE_PREVIEW_LEN: usize = 80;

/// Decode one raw line against a schema into a typed record
pub fn decode_line<T: DeserializeOwned>(raw: &[u8], schema: &Schema) -> Result<T, DecodeFailure> {
    let text = std::str::from_utf8(raw).map_err(|_| {
        DecodeFailure::value_only(FailureKind::Encoding, preview(&String::from_utf8_lossy(raw)))
    })?;

    let value: Value = serde_json::from_str(text)
        .map_err(|_| DecodeFailure::value_only(FailureKind::Syntax, preview(text.trim())))?;

    validate(&value, schema)?;

    // The schema table and the typed models describe the same shapes, so
    // this conversion cannot fail for a validated value; if they ever drift
    // the mismatch is still reported as a schema violation, not a panic.
    serde_json::from_value(value)
        .map_err(|e| DecodeFailure::value_only(FailureKind::SchemaViolation, e.to_string()))
}

/// Validate a parsed JSON value against a schema without building a record
pub fn validate(value: &Value, schema: &Schema) -> Result<(), DecodeFailure> {
    let map = value.as_object().ok_or_else(|| {
        DecodeFailure::value_only(FailureKind::SchemaViolation, json_kind(value).to_string())
    })?;

    for spec in schema.fields {
        match map.get(spec.name) {
            None => {
                if spec.required {
                    return Err(DecodeFailure::with_field(
                        FailureKind::SchemaViolation,
                        spec.name,
                    ));
                }
            }
            Some(Value::Null) => {
                if spec.required {
                    return Err(DecodeFailure::with_value(
                        FailureKind::SchemaViolation,
                        spec.name,
                        "null",
                    ));
                }
            }
            Some(v) => check_kind(spec.name, v, spec.kind)?,
        }
    }

    if schema.unknown_fields == UnknownFieldPolicy::Strict {
        if let Some(name) = map.keys().find(|k| !schema.has_field(k)) {
            return Err(DecodeFailure::with_value(
                FailureKind::UnexpectedField,
                name.clone(),
                preview(&map[name].to_string()),
            ));
        }
    }

    Ok(())
}

fn check_kind(path: &str, value: &Value, kind: FieldKind) -> Result<(), DecodeFailure> {
    match kind {
        FieldKind::Int => expect(path, value, is_int(value)),
        FieldKind::Float => expect(path, value, value.is_number()),
        FieldKind::Bool => expect(path, value, value.is_boolean()),
        FieldKind::Text => expect(path, value, value.is_string()),
        FieldKind::Code(domain) => {
            let code = value.as_i64().ok_or_else(|| mismatch(path, value))?;
            if domain.contains(code) {
                Ok(())
            } else {
                Err(DecodeFailure::with_value(
                    FailureKind::UnknownEnumValue,
                    path,
                    code.to_string(),
                ))
            }
        }
        FieldKind::TextList => {
            let items = value.as_array().ok_or_else(|| mismatch(path, value))?;
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(mismatch(&format!("{path}[{i}]"), item));
                }
            }
            Ok(())
        }
        FieldKind::TagList => {
            let items = value.as_array().ok_or_else(|| mismatch(path, value))?;
            for (i, item) in items.iter().enumerate() {
                let tag = item
                    .as_object()
                    .ok_or_else(|| mismatch(&format!("{path}[{i}]"), item))?;
                check_member(&format!("{path}[{i}]"), tag, "name", Value::is_string)?;
                check_member(&format!("{path}[{i}]"), tag, "count", is_int)?;
            }
            Ok(())
        }
        FieldKind::ScoreBuckets => {
            let buckets = value.as_object().ok_or_else(|| mismatch(path, value))?;
            for (key, bucket) in buckets {
                let digit_keyed = key.parse::<u8>().ok().is_some_and(|n| (1..=10).contains(&n));
                if !digit_keyed {
                    return Err(DecodeFailure::with_value(
                        FailureKind::SchemaViolation,
                        format!("{path}.{key}"),
                        key.clone(),
                    ));
                }
                if !is_int(bucket) {
                    return Err(mismatch(&format!("{path}.{key}"), bucket));
                }
            }
            Ok(())
        }
        FieldKind::FavoriteCounts => {
            let counts = value.as_object().ok_or_else(|| mismatch(path, value))?;
            for key in ["wish", "done", "doing", "on_hold", "dropped"] {
                check_member(path, counts, key, is_int)?;
            }
            Ok(())
        }
    }
}

fn check_member(
    path: &str,
    object: &serde_json::Map<String, Value>,
    key: &str,
    ok: impl Fn(&Value) -> bool,
) -> Result<(), DecodeFailure> {
    match object.get(key) {
        Some(v) if ok(v) => Ok(()),
        Some(v) => Err(mismatch(&format!("{path}.{key}"), v)),
        None => Err(DecodeFailure::with_field(
            FailureKind::SchemaViolation,
            format!("{path}.{key}"),
        )),
    }
}

fn expect(path: &str, value: &Value, ok: bool) -> Result<(), DecodeFailure> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(path, value))
    }
}

fn mismatch(path: &str, value: &Value) -> DecodeFailure {
    DecodeFailure::with_value(FailureKind::SchemaViolation, path, preview(&value.to_string()))
}

fn is_int(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= VALUE_PREVIEW_LEN {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(VALUE_PREVIEW_LEN).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Episode, EpisodeType, Subject, SubjectPerson, SubjectRelation};
    use crate::registry;

    const EPISODE_LINE: &str = r#"{"id":1,"name":"","name_cn":"","description":"","airdate":"2020-01-01","disc":1,"duration":"24:00","subject_id":10,"sort":1,"type":0}"#;

    fn subject_line(extra: &str) -> String {
        format!(
            r#"{{"id":8,"type":2,"name":"n","name_cn":"","infobox":"","platform":0,
                "summary":"","nsfw":false,"tags":[{{"name":"tv","count":3}}],"score":7.2,
                "score_details":{{"9":10,"10":20}},"rank":42,"date":"2020-01-01",
                "favorite":{{"wish":1,"done":2,"doing":3,"on_hold":4,"dropped":5}},
                "series":false{extra}}}"#
        )
    }

    #[test]
    fn well_formed_episode_decodes() {
        let episode: Episode = decode_line(EPISODE_LINE.as_bytes(), &registry::EPISODE).unwrap();
        assert_eq!(episode.episode_type, EpisodeType::Main);
        assert_eq!(episode.subject_id, 10);
    }

    #[test]
    fn well_formed_subject_decodes() {
        let subject: Subject =
            decode_line(subject_line("").as_bytes(), &registry::SUBJECT).unwrap();
        assert_eq!(subject.tags[0].name, "tv");
        assert_eq!(subject.score_details.unwrap().score_10, 20);
    }

    #[test]
    fn malformed_utf8_is_an_encoding_failure() {
        let failure =
            decode_line::<Episode>(&[0xff, 0xfe, b'{'], &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Encoding);
    }

    #[test]
    fn broken_json_is_a_syntax_failure() {
        let failure =
            decode_line::<Episode>(b"{\"id\": 1,", &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Syntax);
        assert!(failure.value.is_some());
    }

    #[test]
    fn non_object_line_is_a_schema_violation() {
        let failure = decode_line::<Episode>(b"[1,2,3]", &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.value.as_deref(), Some("array"));
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let line = r#"{"name":"","name_cn":"","description":"","airdate":"","disc":1,"duration":"","subject_id":10,"sort":1,"type":0}"#;
        let failure = decode_line::<Episode>(line.as_bytes(), &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("id"));
    }

    #[test]
    fn null_required_field_is_a_schema_violation() {
        let line = EPISODE_LINE.replace("\"id\":1", "\"id\":null");
        let failure = decode_line::<Episode>(line.as_bytes(), &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("id"));
        assert_eq!(failure.value.as_deref(), Some("null"));
    }

    #[test]
    fn wrong_kind_carries_the_offending_value() {
        let line = EPISODE_LINE.replace("\"disc\":1", "\"disc\":\"one\"");
        let failure = decode_line::<Episode>(line.as_bytes(), &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("disc"));
        assert_eq!(failure.value.as_deref(), Some("\"one\""));
    }

    #[test]
    fn out_of_domain_code_is_an_unknown_enum_value() {
        let line = EPISODE_LINE.replace("\"type\":0", "\"type\":999");
        let failure = decode_line::<Episode>(line.as_bytes(), &registry::EPISODE).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnknownEnumValue);
        assert_eq!(failure.field.as_deref(), Some("type"));
        assert_eq!(failure.value.as_deref(), Some("999"));
    }

    #[test]
    fn position_outside_every_band_is_rejected() {
        let line = r#"{"person_id":1,"subject_id":2,"position":2500}"#;
        let failure =
            decode_line::<SubjectPerson>(line.as_bytes(), &registry::SUBJECT_PERSONS).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnknownEnumValue);
        assert_eq!(failure.field.as_deref(), Some("position"));
    }

    #[test]
    fn namespaced_relation_codes_pass_global_membership() {
        for code in [1, 1003, 3001, 4006] {
            let line = format!(
                r#"{{"subject_id":1,"relation_type":{code},"related_subject_id":2,"order":0}}"#
            );
            let relation: SubjectRelation =
                decode_line(line.as_bytes(), &registry::SUBJECT_RELATIONS).unwrap();
            assert_eq!(relation.relation_type.code(), code);
        }
    }

    #[test]
    fn strict_schema_rejects_unexpected_fields() {
        let line = r#"{"subject_id":1,"relation_type":1,"related_subject_id":2,"order":0,"vice":true}"#;
        let failure =
            decode_line::<SubjectRelation>(line.as_bytes(), &registry::SUBJECT_RELATIONS)
                .unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedField);
        assert_eq!(failure.field.as_deref(), Some("vice"));
    }

    #[test]
    fn permissive_schema_ignores_unexpected_fields() {
        let subject: Subject = decode_line(
            subject_line(r#","brand_new_field":"ignored""#).as_bytes(),
            &registry::SUBJECT,
        )
        .unwrap();
        assert_eq!(subject.id, 8);
    }

    #[test]
    fn score_bucket_keys_outside_one_to_ten_are_rejected() {
        let line = subject_line("").replace(r#""9":10"#, r#""11":10"#);
        let failure = decode_line::<Subject>(line.as_bytes(), &registry::SUBJECT).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("score_details.11"));
    }

    #[test]
    fn tag_entries_are_validated_individually() {
        let line = subject_line("").replace(r#""count":3"#, r#""count":"three""#);
        let failure = decode_line::<Subject>(line.as_bytes(), &registry::SUBJECT).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("tags[0].count"));
    }

    #[test]
    fn favorite_requires_all_five_counters() {
        let line = subject_line("").replace(r#""dropped":5"#, r#""ignored":5"#);
        let failure = decode_line::<Subject>(line.as_bytes(), &registry::SUBJECT).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert_eq!(failure.field.as_deref(), Some("favorite.dropped"));
    }

    #[test]
    fn optional_null_fields_are_accepted() {
        let line = subject_line("").replace(
            r#""score_details":{"9":10,"10":20}"#,
            r#""score_details":null"#,
        );
        let subject: Subject = decode_line(line.as_bytes(), &registry::SUBJECT).unwrap();
        assert!(subject.score_details.is_none());
    }
}
