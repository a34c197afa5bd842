//! Request filter criteria and their translation into predicates

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

use super::predicate::{Field, FieldValue, Operator, Predicate};

/// Keys that carry paging or ordering instead of a field filter
pub const RESERVED_KEYS: &[&str] = &["sort", "direction", "page", "size"];

/// Field name to raw filter expression, as supplied by a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria(BTreeMap<String, String>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for FilterCriteria {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Accepts a map whose values are scalars. Numbers and booleans are
/// stringified; null, sequences and nested maps are dropped.
impl<'de> Deserialize<'de> for FilterCriteria {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CriteriaVisitor;

        impl<'de> Visitor<'de> for CriteriaVisitor {
            type Value = FilterCriteria;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to filter values")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FilterCriteria::new())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut criteria = FilterCriteria::new();
                while let Some((key, value)) = access.next_entry::<String, Scalar>()? {
                    if let Some(text) = value.0 {
                        criteria.insert(key, text);
                    }
                }
                Ok(criteria)
            }
        }

        deserializer.deserialize_map(CriteriaVisitor)
    }
}

/// A scalar filter value in string form; `None` for values that are dropped
struct Scalar(Option<String>);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a scalar filter value")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar(Some(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar(Some(v)))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar(Some(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(Some(v.to_string())))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(Some(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar(Some(v.to_string())))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(None))
            }

            fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(None))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Scalar, D::Error>
            where
                D: Deserializer<'de>,
            {
                Scalar::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Scalar, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}
                Ok(Scalar(None))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Scalar, A::Error>
            where
                A: MapAccess<'de>,
            {
                // XML elements arrive as maps with their text under `$text`
                let mut text = None;
                let mut nested = false;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "$text" || key == "$value" {
                        text = map.next_value::<Scalar>()?.0;
                    } else {
                        nested = true;
                        map.next_value::<de::IgnoredAny>()?;
                    }
                }
                Ok(Scalar(if nested { None } else { text }))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Parse one `field -> expression` entry.
///
/// Accepted forms are `value`, `op:value` and `field:op:value`. Returns `None`
/// when the key names no field or the expression is malformed; the caller
/// treats that field as unfiltered.
pub fn parse_filter<F: Field>(key: &str, raw: &str) -> Option<Predicate<F>> {
    let field = F::parse(key)?;

    let mut segments = raw.splitn(3, ':');
    let first = segments.next().unwrap_or_default();
    let (op, value) = match Operator::parse(first) {
        Some(op) => match raw[first.len()..].strip_prefix(':') {
            Some(value) => (op, value),
            // a bare operator word is an ordinary value
            None => (Operator::default_for(field.kind()), raw),
        },
        None => match (segments.next().and_then(Operator::parse), segments.next()) {
            (Some(op), Some(value)) => {
                if F::parse(first) != Some(field) {
                    debug!(key, raw, "filter names a different field, ignoring");
                    return None;
                }
                (op, value)
            }
            _ => (Operator::default_for(field.kind()), raw),
        },
    };

    if value.is_empty() {
        return None;
    }

    let Some(value) = FieldValue::parse(field.kind(), value) else {
        debug!(key, raw, "filter value does not match field type, ignoring");
        return None;
    };

    let predicate = Predicate::compare(field, op, value);
    if predicate.is_none() {
        debug!(key, raw, "operator not applicable to field, ignoring");
    }
    predicate
}

/// AND together one predicate per recognised entry of `criteria`
pub fn build_predicate<F: Field>(criteria: &FilterCriteria) -> Predicate<F> {
    criteria
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(key))
        .filter_map(|(key, raw)| parse_filter::<F>(key, raw))
        .fold(Predicate::all(), Predicate::and)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::account::AccountField;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn plain_text_defaults_to_contains() {
        let p = parse_filter::<AccountField>("name", "Savings");
        assert_eq!(p, Some(Predicate::Contains(AccountField::Name, "Savings".into())));
    }

    #[test]
    fn operator_prefix() {
        let p = parse_filter::<AccountField>("name", "eq:Savings");
        assert_eq!(p, Some(Predicate::Equals(AccountField::Name, text("Savings"))));
    }

    #[test]
    fn field_operator_value() {
        let p = parse_filter::<AccountField>("name", "name:eq:Savings");
        assert_eq!(p, Some(Predicate::Equals(AccountField::Name, text("Savings"))));
    }

    #[test]
    fn mismatched_field_segment_is_ignored() {
        assert_eq!(parse_filter::<AccountField>("name", "type:eq:Savings"), None);
    }

    #[test]
    fn text_may_contain_colons() {
        let p = parse_filter::<AccountField>("name", "Gold: Premium");
        assert_eq!(p, Some(Predicate::Contains(AccountField::Name, "Gold: Premium".into())));
    }

    #[test]
    fn operator_word_alone_is_a_value() {
        assert_eq!(
            parse_filter::<AccountField>("name", "ne"),
            Some(Predicate::Contains(AccountField::Name, "ne".into()))
        );
        assert_eq!(
            parse_filter::<AccountField>("type", "LIKE"),
            Some(Predicate::Contains(AccountField::Type, "LIKE".into()))
        );
    }

    #[test]
    fn operator_value_may_contain_colons() {
        let p = parse_filter::<AccountField>("type", "eq:a:b");
        assert_eq!(p, Some(Predicate::Equals(AccountField::Type, text("a:b"))));
    }

    #[test]
    fn integer_and_date_coercion() {
        assert_eq!(
            parse_filter::<AccountField>("id", "gt:3"),
            Some(Predicate::GreaterThan(AccountField::Id, FieldValue::Integer(3)))
        );
        assert_eq!(
            parse_filter::<AccountField>("id", "7"),
            Some(Predicate::Equals(AccountField::Id, FieldValue::Integer(7)))
        );
        let date = chrono::NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(
            parse_filter::<AccountField>("openDate", "lte:2023-06-01"),
            Some(Predicate::LessOrEqual(AccountField::OpenDate, FieldValue::Date(date)))
        );
    }

    #[test]
    fn malformed_entries_are_unfiltered() {
        assert_eq!(parse_filter::<AccountField>("id", "gt:abc"), None);
        assert_eq!(parse_filter::<AccountField>("openDate", "contains:2023"), None);
        assert_eq!(parse_filter::<AccountField>("openDate", "yesterday"), None);
        assert_eq!(parse_filter::<AccountField>("name", "eq:"), None);
        assert_eq!(parse_filter::<AccountField>("balance", "gt:10"), None);
    }

    #[test]
    fn empty_criteria_matches_everything() {
        assert!(build_predicate::<AccountField>(&FilterCriteria::new()).is_all());
    }

    #[test]
    fn reserved_and_unknown_keys_are_skipped() {
        let criteria: FilterCriteria = [
            ("name", "Sav"),
            ("sort", "name"),
            ("direction", "desc"),
            ("nickname", "x"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            build_predicate::<AccountField>(&criteria),
            Predicate::Contains(AccountField::Name, "Sav".into())
        );
    }

    #[test]
    fn entries_are_anded() {
        let criteria: FilterCriteria = [("name", "Sav"), ("type", "eq:SAVINGS")].into_iter().collect();
        assert_eq!(
            build_predicate::<AccountField>(&criteria),
            Predicate::And(vec![
                Predicate::Contains(AccountField::Name, "Sav".into()),
                Predicate::Equals(AccountField::Type, text("SAVINGS")),
            ])
        );
    }

    #[test]
    fn deserializes_scalar_json_values() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"id": 5, "name": "Sav", "type": null, "tags": ["a"]}"#).unwrap();
        assert_eq!(criteria.get("id"), Some("5"));
        assert_eq!(criteria.get("name"), Some("Sav"));
        assert_eq!(criteria.get("type"), None);
        assert_eq!(criteria.get("tags"), None);
    }
}
