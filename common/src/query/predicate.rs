//! Composable record predicates
//!
//! A [`Predicate`] describes which records match a query. It is plain data:
//! the in-memory store evaluates it with [`Predicate::matches`], the SQL store
//! renders it into a parameterised `WHERE` clause.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

/// Storage type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Date,
}

/// A typed field value, used both as a predicate operand and as a record cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i32),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Coerce a raw request string into a value of the given kind
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        match kind {
            FieldKind::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .map(FieldValue::Date),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }
}

impl PartialOrd for FieldValue {
    /// Values of different kinds are incomparable
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.partial_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.partial_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A queryable field of some record type
pub trait Field: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Resolve a request-supplied field name
    fn parse(name: &str) -> Option<Self>;

    /// Field kind, drives value coercion and the default operator
    fn kind(self) -> FieldKind;

    /// Backing column name in the relational store
    fn column(self) -> &'static str;

    /// Field used to order results when no sort is requested
    fn primary_key() -> Self;
}

/// A record whose fields can be read by a [`Predicate`]
pub trait Filterable {
    type Field: Field;

    fn field_value(&self, field: Self::Field) -> FieldValue;
}

/// Comparison operator of a single-field predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Operator {
    /// Parse an operator token (`eq`, `ne`, `contains`/`like`, `gt`, `gte`, `lt`, `lte`)
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(Operator::Equals),
            "ne" => Some(Operator::NotEquals),
            "contains" | "like" => Some(Operator::Contains),
            "gt" => Some(Operator::GreaterThan),
            "gte" => Some(Operator::GreaterOrEqual),
            "lt" => Some(Operator::LessThan),
            "lte" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }

    /// Operator applied when a filter value names none
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Operator::Contains,
            FieldKind::Integer | FieldKind::Date => Operator::Equals,
        }
    }
}

/// Predicate tree over the fields `F` of a record type
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<F: Field> {
    Equals(F, FieldValue),
    NotEquals(F, FieldValue),
    /// Case-sensitive substring match, text fields only
    Contains(F, String),
    GreaterThan(F, FieldValue),
    GreaterOrEqual(F, FieldValue),
    LessThan(F, FieldValue),
    LessOrEqual(F, FieldValue),
    /// Conjunction; empty matches everything
    And(Vec<Predicate<F>>),
    /// Disjunction; empty matches nothing
    Or(Vec<Predicate<F>>),
}

impl<F: Field> Predicate<F> {
    /// Identity filter: matches every record
    pub fn all() -> Self {
        Predicate::And(Vec::new())
    }

    /// Build a single-field comparison. Returns `None` when the operator does
    /// not apply to the value (e.g. `contains` on a date).
    pub fn compare(field: F, op: Operator, value: FieldValue) -> Option<Self> {
        if value.kind() != field.kind() {
            return None;
        }
        Some(match op {
            Operator::Equals => Predicate::Equals(field, value),
            Operator::NotEquals => Predicate::NotEquals(field, value),
            Operator::Contains => match value {
                FieldValue::Text(s) => Predicate::Contains(field, s),
                _ => return None,
            },
            Operator::GreaterThan => Predicate::GreaterThan(field, value),
            Operator::GreaterOrEqual => Predicate::GreaterOrEqual(field, value),
            Operator::LessThan => Predicate::LessThan(field, value),
            Operator::LessOrEqual => Predicate::LessOrEqual(field, value),
        })
    }

    /// `field contains needle`; an absent or empty needle leaves the field unfiltered
    pub fn contains(field: F, needle: Option<&str>) -> Self {
        match needle {
            Some(s) if !s.is_empty() && field.kind() == FieldKind::Text => {
                Predicate::Contains(field, s.to_string())
            }
            _ => Predicate::all(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::And(v) if v.is_empty())
    }

    /// Logical AND, flattening nested conjunctions
    pub fn and(self, other: Predicate<F>) -> Self {
        let mut parts = match self {
            Predicate::And(v) => v,
            p => vec![p],
        };
        match other {
            Predicate::And(v) => parts.extend(v),
            p => parts.push(p),
        }
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Predicate::And(parts)
    }

    /// Logical OR, flattening nested disjunctions
    pub fn or(self, other: Predicate<F>) -> Self {
        if self.is_all() || other.is_all() {
            return Predicate::all();
        }
        let mut parts = match self {
            Predicate::Or(v) => v,
            p => vec![p],
        };
        match other {
            Predicate::Or(v) => parts.extend(v),
            p => parts.push(p),
        }
        Predicate::Or(parts)
    }

    /// Evaluate against a record
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Filterable<Field = F>,
    {
        match self {
            Predicate::Equals(f, v) => record.field_value(*f) == *v,
            Predicate::NotEquals(f, v) => record.field_value(*f) != *v,
            Predicate::Contains(f, needle) => match record.field_value(*f) {
                FieldValue::Text(s) => s.contains(needle.as_str()),
                _ => false,
            },
            Predicate::GreaterThan(f, v) => record.field_value(*f) > *v,
            Predicate::GreaterOrEqual(f, v) => record.field_value(*f) >= *v,
            Predicate::LessThan(f, v) => record.field_value(*f) < *v,
            Predicate::LessOrEqual(f, v) => record.field_value(*f) <= *v,
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(record)),
        }
    }
}

impl<F: Field> Default for Predicate<F> {
    fn default() -> Self {
        Predicate::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::account::{Account, AccountField};

    fn account(id: i32, name: &str, account_type: &str) -> Account {
        Account {
            id,
            name: name.to_string(),
            account_type: account_type.to_string(),
            open_date: NaiveDate::from_ymd_opt(2024, 1, id as u32).unwrap(),
        }
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn all_is_identity_for_and() {
        let p = Predicate::Equals(AccountField::Name, text("Savings"));
        assert_eq!(p.clone().and(Predicate::all()), p);
        assert_eq!(Predicate::all().and(p.clone()), p);
    }

    #[test]
    fn and_is_associative() {
        let a = Predicate::Contains(AccountField::Name, "Sav".to_string());
        let b = Predicate::Equals(AccountField::Type, text("SAVINGS"));
        let c = Predicate::GreaterThan(AccountField::Id, FieldValue::Integer(1));

        let left = a.clone().and(b.clone()).and(c.clone());
        let right = a.and(b.and(c));
        assert_eq!(left, right);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let p = Predicate::Contains(AccountField::Name, "Sav".to_string());
        assert!(p.matches(&account(1, "Savings", "SAVINGS")));
        assert!(!p.matches(&account(2, "savings", "SAVINGS")));
    }

    #[test]
    fn range_comparisons() {
        let p = Predicate::GreaterOrEqual(AccountField::Id, FieldValue::Integer(2))
            .and(Predicate::LessThan(AccountField::Id, FieldValue::Integer(4)));
        let ids: Vec<i32> = (1..=5)
            .map(|i| account(i, "A", "B"))
            .filter(|a| p.matches(a))
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn or_matches_either_side() {
        let p = Predicate::Equals(AccountField::Id, FieldValue::Integer(1))
            .or(Predicate::Equals(AccountField::Id, FieldValue::Integer(3)));
        assert!(p.matches(&account(1, "A", "B")));
        assert!(!p.matches(&account(2, "A", "B")));
        assert!(p.matches(&account(3, "A", "B")));
    }

    #[test]
    fn compare_rejects_contains_on_date() {
        let date = FieldValue::parse(FieldKind::Date, "2024-01-01").unwrap();
        assert!(Predicate::compare(AccountField::OpenDate, Operator::Contains, date).is_none());
    }

    #[test]
    fn empty_needle_is_unfiltered() {
        assert!(Predicate::contains(AccountField::Name, Some("")).is_all());
        assert!(Predicate::contains(AccountField::Name, None).is_all());
    }
}
