//! Request-driven ordering

use std::cmp::Ordering;

use super::criteria::FilterCriteria;
use super::page::PageRequest;
use super::predicate::{Field, Filterable};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(Error::ValidationError(format!(
                "sort direction must be asc or desc, got '{}'",
                other
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// Ordering on a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F: Field> {
    pub field: F,
    pub direction: Direction,
}

impl<F: Field> Sort<F> {
    pub fn new(field: F, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// Compare two records by this sort, breaking ties on the primary key
    pub fn compare<R>(&self, a: &R, b: &R) -> Ordering
    where
        R: Filterable<Field = F>,
    {
        let primary = a
            .field_value(self.field)
            .partial_cmp(&b.field_value(self.field))
            .unwrap_or(Ordering::Equal);
        let primary = match self.direction {
            Direction::Ascending => primary,
            Direction::Descending => primary.reverse(),
        };
        primary.then_with(|| {
            let pk = F::primary_key();
            a.field_value(pk).partial_cmp(&b.field_value(pk)).unwrap_or(Ordering::Equal)
        })
    }
}

/// Applies `sort` / `direction` request parameters to a page request
pub struct Sorter;

impl Sorter {
    /// `sort` is `field` or `field,direction`; `direction` is consulted when
    /// the sort value carries none. Without `sort` the page is unchanged.
    pub fn sort<F: Field>(params: &FilterCriteria, page: PageRequest<F>) -> Result<PageRequest<F>> {
        let Some(raw) = params.get("sort").map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(page);
        };

        let (name, inline_direction) = match raw.split_once(',') {
            Some((name, direction)) => (name.trim(), Some(direction)),
            None => (raw, None),
        };

        let field = F::parse(name)
            .ok_or_else(|| Error::ValidationError(format!("unknown sort field '{}'", name)))?;

        let direction = match inline_direction.or_else(|| params.get("direction")) {
            Some(d) => Direction::parse(d)?,
            None => Direction::default(),
        };

        Ok(page.with_sort(Sort::new(field, direction)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::account::AccountField;

    fn params(pairs: &[(&str, &str)]) -> FilterCriteria {
        pairs.iter().copied().collect()
    }

    #[test]
    fn absent_sort_leaves_page_unchanged() {
        let page = PageRequest::<AccountField>::default();
        let sorted = Sorter::sort(&params(&[("direction", "desc")]), page.clone()).unwrap();
        assert_eq!(sorted, page);
    }

    #[test]
    fn field_and_direction() {
        let sorted = Sorter::sort(
            &params(&[("sort", "openDate"), ("direction", "DESC")]),
            PageRequest::<AccountField>::default(),
        )
        .unwrap();
        assert_eq!(sorted.sort, Some(Sort::new(AccountField::OpenDate, Direction::Descending)));
    }

    #[test]
    fn inline_direction_wins() {
        let sorted = Sorter::sort(
            &params(&[("sort", "name,desc"), ("direction", "asc")]),
            PageRequest::<AccountField>::default(),
        )
        .unwrap();
        assert_eq!(sorted.sort, Some(Sort::new(AccountField::Name, Direction::Descending)));
    }

    #[test]
    fn direction_defaults_to_ascending() {
        let sorted = Sorter::sort(&params(&[("sort", "type")]), PageRequest::<AccountField>::default()).unwrap();
        assert_eq!(sorted.sort, Some(Sort::new(AccountField::Type, Direction::Ascending)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Sorter::sort(&params(&[("sort", "balance")]), PageRequest::<AccountField>::default());
        assert!(matches!(err, Err(Error::ValidationError(_))));
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let err = Sorter::sort(
            &params(&[("sort", "name"), ("direction", "sideways")]),
            PageRequest::<AccountField>::default(),
        );
        assert!(matches!(err, Err(Error::ValidationError(_))));
    }
}
