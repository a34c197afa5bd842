//! Pagination request and result types

use serde::Serialize;

use super::criteria::FilterCriteria;
use super::predicate::Field;
use super::sort::Sort;
use crate::error::{Error, Result};

/// Page size used when the request names none
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Requested sizes above this are clamped
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Zero-based page request with optional ordering
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest<F: Field> {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort<F>>,
}

impl<F: Field> PageRequest<F> {
    pub fn new(page: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::ValidationError("page size must be at least 1".to_string()));
        }
        Ok(Self {
            page,
            size: size.min(MAX_PAGE_SIZE),
            sort: None,
        })
    }

    /// Read `page` and `size` from request parameters
    pub fn from_params(params: &FilterCriteria) -> Result<Self> {
        let page = parse_number(params, "page")?.unwrap_or(0);
        let size = parse_number(params, "size")?.unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, size)
    }

    pub fn with_sort(mut self, sort: Sort<F>) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

impl<F: Field> Default for PageRequest<F> {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

fn parse_number(params: &FilterCriteria, key: &str) -> Result<Option<u32>> {
    match params.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::ValidationError(format!("{} must be a non-negative integer, got '{}'", key, raw))),
    }
}

/// A bounded slice of a result set plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new<F: Field>(items: Vec<T>, request: &PageRequest<F>, total_count: u64) -> Self {
        Self {
            items,
            page_number: request.page,
            page_size: request.size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            (self.total_count + self.page_size as u64 - 1) / self.page_size as u64
        }
    }

    /// Convert the items, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::account::AccountField;

    #[test]
    fn defaults_and_clamping() {
        let empty = FilterCriteria::new();
        let req = PageRequest::<AccountField>::from_params(&empty).unwrap();
        assert_eq!((req.page, req.size), (0, DEFAULT_PAGE_SIZE));

        let params: FilterCriteria = [("page", "2"), ("size", "5000")].into_iter().collect();
        let req = PageRequest::<AccountField>::from_params(&params).unwrap();
        assert_eq!((req.page, req.size), (2, MAX_PAGE_SIZE));
        assert_eq!(req.offset(), 2000);
    }

    #[test]
    fn rejects_bad_numbers() {
        let params: FilterCriteria = [("size", "0")].into_iter().collect();
        assert!(matches!(
            PageRequest::<AccountField>::from_params(&params),
            Err(Error::ValidationError(_))
        ));

        let params: FilterCriteria = [("page", "-1")].into_iter().collect();
        assert!(matches!(
            PageRequest::<AccountField>::from_params(&params),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest::<AccountField>::new(0, 20).unwrap();
        assert_eq!(Page::new(Vec::<u8>::new(), &req, 41).total_pages(), 3);
        assert_eq!(Page::new(Vec::<u8>::new(), &req, 0).total_pages(), 0);
    }
}
