//! Dynamic query building: filter criteria, predicates, ordering and paging

pub mod criteria;
pub mod page;
pub mod predicate;
pub mod sort;

pub use criteria::{build_predicate, parse_filter, FilterCriteria};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use predicate::{Field, FieldKind, FieldValue, Filterable, Operator, Predicate};
pub use sort::{Direction, Sort, Sorter};
