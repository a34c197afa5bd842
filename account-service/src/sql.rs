//! Renders predicates, ordering and paging into parameterised PostgreSQL.
//!
//! Identifiers come from [`Field::column`] only; every operand is a bind
//! parameter.

use common::query::{Direction, Field, FieldKind, FieldValue, PageRequest, Predicate};

/// SQL text plus its positional parameters (`$1`, `$2`, ...)
#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

impl QueryBuf {
    fn push_param(&mut self, v: FieldValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Quote identifier for PostgreSQL
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Schema-qualified table name
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Render `predicate` as a boolean SQL expression, appending its operands to `q.params`
pub fn render_predicate<F: Field>(predicate: &Predicate<F>, q: &mut QueryBuf) -> String {
    let compare = |q: &mut QueryBuf, field: &F, op: &str, value: &FieldValue| {
        let n = q.push_param(value.clone());
        format!("{} {} ${}", quoted(field.column()), op, n)
    };

    match predicate {
        Predicate::Equals(f, v) => compare(q, f, "=", v),
        Predicate::NotEquals(f, v) => compare(q, f, "<>", v),
        Predicate::GreaterThan(f, v) => compare(q, f, ">", v),
        Predicate::GreaterOrEqual(f, v) => compare(q, f, ">=", v),
        Predicate::LessThan(f, v) => compare(q, f, "<", v),
        Predicate::LessOrEqual(f, v) => compare(q, f, "<=", v),
        // strpos is case-sensitive and needs no LIKE escaping
        Predicate::Contains(f, needle) => {
            let n = q.push_param(FieldValue::Text(needle.clone()));
            format!("strpos({}, ${}) > 0", quoted(f.column()), n)
        }
        Predicate::And(parts) if parts.is_empty() => "TRUE".to_string(),
        Predicate::Or(parts) if parts.is_empty() => "FALSE".to_string(),
        Predicate::And(parts) => join(parts, " AND ", q),
        Predicate::Or(parts) => join(parts, " OR ", q),
    }
}

fn join<F: Field>(parts: &[Predicate<F>], sep: &str, q: &mut QueryBuf) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| render_predicate(p, q)).collect();
    format!("({})", rendered.join(sep))
}

/// ` WHERE ...`, or empty for the identity predicate
fn where_clause<F: Field>(predicate: &Predicate<F>, q: &mut QueryBuf) -> String {
    if predicate.is_all() {
        String::new()
    } else {
        format!(" WHERE {}", render_predicate(predicate, q))
    }
}

/// Sort key for a column. Text sorts byte-wise, as the in-memory store does.
fn sort_key<F: Field>(field: F) -> String {
    match field.kind() {
        FieldKind::Text => format!("{} COLLATE \"C\"", quoted(field.column())),
        FieldKind::Integer | FieldKind::Date => quoted(field.column()),
    }
}

/// ` ORDER BY` the requested field, then the primary key
fn order_clause<F: Field>(page: Option<&PageRequest<F>>) -> String {
    let pk = quoted(F::primary_key().column());
    match page.and_then(|p| p.sort.as_ref()) {
        Some(sort) if sort.field != F::primary_key() => format!(
            " ORDER BY {} {}, {} ASC",
            sort_key(sort.field),
            sort.direction.as_sql(),
            pk
        ),
        Some(sort) => format!(" ORDER BY {} {}", pk, sort.direction.as_sql()),
        None => format!(" ORDER BY {} {}", pk, Direction::Ascending.as_sql()),
    }
}

fn column_list<F: Field>(columns: &[F]) -> String {
    columns
        .iter()
        .map(|c| quoted(c.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT every row ordered by primary key
pub fn select_all<F: Field>(table: &str, columns: &[F]) -> QueryBuf {
    QueryBuf {
        sql: format!("SELECT {} FROM {}{}", column_list(columns), table, order_clause::<F>(None)),
        params: Vec::new(),
    }
}

/// SELECT one page of rows matching `predicate`
pub fn select_page<F: Field>(
    table: &str,
    columns: &[F],
    predicate: &Predicate<F>,
    page: &PageRequest<F>,
) -> QueryBuf {
    let mut q = QueryBuf::default();
    let where_sql = where_clause(predicate, &mut q);
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        column_list(columns),
        table,
        where_sql,
        order_clause(Some(page)),
        page.size,
        page.offset()
    );
    q
}

/// COUNT rows matching `predicate`
pub fn count<F: Field>(table: &str, predicate: &Predicate<F>) -> QueryBuf {
    let mut q = QueryBuf::default();
    let where_sql = where_clause(predicate, &mut q);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, where_sql);
    q
}
