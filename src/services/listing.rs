use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::database::retry;
use crate::error::Result;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(req: PageRequest, total: i64) -> Self {
        let pages = if total <= 0 {
            0
        } else {
            (total + req.limit - 1) / req.limit
        };
        Self {
            page: req.page,
            limit: req.limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Int(i32),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl From<String> for Bind {
    fn from(v: String) -> Self {
        Bind::Text(v)
    }
}

impl From<&str> for Bind {
    fn from(v: &str) -> Self {
        Bind::Text(v.to_string())
    }
}

impl From<Uuid> for Bind {
    fn from(v: Uuid) -> Self {
        Bind::Uuid(v)
    }
}

impl From<bool> for Bind {
    fn from(v: bool) -> Self {
        Bind::Bool(v)
    }
}

impl From<i32> for Bind {
    fn from(v: i32) -> Self {
        Bind::Int(v)
    }
}

impl From<NaiveDate> for Bind {
    fn from(v: NaiveDate) -> Self {
        Bind::Date(v)
    }
}

impl From<DateTime<Utc>> for Bind {
    fn from(v: DateTime<Utc>) -> Self {
        Bind::Timestamp(v)
    }
}

/// Allow-listed filter set. Column names always come from code; only values
/// are bound. The same set renders the WHERE clause of both the page query
/// and its count query.
#[derive(Debug, Default, Clone)]
pub struct Predicates {
    clauses: Vec<String>,
    binds: Vec<Bind>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, clause: impl FnOnce(usize) -> String, value: Bind) {
        self.binds.push(value);
        self.clauses.push(clause(self.binds.len()));
    }

    pub fn eq<V: Into<Bind>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(|n| format!("{} = ${}", column, n), v.into());
        }
        self
    }

    pub fn at_least<V: Into<Bind>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(|n| format!("{} >= ${}", column, n), v.into());
        }
        self
    }

    pub fn at_most<V: Into<Bind>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(|n| format!("{} <= ${}", column, n), v.into());
        }
        self
    }

    pub fn contains(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        self.search(&[column], value)
    }

    /// Case-insensitive substring match over any of `columns`, one bind.
    pub fn search(&mut self, columns: &[&str], value: Option<&str>) -> &mut Self {
        let Some(term) = value.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        let pattern = format!("%{}%", escape_like(term));
        self.push(
            |n| {
                let parts: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} ILIKE ${}", c, n))
                    .collect();
                format!("({})", parts.join(" OR "))
            },
            Bind::Text(pattern),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn bind_as<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value.clone() {
                Bind::Text(v) => query.bind(v),
                Bind::Uuid(v) => query.bind(v),
                Bind::Bool(v) => query.bind(v),
                Bind::Int(v) => query.bind(v),
                Bind::Date(v) => query.bind(v),
                Bind::Timestamp(v) => query.bind(v),
            };
        }
        query
    }

    pub fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value.clone() {
                Bind::Text(v) => query.bind(v),
                Bind::Uuid(v) => query.bind(v),
                Bind::Bool(v) => query.bind(v),
                Bind::Int(v) => query.bind(v),
                Bind::Date(v) => query.bind(v),
                Bind::Timestamp(v) => query.bind(v),
            };
        }
        query
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `select` and `count` are the statement heads without WHERE; both get the
/// same predicates.
pub async fn fetch_page<T>(
    pool: &PgPool,
    select: &str,
    count: &str,
    predicates: &Predicates,
    order_by: &str,
    req: PageRequest,
) -> Result<Page<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let where_clause = predicates.where_clause();
    let n = predicates.len();
    let items_sql = format!(
        "{} {} ORDER BY {} LIMIT ${} OFFSET ${}",
        select,
        where_clause,
        order_by,
        n + 1,
        n + 2
    );
    let count_sql = format!("{} {}", count, where_clause);

    let items_sql = &items_sql;
    let count_sql = &count_sql;
    let items = retry::read(|| async move {
        predicates
            .bind_as(sqlx::query_as::<_, T>(items_sql))
            .bind(req.limit)
            .bind(req.offset())
            .fetch_all(pool)
            .await
    })
    .await?;
    let total = retry::read(|| async move {
        predicates
            .bind_scalar(sqlx::query_scalar::<_, i64>(count_sql))
            .fetch_one(pool)
            .await
    })
    .await?;

    Ok(Page {
        items,
        pagination: Pagination::new(req, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(0)).limit, 1);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let req = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(req.page, MAX_PAGE);
        assert_eq!(req.offset(), (MAX_PAGE - 1) * 100);
        let req = PageRequest::new(Some(i64::MIN), Some(i64::MAX));
        assert_eq!(req, PageRequest { page: 1, limit: 100 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn pages_round_up() {
        let req = PageRequest::new(Some(1), Some(20));
        assert_eq!(Pagination::new(req, 0).pages, 0);
        assert_eq!(Pagination::new(req, 20).pages, 1);
        assert_eq!(Pagination::new(req, 21).pages, 2);
        assert_eq!(Pagination::new(req, 41).total, 41);
    }

    #[test]
    fn placeholders_number_in_bind_order() {
        let mut p = Predicates::new();
        p.eq("status", Some("Active"))
            .eq::<Uuid>("company_id", None)
            .contains("location", Some("Tash"))
            .search(&["first_name", "email"], Some("ann"));
        assert_eq!(
            p.where_clause(),
            "WHERE status = $1 AND (location ILIKE $2) AND (first_name ILIKE $3 OR email ILIKE $3)"
        );
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn blank_search_adds_nothing() {
        let mut p = Predicates::new();
        p.search(&["name"], Some("   ")).contains("city", None);
        assert!(p.is_empty());
        assert_eq!(p.where_clause(), "");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        let mut p = Predicates::new();
        p.contains("name", Some("50%_off"));
        assert_eq!(p.binds, vec![Bind::Text("%50\\%\\_off%".into())]);
    }
}
