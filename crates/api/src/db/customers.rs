//! Customer reporting queries for the admin API.
//!
//! Customers are `USER` accounts. Statistics are aggregated from
//! `shop.orders` at read time.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use beauty_shop_core::{Cents, UserId};

use super::{OrderRepository, RepositoryError};
use crate::models::{CustomerDetail, CustomerSummary, PageParams};

/// Orders shown on the customer detail view.
const RECENT_ORDER_LIMIT: i64 = 10;

const CUSTOMER_SELECT: &str = r"
    SELECT u.id, u.name, u.email, u.image, u.created_at,
           COUNT(o.id) AS order_count,
           MAX(o.created_at) AS last_order,
           COALESCE(SUM(o.total) FILTER (WHERE o.status IN ('SHIPPED', 'DELIVERED')), 0)::BIGINT
               AS total_spent
    FROM shop.users u
    LEFT JOIN shop.orders o ON o.user_id = u.id
";

/// Shared by listing and counting. `$1` is an `ILIKE` pattern or NULL.
const CUSTOMER_FILTER: &str = r"
    WHERE u.role = 'USER'
      AND ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: UserId,
    name: Option<String>,
    email: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    order_count: i64,
    last_order: Option<DateTime<Utc>>,
    total_spent: i64,
}

impl From<CustomerRow> for CustomerSummary {
    fn from(r: CustomerRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            image: r.image,
            created_at: r.created_at,
            order_count: r.order_count,
            last_order: r.last_order,
            total_spent: Cents::new(r.total_spent),
        }
    }
}

/// Column a customer listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Name,
    Email,
}

/// Ordering for the customer listing, parsed from `field:direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerSort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for CustomerSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl CustomerSort {
    /// Parse `createdAt:desc`, `name:asc`, `email`, ...
    ///
    /// Unknown fields sort by creation time. Any direction other than `asc`
    /// sorts descending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        let (field, direction) = raw.split_once(':').unwrap_or((raw, "desc"));

        let field = match field.trim() {
            "name" => SortField::Name,
            "email" => SortField::Email,
            _ => SortField::CreatedAt,
        };

        Self {
            field,
            descending: !direction.trim().eq_ignore_ascii_case("asc"),
        }
    }

    fn order_by(self) -> &'static str {
        match (self.field, self.descending) {
            (SortField::CreatedAt, true) => "u.created_at DESC, u.id",
            (SortField::CreatedAt, false) => "u.created_at ASC, u.id",
            (SortField::Name, true) => "u.name DESC NULLS LAST, u.id",
            (SortField::Name, false) => "u.name ASC NULLS LAST, u.id",
            (SortField::Email, true) => "u.email DESC, u.id",
            (SortField::Email, false) => "u.email ASC, u.id",
        }
    }
}

/// Case-insensitive substring pattern with `LIKE` wildcards escaped.
fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;

    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Repository for customer reports.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of customers whose name or email contains `search`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        sort: CustomerSort,
        page: &PageParams,
    ) -> Result<(Vec<CustomerSummary>, i64), RepositoryError> {
        let pattern = search_pattern(search);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.users u {CUSTOMER_FILTER}"
        ))
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            r"
            {CUSTOMER_SELECT}
            {CUSTOMER_FILTER}
            GROUP BY u.id
            ORDER BY {order}
            LIMIT $2 OFFSET $3
            ",
            order = sort.order_by(),
        ))
        .bind(pattern.as_deref())
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(CustomerSummary::from).collect(), total))
    }

    /// A customer's statistics and their most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<CustomerDetail>, RepositoryError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "{CUSTOMER_SELECT} WHERE u.id = $1 GROUP BY u.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let recent_orders = OrderRepository::new(self.pool)
            .list_recent_for_user(id, RECENT_ORDER_LIMIT)
            .await?;

        Ok(Some(CustomerDetail {
            summary: row.into(),
            recent_orders,
        }))
    }
}
