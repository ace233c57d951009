use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "perk_category", rename_all = "lowercase")]
pub enum Category {
    Food,
    Tech,
    Travel,
    Fitness,
    #[default]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Perk {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub discount_percent: f64,
    pub merchant: String,
    pub created_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Perk>> {
    sqlx::query_as::<_, Perk>(
        r#"
        SELECT id, title, description, category, discount_percent, merchant, created_at
        FROM perks
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
}

/// Exact title match, newest first.
pub async fn find_by_title(db: &PgPool, title: &str) -> sqlx::Result<Vec<Perk>> {
    sqlx::query_as::<_, Perk>(
        r#"
        SELECT id, title, description, category, discount_percent, merchant, created_at
        FROM perks
        WHERE title = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(title)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Perk>> {
    sqlx::query_as::<_, Perk>(
        r#"
        SELECT id, title, description, category, discount_percent, merchant, created_at
        FROM perks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert(
    db: &PgPool,
    title: &str,
    description: &str,
    category: Category,
    discount_percent: f64,
    merchant: &str,
) -> sqlx::Result<Perk> {
    sqlx::query_as::<_, Perk>(
        r#"
        INSERT INTO perks (title, description, category, discount_percent, merchant)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, category, discount_percent, merchant, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(category)
    .bind(discount_percent)
    .bind(merchant)
    .fetch_one(db)
    .await
}

/// Persists a merged perk. `id` and `created_at` never change.
pub async fn save(db: &PgPool, perk: &Perk) -> sqlx::Result<Perk> {
    sqlx::query_as::<_, Perk>(
        r#"
        UPDATE perks
        SET title = $2, description = $3, category = $4, discount_percent = $5, merchant = $6
        WHERE id = $1
        RETURNING id, title, description, category, discount_percent, merchant, created_at
        "#,
    )
    .bind(perk.id)
    .bind(&perk.title)
    .bind(&perk.description)
    .bind(perk.category)
    .bind(perk.discount_percent)
    .bind(&perk.merchant)
    .fetch_one(db)
    .await
}

/// Atomic find-and-delete; `None` means no row matched.
pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        DELETE FROM perks
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(|(id,)| id))
}

/// Postgres unique-constraint violation, raised by the (title, merchant) index.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "23505")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_defaults_to_other() {
        assert_eq!(Category::default(), Category::Other);
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Food).unwrap(), "\"food\"");
        assert_eq!(serde_json::to_string(&Category::Other).unwrap(), "\"other\"");
    }

    #[test]
    fn category_rejects_unknown_value() {
        let parsed: Result<Category, _> = serde_json::from_str("\"gaming\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
