use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::Category;
use crate::repositories::RepositoryError;

/// Store operations for the category forest.
///
/// Every write that touches a hierarchy edge (insert under a parent, edge
/// rewrite, subtree delete) runs inside a single transaction with the affected
/// rows locked, so the `parent_id` pointer and the mirrored `children` array
/// can never be observed out of sync and concurrent hierarchy mutations
/// serialize at the store.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Case-insensitive name lookup, used for the uniqueness check.
    async fn find_by_name_ci(&self, name: &str) -> Result<Option<Category>, RepositoryError>;

    /// Product count per category id, for the table view annotation.
    async fn product_counts(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError>;

    /// Inserts the category; when `parent_id` is set the new id is pushed into
    /// that parent's `children` in the same transaction.
    async fn insert(&self, category: &Category) -> Result<Category, RepositoryError>;

    /// Full-row update that does not move the category in the hierarchy.
    async fn update(&self, category: &Category) -> Result<Category, RepositoryError>;

    /// Full-row update plus the edge rewrite: the id is pulled from
    /// `old_parent`'s children and pushed into `new_parent`'s, all in one
    /// transaction.
    async fn update_with_reparent(
        &self,
        category: &Category,
        old_parent: Option<Uuid>,
        new_parent: Option<Uuid>,
    ) -> Result<Category, RepositoryError>;

    /// Deletes the id set as one transaction and, when `detach` names the
    /// former parent of the subtree root, pulls the root out of that parent's
    /// `children`. Returns the number of rows deleted.
    async fn delete_subtree(
        &self,
        ids: &[Uuid],
        detach: Option<(Uuid, Uuid)>,
    ) -> Result<u64, RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository.
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, slug, parent_id, children, image, is_active, \
                              created_at, updated_at";

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLUMNS} FROM categories ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn find_by_name_ci(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLUMNS} FROM categories WHERE LOWER(name) = LOWER($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn product_counts(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError> {
        let counts = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT category_id, COUNT(*) FROM products \
             WHERE category_id IS NOT NULL GROUP BY category_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn insert(&self, category: &Category) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent_id) = category.parent_id {
            // Lock the parent so a concurrent delete cannot race the push.
            let parent: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if parent.is_none() {
                return Err(RepositoryError::NotFound);
            }
        }

        let inserted = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories \
                 (id, name, slug, parent_id, children, image, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.parent_id)
        .bind(&category.children)
        .bind(&category.image)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(parent_id) = category.parent_id {
            sqlx::query(
                "UPDATE categories SET children = array_append(children, $1), updated_at = NOW() \
                 WHERE id = $2 AND NOT children @> ARRAY[$1]::uuid[]",
            )
            .bind(category.id)
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, category: &Category) -> Result<Category, RepositoryError> {
        let updated = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories \
             SET name = $2, slug = $3, image = $4, is_active = $5, updated_at = $6 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.image)
        .bind(category.is_active)
        .bind(category.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn update_with_reparent(
        &self,
        category: &Category,
        old_parent: Option<Uuid>,
        new_parent: Option<Uuid>,
    ) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock every row the rewrite touches, in a stable order.
        let mut locked: Vec<Uuid> = vec![category.id];
        locked.extend(old_parent);
        locked.extend(new_parent);
        locked.sort();
        locked.dedup();
        sqlx::query("SELECT id FROM categories WHERE id = ANY($1) FOR UPDATE")
            .bind(&locked)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories \
             SET name = $2, slug = $3, parent_id = $4, image = $5, is_active = $6, updated_at = $7 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.parent_id)
        .bind(&category.image)
        .bind(category.is_active)
        .bind(category.updated_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if let Some(old_id) = old_parent {
            sqlx::query(
                "UPDATE categories SET children = array_remove(children, $1), updated_at = NOW() \
                 WHERE id = $2",
            )
            .bind(category.id)
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(new_id) = new_parent {
            // The row is locked above; confirm it still exists in case it was
            // deleted between the service's existence check and this write.
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
                .bind(new_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(RepositoryError::NotFound);
            }
            sqlx::query(
                "UPDATE categories SET children = array_append(children, $1), updated_at = NOW() \
                 WHERE id = $2 AND NOT children @> ARRAY[$1]::uuid[]",
            )
            .bind(category.id)
            .bind(new_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_subtree(
        &self,
        ids: &[Uuid],
        detach: Option<(Uuid, Uuid)>,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some((parent_id, root_id)) = detach {
            sqlx::query(
                "UPDATE categories SET children = array_remove(children, $1), updated_at = NOW() \
                 WHERE id = $2",
            )
            .bind(root_id)
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
        }

        // One statement for the whole id set: parent/child foreign keys inside
        // the subtree are checked at statement end, so the order of rows does
        // not matter.
        let deleted = sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected())
    }
}
