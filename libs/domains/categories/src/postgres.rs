use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{CategoryError, CategoryResult},
    models::Category,
    repository::CategoryRepository,
};

#[derive(Clone)]
pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_write_err(err: DbErr, name: &str) -> CategoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CategoryError::DuplicateName(name.to_string()),
        _ => err.into(),
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, category: Category) -> CategoryResult<Category> {
        let name = category.name.clone();
        let model = entity::Entity::insert(entity::ActiveModel::from(category))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| map_write_err(e, &name))?;

        tracing::info!(category_id = %model.id, name = %model.name, "Created category");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let model = entity::Entity::find()
            .filter(Expr::cust_with_values(
                "LOWER(name) = $1",
                [name.trim().to_lowercase()],
            ))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .order_by_asc(Expr::cust("LOWER(name)"))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, category: Category) -> CategoryResult<Category> {
        let id = category.id;
        let name = category.name.clone();
        let model = entity::ActiveModel::from(category)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CategoryError::NotFound(id),
                other => map_write_err(other, &name),
            })?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let txn = self.db.begin().await?;

        let referenced = txn
            .query_one_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT 1 AS one FROM tasks WHERE category_id = $1 LIMIT 1",
                [id.into()],
            ))
            .await?
            .is_some();
        if referenced {
            return Err(CategoryError::InUse(id));
        }

        // The RESTRICT foreign key catches a task inserted after the check
        let result = entity::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => CategoryError::InUse(id),
                _ => e.into(),
            })?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
