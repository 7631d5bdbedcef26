use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{category, product, Category, Product};
use crate::errors::CatalogError;

use super::{CatalogStore, ProductFields, ProductWithCategory};

/// Catalog store backed by a relational database through sea-orm.
///
/// Conditional writes run inside a transaction so the guarding check and
/// the write itself cannot be separated by another connection.
#[derive(Clone)]
pub struct DatabaseCatalogStore {
    db: Arc<DatabaseConnection>,
}

impl DatabaseCatalogStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Case-insensitive name collision check among live categories. Generic
/// over the connection so it works both standalone and inside transactions.
async fn category_name_taken<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude: Option<Uuid>,
) -> Result<bool, CatalogError> {
    let mut query = Category::find()
        .filter(category::Column::IsDeleted.eq(false))
        .filter(Expr::expr(Func::lower(Expr::col(category::Column::Name))).eq(name.to_lowercase()));
    if let Some(id) = exclude {
        query = query.filter(category::Column::Id.ne(id));
    }
    Ok(query.one(conn).await?.is_some())
}

async fn live_category<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<category::Model>, CatalogError> {
    let category = Category::find_by_id(id)
        .filter(category::Column::IsDeleted.eq(false))
        .one(conn)
        .await?;
    Ok(category)
}

async fn live_product<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<product::Model>, CatalogError> {
    let product = Product::find_by_id(id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(conn)
        .await?;
    Ok(product)
}

#[async_trait]
impl CatalogStore for DatabaseCatalogStore {
    async fn list_categories(&self) -> Result<Vec<category::Model>, CatalogError> {
        let categories = Category::find()
            .filter(category::Column::IsDeleted.eq(false))
            .order_by_desc(category::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    async fn list_categories_by_name(&self) -> Result<Vec<category::Model>, CatalogError> {
        let categories = Category::find()
            .filter(category::Column::IsDeleted.eq(false))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        live_category(&*self.db, id).await
    }

    async fn find_category_any(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        let category = Category::find_by_id(id).one(&*self.db).await?;
        Ok(category)
    }

    async fn is_category_name_taken(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, CatalogError> {
        category_name_taken(&*self.db, name, exclude).await
    }

    async fn insert_category(&self, name: &str) -> Result<category::Model, CatalogError> {
        let name = name.to_string();
        self.db
            .transaction::<_, category::Model, CatalogError>(move |txn| {
                Box::pin(async move {
                    if category_name_taken(txn, &name, None).await? {
                        return Err(CatalogError::DuplicateName(name));
                    }

                    let category = category::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(name),
                        is_deleted: Set(false),
                        created_at: Set(Utc::now()),
                    };
                    Ok(category.insert(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }

    async fn update_category(&self, id: Uuid, name: &str) -> Result<category::Model, CatalogError> {
        let name = name.to_string();
        self.db
            .transaction::<_, category::Model, CatalogError>(move |txn| {
                Box::pin(async move {
                    let existing = live_category(txn, id).await?.ok_or_else(|| {
                        CatalogError::NotFound(format!("Category {} not found", id))
                    })?;
                    if category_name_taken(txn, &name, Some(id)).await? {
                        return Err(CatalogError::DuplicateName(name));
                    }

                    let mut active: category::ActiveModel = existing.into();
                    active.name = Set(name);
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), CatalogError> {
        self.db
            .transaction::<_, (), CatalogError>(move |txn| {
                Box::pin(async move {
                    let existing = live_category(txn, id).await?.ok_or_else(|| {
                        CatalogError::NotFound(format!("Category {} not found", id))
                    })?;

                    // Products keep their back-reference; only the flag flips.
                    let mut active: category::ActiveModel = existing.into();
                    active.is_deleted = Set(true);
                    active.update(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }

    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, CatalogError> {
        let rows = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .order_by_desc(product::Column::CreatedAt)
            .find_also_related(Category)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(product, category)| ProductWithCategory { product, category })
            .collect())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, CatalogError> {
        live_product(&*self.db, id).await
    }

    async fn insert_product(
        &self,
        fields: ProductFields,
        image: String,
    ) -> Result<product::Model, CatalogError> {
        self.db
            .transaction::<_, product::Model, CatalogError>(move |txn| {
                Box::pin(async move {
                    if live_category(txn, fields.category_id).await?.is_none() {
                        return Err(CatalogError::InvalidCategory(
                            fields.category_id.to_string(),
                        ));
                    }

                    let product = product::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(fields.name),
                        category_id: Set(fields.category_id),
                        description: Set(fields.description),
                        price: Set(fields.price),
                        image: Set(image),
                        is_deleted: Set(false),
                        created_at: Set(Utc::now()),
                    };
                    Ok(product.insert(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }

    async fn update_product(
        &self,
        id: Uuid,
        fields: ProductFields,
        image: Option<String>,
    ) -> Result<product::Model, CatalogError> {
        self.db
            .transaction::<_, product::Model, CatalogError>(move |txn| {
                Box::pin(async move {
                    let existing = live_product(txn, id).await?.ok_or_else(|| {
                        CatalogError::NotFound(format!("Product {} not found", id))
                    })?;
                    if live_category(txn, fields.category_id).await?.is_none() {
                        return Err(CatalogError::InvalidCategory(
                            fields.category_id.to_string(),
                        ));
                    }

                    let mut active: product::ActiveModel = existing.into();
                    active.name = Set(fields.name);
                    active.category_id = Set(fields.category_id);
                    active.description = Set(fields.description);
                    active.price = Set(fields.price);
                    if let Some(image) = image {
                        active.image = Set(image);
                    }
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }

    async fn soft_delete_product(&self, id: Uuid) -> Result<(), CatalogError> {
        self.db
            .transaction::<_, (), CatalogError>(move |txn| {
                Box::pin(async move {
                    let existing = live_product(txn, id).await?.ok_or_else(|| {
                        CatalogError::NotFound(format!("Product {} not found", id))
                    })?;

                    let mut active: product::ActiveModel = existing.into();
                    active.is_deleted = Set(true);
                    active.update(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => CatalogError::persistence(db_err),
                TransactionError::Transaction(err) => err,
            })
    }
}
