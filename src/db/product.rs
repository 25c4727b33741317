use sqlx::sqlite::SqlitePool;

/// A product record.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub uuid: String,
    pub user_uuid: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    uuid: String,
    user_uuid: String,
    title: String,
    description: String,
    price: f64,
    image: String,
    created_at: String,
    updated_at: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            user_uuid: row.user_uuid,
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, uuid, user_uuid, title, description, price, image, created_at, updated_at";

/// Store for managing products.
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new product owned by a user and return the full record.
    pub async fn create(
        &self,
        uuid: &str,
        user_uuid: &str,
        title: &str,
        description: &str,
        price: f64,
        image: &str,
    ) -> Result<Product, sqlx::Error> {
        sqlx::query(
            "INSERT INTO products (uuid, user_uuid, title, description, price, image) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(user_uuid)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image)
        .execute(&self.pool)
        .await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE uuid = ?",
            PRODUCT_COLUMNS
        ))
        .bind(uuid)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a product by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Product>, sqlx::Error> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE uuid = ?",
            PRODUCT_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    /// Update a product's fields. Returns false if no such product exists.
    pub async fn update(
        &self,
        uuid: &str,
        title: &str,
        description: &str,
        price: f64,
        image: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET title = ?, description = ?, price = ?, image = ?, updated_at = datetime('now') WHERE uuid = ?",
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a product by UUID. Returns false if no such product exists.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
