use thiserror::Error;

use crate::db_types::{NewProduct, NewUser, Product, ProductId, Role, User, UserId};

/// The slice of the user and product catalogue that the settlement core needs.
///
/// Registration, authentication and product editing live elsewhere. This trait only covers creating records (for
/// seeding and tests) and the lookups that checkout and settlement perform.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError>;

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, CatalogError>;

    /// Returns the user with the given role that has the lowest id, if any.
    async fn fetch_first_user_with_role(&self, role: Role) -> Result<Option<User>, CatalogError>;

    /// Inserts a new product. The owner must exist and must be a seller or admin.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The user {0} does not exist")]
    UserNotFound(UserId),
    #[error("The user {0} cannot own products")]
    NotASeller(UserId),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
