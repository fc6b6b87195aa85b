//! Company repository.

use std::sync::Arc;

use beacon_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    Set,
};

use crate::entities::company::{ActiveModel, Column, Entity, Model};

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    pub name: String,
    pub domain: Option<String>,
}

/// Company repository for database operations.
#[derive(Clone)]
pub struct CompanyRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl CompanyRepository {
    /// Create a new company repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new company.
    pub async fn create(&self, input: CreateCompanyInput) -> AppResult<Model> {
        let model = ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            domain: Set(input.domain),
            created_at: Set(Utc::now().fixed_offset()),
            updated_at: Set(None),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a company by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Model>> {
        Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a company by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CompanyNotFound(id.to_string()))
    }

    /// Find all companies, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<Model>> {
        Entity::find()
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all company IDs, oldest first.
    pub async fn find_all_ids(&self) -> AppResult<Vec<String>> {
        Entity::find()
            .select_only()
            .column(Column::Id)
            .order_by_asc(Column::CreatedAt)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all companies.
    pub async fn count(&self) -> AppResult<u64> {
        Entity::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
