//! Persisted shape of a task and the rules the store enforces on it.

use chrono::{SubsecRound, Utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;

/// Message returned when a record reaches the store without a usable title.
pub const TITLE_REQUIRED: &str = "Task validation failed: title is required";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub due_date: Option<DateTimeUtc>,
    pub is_completed: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Fills the store-owned defaults on insert and rejects blank titles.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        match &self.title {
            Set(title) | Unchanged(title) if !title.trim().is_empty() => {}
            NotSet if !insert => {}
            _ => return Err(DbErr::Custom(TITLE_REQUIRED.to_string())),
        }

        if insert {
            if self.id.is_not_set() {
                // v7 ids sort by creation, which breaks ties between equal timestamps.
                self.id = Set(Uuid::now_v7());
            }
            if self.is_completed.is_not_set() {
                self.is_completed = Set(false);
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(Utc::now().trunc_subsecs(6));
            }
        }

        Ok(self)
    }
}
