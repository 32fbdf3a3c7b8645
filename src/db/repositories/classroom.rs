use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{classrooms, prelude::*};

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct ClassroomChanges {
    pub name: Option<String>,
    pub section: Option<String>,
}

pub struct ClassroomRepository {
    conn: DatabaseConnection,
}

impl ClassroomRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<classrooms::Model>, u64)> {
        let paginator = Classrooms::find()
            .order_by_asc(classrooms::Column::Name)
            .order_by_asc(classrooms::Column::Section)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn get(&self, id: i32) -> Result<Option<classrooms::Model>> {
        Classrooms::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query classroom")
    }

    pub async fn create(&self, name: String, section: String) -> Result<classrooms::Model> {
        let model = classrooms::ActiveModel {
            name: Set(name),
            section: Set(section),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: ClassroomChanges,
    ) -> Result<Option<classrooms::Model>> {
        let Some(model) = Classrooms::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: classrooms::ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(section) = changes.section {
            active.section = Set(section);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    /// Fails with a foreign-key violation while students reference the row.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Classrooms::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
