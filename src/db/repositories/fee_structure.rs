use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{classrooms, fee_structures, prelude::*};

pub struct NewFeeStructure {
    pub classroom_id: i32,
    pub fee_type: String,
    pub amount: f64,
    pub frequency: String,
    pub description: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct FeeStructureChanges {
    pub classroom_id: Option<i32>,
    pub fee_type: Option<String>,
    pub amount: Option<f64>,
    pub frequency: Option<String>,
    pub description: Option<String>,
}

pub struct FeeStructureRepository {
    conn: DatabaseConnection,
}

impl FeeStructureRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<(fee_structures::Model, Option<classrooms::Model>)>, u64)> {
        let paginator = FeeStructures::find()
            .find_also_related(Classrooms)
            .order_by_asc(fee_structures::Column::ClassroomId)
            .order_by_asc(fee_structures::Column::FeeType)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn get(
        &self,
        id: i32,
    ) -> Result<Option<(fee_structures::Model, Option<classrooms::Model>)>> {
        FeeStructures::find_by_id(id)
            .find_also_related(Classrooms)
            .one(&self.conn)
            .await
            .context("Failed to query fee structure")
    }

    pub async fn create(&self, new: NewFeeStructure) -> Result<fee_structures::Model> {
        let model = fee_structures::ActiveModel {
            classroom_id: Set(new.classroom_id),
            fee_type: Set(new.fee_type),
            amount: Set(new.amount),
            frequency: Set(new.frequency),
            description: Set(new.description),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: FeeStructureChanges,
    ) -> Result<Option<fee_structures::Model>> {
        let Some(model) = FeeStructures::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: fee_structures::ActiveModel = model.into();
        if let Some(classroom_id) = changes.classroom_id {
            active.classroom_id = Set(classroom_id);
        }
        if let Some(fee_type) = changes.fee_type {
            active.fee_type = Set(fee_type);
        }
        if let Some(amount) = changes.amount {
            active.amount = Set(amount);
        }
        if let Some(frequency) = changes.frequency {
            active.frequency = Set(frequency);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = FeeStructures::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
