use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{classrooms, prelude::*, students};

pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub roll_number: String,
    pub classroom_id: i32,
    pub guardian_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub address: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct StudentChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub roll_number: Option<String>,
    pub classroom_id: Option<i32>,
    pub guardian_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
}

pub struct StudentRepository {
    conn: DatabaseConnection,
}

impl StudentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<(students::Model, Option<classrooms::Model>)>, u64)> {
        let paginator = Students::find()
            .find_also_related(Classrooms)
            .order_by_asc(students::Column::LastName)
            .order_by_asc(students::Column::FirstName)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn get(
        &self,
        id: i32,
    ) -> Result<Option<(students::Model, Option<classrooms::Model>)>> {
        Students::find_by_id(id)
            .find_also_related(Classrooms)
            .one(&self.conn)
            .await
            .context("Failed to query student")
    }

    pub async fn create(&self, new: NewStudent) -> Result<students::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = students::ActiveModel {
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            date_of_birth: Set(new.date_of_birth),
            roll_number: Set(new.roll_number),
            classroom_id: Set(new.classroom_id),
            guardian_name: Set(new.guardian_name),
            contact_phone: Set(new.contact_phone),
            contact_email: Set(new.contact_email),
            address: Set(new.address),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: StudentChanges,
    ) -> Result<Option<students::Model>> {
        let Some(model) = Students::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: students::ActiveModel = model.into();
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            active.date_of_birth = Set(date_of_birth);
        }
        if let Some(roll_number) = changes.roll_number {
            active.roll_number = Set(roll_number);
        }
        if let Some(classroom_id) = changes.classroom_id {
            active.classroom_id = Set(classroom_id);
        }
        if let Some(guardian_name) = changes.guardian_name {
            active.guardian_name = Set(guardian_name);
        }
        if let Some(contact_phone) = changes.contact_phone {
            active.contact_phone = Set(contact_phone);
        }
        if let Some(contact_email) = changes.contact_email {
            active.contact_email = Set(contact_email);
        }
        if let Some(address) = changes.address {
            active.address = Set(address);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Students::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
