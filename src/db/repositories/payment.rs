use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{classrooms, payments, prelude::*, students};

use super::attendance::classrooms_for;

#[derive(Debug, Clone)]
pub struct PaymentRow {
    pub record: payments::Model,
    pub student: Option<students::Model>,
    pub classroom: Option<classrooms::Model>,
}

pub struct NewPayment {
    pub student_id: i32,
    pub fee_type: String,
    pub total_fee: f64,
    pub total_paid: f64,
    pub payment_date: String,
    pub due_date: Option<String>,
    pub payment_method: String,
    pub receipt_number: String,
    pub notes: String,
}

/// Partial update; `None` leaves the field untouched. `due_date` uses a
/// double Option so the caller can clear it explicitly.
#[derive(Default)]
pub struct PaymentChanges {
    pub student_id: Option<i32>,
    pub fee_type: Option<String>,
    pub total_fee: Option<f64>,
    pub total_paid: Option<f64>,
    pub payment_date: Option<String>,
    pub due_date: Option<Option<String>>,
    pub payment_method: Option<String>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
}

pub struct PaymentRepository {
    conn: DatabaseConnection,
}

impl PaymentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, page: u64, page_size: u64) -> Result<(Vec<PaymentRow>, u64)> {
        let paginator = Payments::find()
            .find_also_related(Students)
            .order_by_desc(payments::Column::PaymentDate)
            .order_by_desc(payments::Column::Id)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        let classrooms = classrooms_for(&self.conn, items.iter().filter_map(|(_, s)| s.as_ref()))
            .await?;

        Ok((
            items
                .into_iter()
                .map(|(record, student)| {
                    let classroom = student
                        .as_ref()
                        .and_then(|s| classrooms.get(&s.classroom_id).cloned());
                    PaymentRow {
                        record,
                        student,
                        classroom,
                    }
                })
                .collect(),
            total_pages,
        ))
    }

    pub async fn get(&self, id: i32) -> Result<Option<PaymentRow>> {
        let Some((record, student)) = Payments::find_by_id(id)
            .find_also_related(Students)
            .one(&self.conn)
            .await
            .context("Failed to query payment")?
        else {
            return Ok(None);
        };

        let classrooms = classrooms_for(&self.conn, student.iter()).await?;
        let classroom = student
            .as_ref()
            .and_then(|s| classrooms.get(&s.classroom_id).cloned());

        Ok(Some(PaymentRow {
            record,
            student,
            classroom,
        }))
    }

    pub async fn create(&self, new: NewPayment) -> Result<payments::Model> {
        let model = payments::ActiveModel {
            student_id: Set(new.student_id),
            fee_type: Set(new.fee_type),
            total_fee: Set(new.total_fee),
            total_paid: Set(new.total_paid),
            payment_date: Set(new.payment_date),
            due_date: Set(new.due_date),
            payment_method: Set(new.payment_method),
            receipt_number: Set(new.receipt_number),
            notes: Set(new.notes),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: PaymentChanges,
    ) -> Result<Option<payments::Model>> {
        let Some(model) = Payments::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: payments::ActiveModel = model.into();
        if let Some(student_id) = changes.student_id {
            active.student_id = Set(student_id);
        }
        if let Some(fee_type) = changes.fee_type {
            active.fee_type = Set(fee_type);
        }
        if let Some(total_fee) = changes.total_fee {
            active.total_fee = Set(total_fee);
        }
        if let Some(total_paid) = changes.total_paid {
            active.total_paid = Set(total_paid);
        }
        if let Some(payment_date) = changes.payment_date {
            active.payment_date = Set(payment_date);
        }
        if let Some(due_date) = changes.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(payment_method) = changes.payment_method {
            active.payment_method = Set(payment_method);
        }
        if let Some(receipt_number) = changes.receipt_number {
            active.receipt_number = Set(receipt_number);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(notes);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Payments::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
