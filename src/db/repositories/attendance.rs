use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{attendance, classrooms, prelude::*, students};

/// An attendance record joined with its student (and the student's classroom,
/// for nested detail expansion).
#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub record: attendance::Model,
    pub student: Option<students::Model>,
    pub classroom: Option<classrooms::Model>,
}

pub struct NewAttendance {
    pub student_id: i32,
    pub date: String,
    pub status: String,
    pub notes: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct AttendanceChanges {
    pub student_id: Option<i32>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub struct AttendanceRepository {
    conn: DatabaseConnection,
}

impl AttendanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, page: u64, page_size: u64) -> Result<(Vec<AttendanceRow>, u64)> {
        let paginator = Attendance::find()
            .find_also_related(Students)
            .order_by_desc(attendance::Column::Date)
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
                    AttendanceRow {
                        record,
                        student,
                        classroom,
                    }
                })
                .collect(),
            total_pages,
        ))
    }

    pub async fn get(&self, id: i32) -> Result<Option<AttendanceRow>> {
        let Some((record, student)) = Attendance::find_by_id(id)
            .find_also_related(Students)
            .one(&self.conn)
            .await
            .context("Failed to query attendance record")?
        else {
            return Ok(None);
        };

        let classrooms = classrooms_for(&self.conn, student.iter()).await?;
        let classroom = student
            .as_ref()
            .and_then(|s| classrooms.get(&s.classroom_id).cloned());

        Ok(Some(AttendanceRow {
            record,
            student,
            classroom,
        }))
    }

    pub async fn create(&self, new: NewAttendance) -> Result<attendance::Model> {
        let model = attendance::ActiveModel {
            student_id: Set(new.student_id),
            date: Set(new.date),
            status: Set(new.status),
            notes: Set(new.notes),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: AttendanceChanges,
    ) -> Result<Option<attendance::Model>> {
        let Some(model) = Attendance::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: attendance::ActiveModel = model.into();
        if let Some(student_id) = changes.student_id {
            active.student_id = Set(student_id);
        }
        if let Some(date) = changes.date {
            active.date = Set(date);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(notes);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Attendance::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

/// Batch-load the classrooms referenced by a set of students.
pub(crate) async fn classrooms_for(
    conn: &DatabaseConnection,
    students: impl Iterator<Item = &students::Model>,
) -> Result<HashMap<i32, classrooms::Model>> {
    let ids: Vec<i32> = students.map(|s| s.classroom_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = Classrooms::find()
        .filter(classrooms::Column::Id.is_in(ids))
        .all(conn)
        .await
        .context("Failed to load classrooms for students")?;

    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}
