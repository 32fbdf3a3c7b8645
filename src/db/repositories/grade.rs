use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{classrooms, grades, prelude::*, students};

use super::attendance::classrooms_for;

#[derive(Debug, Clone)]
pub struct GradeRow {
    pub record: grades::Model,
    pub student: Option<students::Model>,
    pub classroom: Option<classrooms::Model>,
}

pub struct NewGrade {
    pub student_id: i32,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: f64,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct GradeChanges {
    pub student_id: Option<i32>,
    pub subject: Option<String>,
    pub term: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
}

pub struct GradeRepository {
    conn: DatabaseConnection,
}

impl GradeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, page: u64, page_size: u64) -> Result<(Vec<GradeRow>, u64)> {
        let paginator = Grades::find()
            .find_also_related(Students)
            .order_by_desc(grades::Column::RecordedAt)
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
                    GradeRow {
                        record,
                        student,
                        classroom,
                    }
                })
                .collect(),
            total_pages,
        ))
    }

    pub async fn get(&self, id: i32) -> Result<Option<GradeRow>> {
        let Some((record, student)) = Grades::find_by_id(id)
            .find_also_related(Students)
            .one(&self.conn)
            .await
            .context("Failed to query grade")?
        else {
            return Ok(None);
        };

        let classrooms = classrooms_for(&self.conn, student.iter()).await?;
        let classroom = student
            .as_ref()
            .and_then(|s| classrooms.get(&s.classroom_id).cloned());

        Ok(Some(GradeRow {
            record,
            student,
            classroom,
        }))
    }

    pub async fn create(&self, new: NewGrade) -> Result<grades::Model> {
        let model = grades::ActiveModel {
            student_id: Set(new.student_id),
            subject: Set(new.subject),
            term: Set(new.term),
            score: Set(new.score),
            max_score: Set(new.max_score),
            recorded_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(&self, id: i32, changes: GradeChanges) -> Result<Option<grades::Model>> {
        let Some(model) = Grades::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: grades::ActiveModel = model.into();
        if let Some(student_id) = changes.student_id {
            active.student_id = Set(student_id);
        }
        if let Some(subject) = changes.subject {
            active.subject = Set(subject);
        }
        if let Some(term) = changes.term {
            active.term = Set(term);
        }
        if let Some(score) = changes.score {
            active.score = Set(score);
        }
        if let Some(max_score) = changes.max_score {
            active.max_score = Set(max_score);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Grades::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
