use serde::{Deserialize, Serialize};

use crate::db::{AttendanceRow, GradeRow, PaymentRow};
use crate::entities::{attendance, classrooms, fee_structures, grades, payments, students};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// One page of a collection listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    50
}

#[derive(Debug, Serialize, Clone)]
pub struct ClassroomDto {
    pub id: i32,
    pub name: String,
    pub section: String,
}

impl From<classrooms::Model> for ClassroomDto {
    fn from(model: classrooms::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            section: model.section,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct StudentDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub roll_number: String,
    pub classroom: i32,
    pub classroom_detail: Option<ClassroomDto>,
    pub guardian_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

impl StudentDto {
    #[must_use]
    pub fn from_parts(model: students::Model, classroom: Option<classrooms::Model>) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            date_of_birth: model.date_of_birth,
            roll_number: model.roll_number,
            classroom: model.classroom_id,
            classroom_detail: classroom.map(ClassroomDto::from),
            guardian_name: model.guardian_name,
            contact_phone: model.contact_phone,
            contact_email: model.contact_email,
            address: model.address,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceDto {
    pub id: i32,
    pub student: i32,
    pub student_detail: Option<StudentDto>,
    pub date: String,
    pub status: String,
    pub notes: String,
}

impl From<AttendanceRow> for AttendanceDto {
    fn from(row: AttendanceRow) -> Self {
        let student_detail = row
            .student
            .map(|s| StudentDto::from_parts(s, row.classroom));
        Self {
            id: row.record.id,
            student: row.record.student_id,
            student_detail,
            date: row.record.date,
            status: row.record.status,
            notes: row.record.notes,
        }
    }
}

impl AttendanceDto {
    #[must_use]
    pub fn from_model(model: attendance::Model) -> Self {
        Self {
            id: model.id,
            student: model.student_id,
            student_detail: None,
            date: model.date,
            status: model.status,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GradeDto {
    pub id: i32,
    pub student: i32,
    pub student_detail: Option<StudentDto>,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: f64,
    pub recorded_at: String,
}

impl From<GradeRow> for GradeDto {
    fn from(row: GradeRow) -> Self {
        let student_detail = row
            .student
            .map(|s| StudentDto::from_parts(s, row.classroom));
        Self {
            id: row.record.id,
            student: row.record.student_id,
            student_detail,
            subject: row.record.subject,
            term: row.record.term,
            score: row.record.score,
            max_score: row.record.max_score,
            recorded_at: row.record.recorded_at,
        }
    }
}

impl GradeDto {
    #[must_use]
    pub fn from_model(model: grades::Model) -> Self {
        Self {
            id: model.id,
            student: model.student_id,
            student_detail: None,
            subject: model.subject,
            term: model.term,
            score: model.score,
            max_score: model.max_score,
            recorded_at: model.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeeStructureDto {
    pub id: i32,
    pub classroom: i32,
    pub classroom_detail: Option<ClassroomDto>,
    pub fee_type: String,
    pub amount: f64,
    pub frequency: String,
    pub description: String,
}

impl FeeStructureDto {
    #[must_use]
    pub fn from_parts(
        model: fee_structures::Model,
        classroom: Option<classrooms::Model>,
    ) -> Self {
        Self {
            id: model.id,
            classroom: model.classroom_id,
            classroom_detail: classroom.map(ClassroomDto::from),
            fee_type: model.fee_type,
            amount: model.amount,
            frequency: model.frequency,
            description: model.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentDto {
    pub id: i32,
    pub student: i32,
    pub student_detail: Option<StudentDto>,
    pub student_full_name: Option<String>,
    pub fee_type: String,
    pub total_fee: f64,
    pub total_paid: f64,
    pub balance: f64,
    pub payment_date: String,
    pub due_date: Option<String>,
    pub payment_method: String,
    pub receipt_number: String,
    pub notes: String,
    pub is_overdue: bool,
    pub created_at: String,
}

impl From<PaymentRow> for PaymentDto {
    fn from(row: PaymentRow) -> Self {
        let student_detail = row
            .student
            .map(|s| StudentDto::from_parts(s, row.classroom));
        let student_full_name = student_detail.as_ref().map(StudentDto::full_name);
        Self::from_model_with_student(row.record, student_detail, student_full_name)
    }
}

impl PaymentDto {
    #[must_use]
    pub fn from_model(model: payments::Model) -> Self {
        Self::from_model_with_student(model, None, None)
    }

    fn from_model_with_student(
        model: payments::Model,
        student_detail: Option<StudentDto>,
        student_full_name: Option<String>,
    ) -> Self {
        let balance = model.total_fee - model.total_paid;
        let is_overdue = payment_is_overdue(model.due_date.as_deref(), balance);
        Self {
            id: model.id,
            student: model.student_id,
            student_detail,
            student_full_name,
            fee_type: model.fee_type,
            total_fee: model.total_fee,
            total_paid: model.total_paid,
            balance,
            payment_date: model.payment_date,
            due_date: model.due_date,
            payment_method: model.payment_method,
            receipt_number: model.receipt_number,
            notes: model.notes,
            is_overdue,
            created_at: model.created_at,
        }
    }
}

/// A payment is overdue when its due date has passed and money is still owed.
#[must_use]
pub fn payment_is_overdue(due_date: Option<&str>, balance: f64) -> bool {
    let Some(due) = due_date else {
        return false;
    };
    let Ok(due) = chrono::NaiveDate::parse_from_str(due, "%Y-%m-%d") else {
        return false;
    };
    due < chrono::Utc::now().date_naive() && balance > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_requires_past_due_date_and_balance() {
        assert!(payment_is_overdue(Some("2000-01-01"), 50.0));
        assert!(!payment_is_overdue(Some("2000-01-01"), 0.0));
        assert!(!payment_is_overdue(Some("2999-12-31"), 50.0));
        assert!(!payment_is_overdue(None, 50.0));
    }

    #[test]
    fn test_overdue_ignores_unparseable_dates() {
        assert!(!payment_is_overdue(Some("not-a-date"), 50.0));
    }
}
