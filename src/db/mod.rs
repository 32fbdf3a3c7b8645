use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{attendance, classrooms, fee_structures, grades, payments, students};

pub mod migrator;
pub mod repositories;

pub use repositories::admin_profile::{
    AdminUserChanges, AdminUserRow, NewAdminUser, VisibilityScope,
};
pub use repositories::attendance::{AttendanceChanges, AttendanceRow, NewAttendance};
pub use repositories::classroom::ClassroomChanges;
pub use repositories::fee_structure::{FeeStructureChanges, NewFeeStructure};
pub use repositories::grade::{GradeChanges, GradeRow, NewGrade};
pub use repositories::payment::{NewPayment, PaymentChanges, PaymentRow};
pub use repositories::principal::Principal;
pub use repositories::student::{NewStudent, StudentChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn principal_repo(&self) -> repositories::principal::PrincipalRepository {
        repositories::principal::PrincipalRepository::new(self.conn.clone())
    }

    fn admin_profile_repo(&self) -> repositories::admin_profile::AdminProfileRepository {
        repositories::admin_profile::AdminProfileRepository::new(self.conn.clone())
    }

    fn classroom_repo(&self) -> repositories::classroom::ClassroomRepository {
        repositories::classroom::ClassroomRepository::new(self.conn.clone())
    }

    fn student_repo(&self) -> repositories::student::StudentRepository {
        repositories::student::StudentRepository::new(self.conn.clone())
    }

    fn attendance_repo(&self) -> repositories::attendance::AttendanceRepository {
        repositories::attendance::AttendanceRepository::new(self.conn.clone())
    }

    fn grade_repo(&self) -> repositories::grade::GradeRepository {
        repositories::grade::GradeRepository::new(self.conn.clone())
    }

    fn fee_structure_repo(&self) -> repositories::fee_structure::FeeStructureRepository {
        repositories::fee_structure::FeeStructureRepository::new(self.conn.clone())
    }

    fn payment_repo(&self) -> repositories::payment::PaymentRepository {
        repositories::payment::PaymentRepository::new(self.conn.clone())
    }

    // ---- principals ----

    pub async fn get_principal_by_username(&self, username: &str) -> Result<Option<Principal>> {
        self.principal_repo().get_by_username(username).await
    }

    pub async fn get_principal_by_id(&self, id: i32) -> Result<Option<Principal>> {
        self.principal_repo().get_by_id(id).await
    }

    pub async fn get_principal_by_api_key(&self, api_key: &str) -> Result<Option<Principal>> {
        self.principal_repo().get_by_api_key(api_key).await
    }

    pub async fn verify_principal_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool> {
        self.principal_repo().verify_password(username, password).await
    }

    pub async fn update_principal_password(
        &self,
        username: &str,
        new_password: &str,
        config: Option<&SecurityConfig>,
    ) -> Result<()> {
        self.principal_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        self.principal_repo().touch_last_login(id).await
    }

    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        self.principal_repo().regenerate_api_key(username).await
    }

    // ---- admin profiles ----

    pub async fn list_admin_users(&self, scope: VisibilityScope) -> Result<Vec<AdminUserRow>> {
        self.admin_profile_repo().list(scope).await
    }

    pub async fn get_admin_user(
        &self,
        id: i32,
        scope: VisibilityScope,
    ) -> Result<Option<AdminUserRow>> {
        self.admin_profile_repo().get(id, scope).await
    }

    pub async fn create_admin_user(
        &self,
        new: NewAdminUser,
        created_by: Option<i32>,
    ) -> Result<i32> {
        self.admin_profile_repo().create(new, created_by).await
    }

    pub async fn update_admin_user(&self, id: i32, changes: AdminUserChanges) -> Result<bool> {
        self.admin_profile_repo().update(id, changes).await
    }

    pub async fn delete_admin_user(&self, id: i32) -> Result<bool> {
        self.admin_profile_repo().delete(id).await
    }

    // ---- classrooms ----

    pub async fn list_classrooms(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<classrooms::Model>, u64)> {
        self.classroom_repo().list(page, page_size).await
    }

    pub async fn get_classroom(&self, id: i32) -> Result<Option<classrooms::Model>> {
        self.classroom_repo().get(id).await
    }

    pub async fn create_classroom(
        &self,
        name: String,
        section: String,
    ) -> Result<classrooms::Model> {
        self.classroom_repo().create(name, section).await
    }

    pub async fn update_classroom(
        &self,
        id: i32,
        changes: ClassroomChanges,
    ) -> Result<Option<classrooms::Model>> {
        self.classroom_repo().update(id, changes).await
    }

    pub async fn delete_classroom(&self, id: i32) -> Result<bool> {
        self.classroom_repo().delete(id).await
    }

    // ---- students ----

    pub async fn list_students(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<(students::Model, Option<classrooms::Model>)>, u64)> {
        self.student_repo().list(page, page_size).await
    }

    pub async fn get_student(
        &self,
        id: i32,
    ) -> Result<Option<(students::Model, Option<classrooms::Model>)>> {
        self.student_repo().get(id).await
    }

    pub async fn create_student(&self, new: NewStudent) -> Result<students::Model> {
        self.student_repo().create(new).await
    }

    pub async fn update_student(
        &self,
        id: i32,
        changes: StudentChanges,
    ) -> Result<Option<students::Model>> {
        self.student_repo().update(id, changes).await
    }

    pub async fn delete_student(&self, id: i32) -> Result<bool> {
        self.student_repo().delete(id).await
    }

    // ---- attendance ----

    pub async fn list_attendance(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<AttendanceRow>, u64)> {
        self.attendance_repo().list(page, page_size).await
    }

    pub async fn get_attendance(&self, id: i32) -> Result<Option<AttendanceRow>> {
        self.attendance_repo().get(id).await
    }

    pub async fn create_attendance(&self, new: NewAttendance) -> Result<attendance::Model> {
        self.attendance_repo().create(new).await
    }

    pub async fn update_attendance(
        &self,
        id: i32,
        changes: AttendanceChanges,
    ) -> Result<Option<attendance::Model>> {
        self.attendance_repo().update(id, changes).await
    }

    pub async fn delete_attendance(&self, id: i32) -> Result<bool> {
        self.attendance_repo().delete(id).await
    }

    // ---- grades ----

    pub async fn list_grades(&self, page: u64, page_size: u64) -> Result<(Vec<GradeRow>, u64)> {
        self.grade_repo().list(page, page_size).await
    }

    pub async fn get_grade(&self, id: i32) -> Result<Option<GradeRow>> {
        self.grade_repo().get(id).await
    }

    pub async fn create_grade(&self, new: NewGrade) -> Result<grades::Model> {
        self.grade_repo().create(new).await
    }

    pub async fn update_grade(
        &self,
        id: i32,
        changes: GradeChanges,
    ) -> Result<Option<grades::Model>> {
        self.grade_repo().update(id, changes).await
    }

    pub async fn delete_grade(&self, id: i32) -> Result<bool> {
        self.grade_repo().delete(id).await
    }

    // ---- fee structures ----

    pub async fn list_fee_structures(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<(fee_structures::Model, Option<classrooms::Model>)>, u64)> {
        self.fee_structure_repo().list(page, page_size).await
    }

    pub async fn get_fee_structure(
        &self,
        id: i32,
    ) -> Result<Option<(fee_structures::Model, Option<classrooms::Model>)>> {
        self.fee_structure_repo().get(id).await
    }

    pub async fn create_fee_structure(
        &self,
        new: NewFeeStructure,
    ) -> Result<fee_structures::Model> {
        self.fee_structure_repo().create(new).await
    }

    pub async fn update_fee_structure(
        &self,
        id: i32,
        changes: FeeStructureChanges,
    ) -> Result<Option<fee_structures::Model>> {
        self.fee_structure_repo().update(id, changes).await
    }

    pub async fn delete_fee_structure(&self, id: i32) -> Result<bool> {
        self.fee_structure_repo().delete(id).await
    }

    // ---- payments ----

    pub async fn list_payments(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PaymentRow>, u64)> {
        self.payment_repo().list(page, page_size).await
    }

    pub async fn get_payment(&self, id: i32) -> Result<Option<PaymentRow>> {
        self.payment_repo().get(id).await
    }

    pub async fn create_payment(&self, new: NewPayment) -> Result<payments::Model> {
        self.payment_repo().create(new).await
    }

    pub async fn update_payment(
        &self,
        id: i32,
        changes: PaymentChanges,
    ) -> Result<Option<payments::Model>> {
        self.payment_repo().update(id, changes).await
    }

    pub async fn delete_payment(&self, id: i32) -> Result<bool> {
        self.payment_repo().delete(id).await
    }

    // ---- counts (system status) ----

    pub async fn count_classrooms(&self) -> Result<u64> {
        Ok(crate::entities::prelude::Classrooms::find()
            .count(&self.conn)
            .await?)
    }

    pub async fn count_students(&self) -> Result<u64> {
        Ok(crate::entities::prelude::Students::find()
            .count(&self.conn)
            .await?)
    }

    pub async fn count_admin_users(&self) -> Result<u64> {
        Ok(crate::entities::prelude::AdminProfiles::find()
            .count(&self.conn)
            .await?)
    }

    pub async fn count_payments(&self) -> Result<u64> {
        Ok(crate::entities::prelude::Payments::find()
            .count(&self.conn)
            .await?)
    }
}
