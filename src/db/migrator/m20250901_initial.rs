use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key for the seeded account (rotate after first login)
const DEFAULT_API_KEY: &str = "registrar_default_api_key_please_regenerate";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Principals)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AdminProfiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Classrooms)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Students)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Attendance)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Grades)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(FeeStructures)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Payments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_classrooms_name_section ON classrooms(name, section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_students_roll_classroom ON students(roll_number, classroom_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_student_date ON attendance(student_id, date)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_grades_student_subject_term ON grades(student_id, subject, term)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_fee_structures_classroom_type ON fee_structures(classroom_id, fee_type)",
        )
        .await?;

        // Seed the bootstrap superuser and its linked profile (created_by
        // NULL reads back as "System").
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Principals)
            .columns([
                crate::entities::principals::Column::Username,
                crate::entities::principals::Column::Email,
                crate::entities::principals::Column::PasswordHash,
                crate::entities::principals::Column::FirstName,
                crate::entities::principals::Column::LastName,
                crate::entities::principals::Column::IsStaff,
                crate::entities::principals::Column::IsSuperuser,
                crate::entities::principals::Column::ApiKey,
                crate::entities::principals::Column::DateJoined,
            ])
            .values_panic([
                "admin".into(),
                "admin@school.local".into(),
                password_hash.into(),
                "Root".into(),
                "Admin".into(),
                true.into(),
                true.into(),
                DEFAULT_API_KEY.into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        conn.execute_unprepared(&format!(
            "INSERT INTO admin_profiles (principal_id, role, status, notes, created_by, created_at, updated_at) \
             SELECT id, 'super_admin', 'active', '', NULL, '{now}', '{now}' FROM principals WHERE username = 'admin'",
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeeStructures).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grades).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendance).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classrooms).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminProfiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Principals).to_owned())
            .await?;

        Ok(())
    }
}
