use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: i32,

    pub fee_type: String,

    pub total_fee: f64,

    pub total_paid: f64,

    /// ISO date (YYYY-MM-DD)
    pub payment_date: String,

    pub due_date: Option<String>,

    /// One of `cash`, `card`, `credit_card`, `bank_transfer`, `check`,
    /// `online`, `other`.
    pub payment_method: String,

    pub receipt_number: String,

    pub notes: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
