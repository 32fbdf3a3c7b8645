use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One-to-one link to the authentication identity.
    #[sea_orm(unique)]
    pub principal_id: i32,

    /// One of `super_admin`, `admin`, `staff`.
    pub role: String,

    /// One of `active`, `inactive`, `suspended`.
    pub status: String,

    pub notes: String,

    /// Principal that provisioned this profile. NULL means "System"
    /// (seeded by migration). Written once at creation, never mutated.
    pub created_by: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::principals::Entity",
        from = "Column::PrincipalId",
        to = "super::principals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Principal,
    #[sea_orm(
        belongs_to = "super::principals::Entity",
        from = "Column::CreatedBy",
        to = "super::principals::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Creator,
}

impl Related<super::principals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Principal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
