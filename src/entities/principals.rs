use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "principals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    /// Permits administrative writes (classrooms, admin-users).
    pub is_staff: bool,

    /// Unrestricted visibility over admin profiles.
    pub is_superuser: bool,

    /// Random API key (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    pub date_joined: String,

    pub last_login: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::admin_profiles::Entity")]
    AdminProfiles,
}

impl Related<super::admin_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
