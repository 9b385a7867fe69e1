//! SeaORM Entity for tags table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::channel_tags::Entity")]
    ChannelTags,
}

impl Related<super::channel_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChannelTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
