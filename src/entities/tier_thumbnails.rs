use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tier_thumbnails")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tier_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub thumbnail_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tiers::Entity",
        from = "Column::TierId",
        to = "super::tiers::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Tiers,
    #[sea_orm(
        belongs_to = "super::thumbnails::Entity",
        from = "Column::ThumbnailId",
        to = "super::thumbnails::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Thumbnails,
}

impl Related<super::tiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tiers.def()
    }
}

impl Related<super::thumbnails::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thumbnails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
