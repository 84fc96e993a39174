use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A thumbnail height in pixels, shared between tiers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thumbnails")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tier_thumbnails::Entity")]
    TierThumbnails,
}

impl Related<super::tier_thumbnails::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TierThumbnails.def()
    }
}

impl Related<super::tiers::Entity> for Entity {
    fn to() -> RelationDef {
        super::tier_thumbnails::Relation::Tiers.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::tier_thumbnails::Relation::Thumbnails.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
