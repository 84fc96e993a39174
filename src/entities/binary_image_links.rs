use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A grayscale rendition reachable through its opaque `id` until
/// `created_at + exist_seconds`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "binary_image_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub file_key: String,
    pub exist_seconds: i32,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(i64::from(self.exist_seconds))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(created_at: DateTime<Utc>, exist_seconds: i32) -> Model {
        Model {
            id: "id".to_string(),
            user_id: "user".to_string(),
            file_key: "uploads/user/binary/x.png".to_string(),
            exist_seconds,
            created_at,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let t0 = Utc::now();
        let link = link(t0, 300);
        assert!(!link.is_expired_at(t0));
        assert!(!link.is_expired_at(t0 + Duration::seconds(299)));
        assert!(link.is_expired_at(t0 + Duration::seconds(300)));
        assert!(link.is_expired_at(t0 + Duration::seconds(301)));
    }
}
