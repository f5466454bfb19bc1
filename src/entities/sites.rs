use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub owner_id: i32,

    #[sea_orm(unique)]
    pub slug: String,

    pub title: String,

    /// One of `draft`, `private`, `public`.
    pub status: String,

    /// Raw HTML/CSS payload served verbatim on the public route.
    #[sea_orm(column_type = "Text")]
    pub html: String,

    pub monetization_enabled: bool,

    /// Ad-network publisher id, required for the site to appear in ads.txt.
    pub publisher_id: Option<String>,

    pub views: i64,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
