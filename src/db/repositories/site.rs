use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::sites;

/// Publication state of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Draft,
    Private,
    Public,
}

impl SiteStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "private" => Some(Self::Private),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

pub struct SiteRepository {
    conn: DatabaseConnection,
}

impl SiteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        owner_id: i32,
        slug: &str,
        title: &str,
        html: &str,
    ) -> Result<sites::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = sites::ActiveModel {
            owner_id: Set(owner_id),
            slug: Set(slug.to_string()),
            title: Set(title.to_string()),
            status: Set(SiteStatus::Draft.as_str().to_string()),
            html: Set(html.to_string()),
            monetization_enabled: Set(false),
            publisher_id: Set(None),
            views: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert site")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<sites::Model>> {
        sites::Entity::find()
            .filter(sites::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query site by slug")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<sites::Model>> {
        sites::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query site by ID")
    }

    pub async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<sites::Model>> {
        sites::Entity::find()
            .filter(sites::Column::OwnerId.eq(owner_id))
            .order_by_asc(sites::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list sites for owner")
    }

    pub async fn list_all(&self) -> Result<Vec<sites::Model>> {
        sites::Entity::find()
            .order_by_asc(sites::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list sites")
    }

    pub async fn count_for_owner(&self, owner_id: i32) -> Result<u64> {
        sites::Entity::find()
            .filter(sites::Column::OwnerId.eq(owner_id))
            .count(&self.conn)
            .await
            .context("Failed to count sites for owner")
    }

    pub async fn update_content(
        &self,
        id: i32,
        title: Option<&str>,
        html: Option<&str>,
    ) -> Result<()> {
        let site = sites::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Site {id} not found"))?;

        let mut active: sites::ActiveModel = site.into();
        if let Some(title) = title {
            active.title = Set(title.to_string());
        }
        if let Some(html) = html {
            active.html = Set(html.to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_status(&self, id: i32, status: SiteStatus) -> Result<()> {
        let site = sites::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Site {id} not found"))?;

        let mut active: sites::ActiveModel = site.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_monetization(
        &self,
        id: i32,
        enabled: bool,
        publisher_id: Option<&str>,
    ) -> Result<()> {
        let site = sites::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Site {id} not found"))?;

        let mut active: sites::ActiveModel = site.into();
        active.monetization_enabled = Set(enabled);
        active.publisher_id = Set(publisher_id.map(ToString::to_string));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Bump the view counter in place; does not touch `updated_at` since a
    /// view is not an edit.
    pub async fn increment_views(&self, id: i32) -> Result<()> {
        sites::Entity::update_many()
            .col_expr(
                sites::Column::Views,
                Expr::col(sites::Column::Views).add(1),
            )
            .filter(sites::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to increment site views")?;

        Ok(())
    }

    /// Distinct publisher ids among monetized sites, for ads.txt.
    pub async fn monetized_publisher_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<Option<String>> = sites::Entity::find()
            .filter(sites::Column::MonetizationEnabled.eq(true))
            .filter(sites::Column::PublisherId.is_not_null())
            .select_only()
            .column(sites::Column::PublisherId)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query monetized publisher ids")?;

        Ok(rows.into_iter().flatten().collect())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = sites::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete site")?;

        Ok(result.rows_affected == 1)
    }
}
