use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::posts;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Active,
}

impl PostStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
        }
    }
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        author_id: i32,
        slug: &str,
        title: &str,
        html: &str,
        category: &str,
    ) -> Result<posts::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = posts::ActiveModel {
            author_id: Set(author_id),
            slug: Set(slug.to_string()),
            title: Set(title.to_string()),
            status: Set(PostStatus::Draft.as_str().to_string()),
            html: Set(html.to_string()),
            category: Set(category.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert post")
    }

    pub async fn get_for_author(&self, author_id: i32, slug: &str) -> Result<Option<posts::Model>> {
        posts::Entity::find()
            .filter(posts::Column::AuthorId.eq(author_id))
            .filter(posts::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query post by slug")
    }

    pub async fn list_for_author(&self, author_id: i32) -> Result<Vec<posts::Model>> {
        posts::Entity::find()
            .filter(posts::Column::AuthorId.eq(author_id))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list posts for author")
    }

    /// Published posts, newest first, optionally narrowed to one category.
    pub async fn list_active(&self, category: Option<&str>) -> Result<Vec<posts::Model>> {
        let mut query = posts::Entity::find()
            .filter(posts::Column::Status.eq(PostStatus::Active.as_str()))
            .order_by_desc(posts::Column::CreatedAt);

        if let Some(category) = category {
            query = query.filter(posts::Column::Category.eq(category));
        }

        query.all(&self.conn).await.context("Failed to list active posts")
    }

    pub async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        html: Option<&str>,
        category: Option<&str>,
        status: Option<PostStatus>,
    ) -> Result<()> {
        let post = posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post {id} not found"))?;

        let mut active: posts::ActiveModel = post.into();
        if let Some(title) = title {
            active.title = Set(title.to_string());
        }
        if let Some(html) = html {
            active.html = Set(html.to_string());
        }
        if let Some(category) = category {
            active.category = Set(category.to_string());
        }
        if let Some(status) = status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected == 1)
    }
}
