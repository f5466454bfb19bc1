use serde::{Deserialize, Serialize};

use crate::db::{Account, SystemLog};
use crate::entities::{posts, sites};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: i32,
    pub email: String,
    pub role: String,
    pub credits: i64,
    pub site_limit: i32,
    pub last_used_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            role: account.role.as_str().to_string(),
            credits: account.credits,
            site_limit: account.site_limit,
            last_used_at: account.last_used_at,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SiteDto {
    pub id: i32,
    pub owner_id: i32,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub html: String,
    pub monetization_enabled: bool,
    pub publisher_id: Option<String>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<sites::Model> for SiteDto {
    fn from(site: sites::Model) -> Self {
        Self {
            id: site.id,
            owner_id: site.owner_id,
            slug: site.slug,
            title: site.title,
            status: site.status,
            html: site.html,
            monetization_enabled: site.monetization_enabled,
            publisher_id: site.publisher_id,
            views: site.views,
            created_at: site.created_at,
            updated_at: site.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i32,
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub html: String,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<posts::Model> for PostDto {
    fn from(post: posts::Model) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            slug: post.slug,
            title: post.title,
            status: post.status,
            html: post.html,
            category: post.category,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub html: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSiteRequest {
    pub title: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetMonetizationRequest {
    pub enabled: bool,
    pub publisher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub html: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub html: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCreditsRequest {
    pub credits: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetSiteLimitRequest {
    pub site_limit: i32,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub accounts: usize,
    pub sites: usize,
    pub public_sites: usize,
    pub posts: usize,
}

#[derive(Debug, Serialize)]
pub struct LogDto {
    pub id: i64,
    pub event_type: String,
    pub level: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl From<SystemLog> for LogDto {
    fn from(model: SystemLog) -> Self {
        Self {
            id: model.id,
            event_type: model.event_type,
            level: model.level,
            message: model.message,
            details: model.details,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub logs: Vec<LogDto>,
    pub total_pages: u64,
}
