use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{posts, sites, system_logs};

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, Role};
pub use repositories::post::PostStatus;
pub use repositories::site::SiteStatus;

pub use system_logs::Model as SystemLog;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn site_repo(&self) -> repositories::site::SiteRepository {
        repositories::site::SiteRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // -- accounts --

    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        credits: i64,
        site_limit: i32,
        security: &SecurityConfig,
    ) -> Result<Account> {
        self.account_repo()
            .create(email, password, credits, site_limit, security)
            .await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list().await
    }

    pub async fn verify_account_password(&self, email: &str, password: &str) -> Result<bool> {
        self.account_repo().verify_password(email, password).await
    }

    pub async fn update_account_password(
        &self,
        email: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.account_repo()
            .update_password(email, new_password, security)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<Account>> {
        self.account_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_account_api_key(&self, email: &str) -> Result<String> {
        self.account_repo().regenerate_api_key(email).await
    }

    pub async fn set_account_role(&self, id: i32, role: Role) -> Result<bool> {
        self.account_repo().set_role(id, role).await
    }

    pub async fn set_account_credits(&self, id: i32, credits: i64) -> Result<bool> {
        self.account_repo().set_credits(id, credits).await
    }

    pub async fn set_account_site_limit(&self, id: i32, site_limit: i32) -> Result<bool> {
        self.account_repo().set_site_limit(id, site_limit).await
    }

    pub async fn account_credits(&self, id: i32) -> Result<Option<i64>> {
        self.account_repo().credits(id).await
    }

    pub async fn debit_account_credit(&self, id: i32) -> Result<bool> {
        self.account_repo().debit_credit(id).await
    }

    pub async fn delete_account(&self, id: i32) -> Result<bool> {
        self.account_repo().delete(id).await
    }

    // -- sites --

    pub async fn create_site(
        &self,
        owner_id: i32,
        slug: &str,
        title: &str,
        html: &str,
    ) -> Result<sites::Model> {
        self.site_repo().create(owner_id, slug, title, html).await
    }

    pub async fn get_site_by_slug(&self, slug: &str) -> Result<Option<sites::Model>> {
        self.site_repo().get_by_slug(slug).await
    }

    pub async fn get_site(&self, id: i32) -> Result<Option<sites::Model>> {
        self.site_repo().get_by_id(id).await
    }

    pub async fn list_sites_for_owner(&self, owner_id: i32) -> Result<Vec<sites::Model>> {
        self.site_repo().list_for_owner(owner_id).await
    }

    pub async fn list_all_sites(&self) -> Result<Vec<sites::Model>> {
        self.site_repo().list_all().await
    }

    pub async fn count_sites_for_owner(&self, owner_id: i32) -> Result<u64> {
        self.site_repo().count_for_owner(owner_id).await
    }

    pub async fn update_site_content(
        &self,
        id: i32,
        title: Option<&str>,
        html: Option<&str>,
    ) -> Result<()> {
        self.site_repo().update_content(id, title, html).await
    }

    pub async fn set_site_status(&self, id: i32, status: SiteStatus) -> Result<()> {
        self.site_repo().set_status(id, status).await
    }

    pub async fn set_site_monetization(
        &self,
        id: i32,
        enabled: bool,
        publisher_id: Option<&str>,
    ) -> Result<()> {
        self.site_repo()
            .set_monetization(id, enabled, publisher_id)
            .await
    }

    pub async fn increment_site_views(&self, id: i32) -> Result<()> {
        self.site_repo().increment_views(id).await
    }

    pub async fn monetized_publisher_ids(&self) -> Result<Vec<String>> {
        self.site_repo().monetized_publisher_ids().await
    }

    pub async fn delete_site(&self, id: i32) -> Result<bool> {
        self.site_repo().delete(id).await
    }

    // -- posts --

    pub async fn create_post(
        &self,
        author_id: i32,
        slug: &str,
        title: &str,
        html: &str,
        category: &str,
    ) -> Result<posts::Model> {
        self.post_repo()
            .create(author_id, slug, title, html, category)
            .await
    }

    pub async fn get_post_for_author(
        &self,
        author_id: i32,
        slug: &str,
    ) -> Result<Option<posts::Model>> {
        self.post_repo().get_for_author(author_id, slug).await
    }

    pub async fn list_posts_for_author(&self, author_id: i32) -> Result<Vec<posts::Model>> {
        self.post_repo().list_for_author(author_id).await
    }

    pub async fn list_active_posts(&self, category: Option<&str>) -> Result<Vec<posts::Model>> {
        self.post_repo().list_active(category).await
    }

    pub async fn update_post(
        &self,
        id: i32,
        title: Option<&str>,
        html: Option<&str>,
        category: Option<&str>,
        status: Option<PostStatus>,
    ) -> Result<()> {
        self.post_repo()
            .update(id, title, html, category, status)
            .await
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        self.post_repo().delete(id).await
    }

    // -- logs --

    pub async fn add_log(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        self.logs_repo().add(event_type, level, message, details).await
    }

    pub async fn get_logs(
        &self,
        page: u64,
        page_size: u64,
        level_filter: Option<String>,
        event_type_filter: Option<String>,
    ) -> Result<(Vec<SystemLog>, u64)> {
        self.logs_repo()
            .get_logs(page, page_size, level_filter, event_type_filter)
            .await
    }

    pub async fn clear_logs(&self) -> Result<()> {
        self.logs_repo().clear_logs().await
    }
}
