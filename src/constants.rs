pub const SESSION_ACCOUNT_KEY: &str = "account";

pub mod ads {
    /// Every authorized-seller line uses this fixed tail after the publisher id.
    pub const SELLER_LINE_SUFFIX: &str = "DIRECT, f08c47fec0942fa0";

    pub const SELLER_DOMAIN: &str = "google.com";

    pub const CACHE_TTL_SECONDS: u64 = 3600;
}

pub mod plan {

    pub const DEFAULT_CREDITS: i64 = 25;

    pub const DEFAULT_SITE_LIMIT: i32 = 3;
}

pub mod limits {

    pub const MAX_SLUG_LEN: usize = 64;

    pub const MAX_HTML_BYTES: usize = 512 * 1024;

    pub const DEFAULT_LOG_PAGE_SIZE: u64 = 50;
}
