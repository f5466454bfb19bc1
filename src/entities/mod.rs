pub mod prelude;

pub mod accounts;
pub mod posts;
pub mod sites;
pub mod system_logs;
