pub use super::accounts::Entity as Accounts;
pub use super::posts::Entity as Posts;
pub use super::sites::Entity as Sites;
pub use super::system_logs::Entity as SystemLogs;
