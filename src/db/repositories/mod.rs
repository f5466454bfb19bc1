pub mod account;
pub mod logs;
pub mod post;
pub mod site;
