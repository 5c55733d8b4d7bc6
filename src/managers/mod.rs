// Tagmark storage managers
// Managers own the SQL for one concern each: tags, bookmark-tag links, bookmark queries, accounts.

pub mod account_manager;
pub mod bookmark_manager;
pub mod bookmark_query;
pub mod link_manager;
pub mod tag_manager;
