pub mod models;
pub mod pagination;
