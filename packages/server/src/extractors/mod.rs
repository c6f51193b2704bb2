pub mod auth;
pub mod json;
pub mod work_id;
