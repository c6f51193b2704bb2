pub mod blob_locks;
pub mod credentials;
pub mod work_id;
