pub mod storage;
pub mod work_status;

pub use work_status::{ImageSource, WorkStatus};
