pub mod notice;
pub mod user_service;
pub mod warn_writer;

pub use notice::{Notice, NoticeLevel};
pub use user_service::UserAdminService;
pub use warn_writer::WarnWriter;
