//! 仓储层
//!
//! 每类实体一个窄接口，`BackendClient` 负责实现；
//! 向导与业务规则只依赖这些 trait，测试时可替换为内存实现

pub mod audit_logs;
pub mod catalogue;
pub mod import_sessions;
pub mod materials;
pub mod questions;
pub mod storage;
pub mod users;

pub use audit_logs::AuditLogRepository;
pub use catalogue::CatalogueRepository;
pub use import_sessions::ImportSessionRepository;
pub use materials::{store_material, MaterialRepository, MaterialRows, MATERIALS_BUCKET, THUMBNAILS_BUCKET};
pub use questions::QuestionRepository;
pub use storage::ObjectStore;
pub use users::UserRepository;
