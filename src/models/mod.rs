pub mod admin;
pub mod blob;
pub mod catalogue;
pub mod import_session;
pub mod loaders;
pub mod material;
pub mod paper;
pub mod question;

pub use admin::{AdminUser, AuditLogEntry, Invitation, NewInvitation, NewUser, Role};
pub use blob::FileBlob;
pub use catalogue::{Course, EduUnit, Subject};
pub use import_session::{ImportSession, ImportStatus, NewImportSession};
pub use loaders::{list_paper_files, load_paper_file};
pub use material::{Material, MaterialUpload, NewMaterial};
pub use paper::{PaperMetadata, PaperSection, ParsedPaperData};
pub use question::{Difficulty, QuestionType, ReviewQuestion};
