pub mod paper_loader;

pub use paper_loader::{list_paper_files, load_paper_file, parse_paper};
