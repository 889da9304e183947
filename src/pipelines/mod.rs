pub mod cookbook;
pub mod document;

pub use self::cookbook::{assemble, find_recipe_files, read_cookbook};
pub use self::document::{apply_replacements, extract_title, DocumentParser};
