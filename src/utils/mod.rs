pub mod line_patcher;
pub mod path_validator;

pub use line_patcher::{LinePatcher, PatchRule};
pub use path_validator::PathValidator;
