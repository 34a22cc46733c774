pub mod file_name;
pub mod size_format;
