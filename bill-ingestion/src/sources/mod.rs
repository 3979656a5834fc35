pub mod html_bill_dir;
pub mod json_array_file;

pub use html_bill_dir::HtmlBillDirSource;
pub use json_array_file::JsonArrayFileSource;
