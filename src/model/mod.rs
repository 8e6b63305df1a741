mod document;
mod resource_path;

pub use document::Document;
pub use resource_path::ResourcePath;
