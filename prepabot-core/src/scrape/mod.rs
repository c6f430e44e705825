pub mod page;
pub mod registry;

pub use page::{MenuImages, MenuScraper};
pub use registry::PostedMenuRegistry;
