pub mod page_inspector;

pub use page_inspector::{FrameDocument, PageInspector};
