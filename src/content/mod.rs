//! Content module - resolves posts from the content source and derives
//! their display values

pub mod enrich;
pub mod navigation;
mod post;
pub mod resolver;

pub use enrich::{edited_info, estimate_read_time};
pub use navigation::NavigationResolver;
pub use post::{
    Banner, ContentSection, EditedInfo, NavPost, NavigationLinks, Post, PostData, RichTextBlock,
};
pub use resolver::PostResolver;
