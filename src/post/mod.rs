//! Blog post model and the codecs that move it between the editable
//! document format and the RPC representation.

pub mod categories;
pub mod date;
pub mod document;

pub use categories::{reconcile, Category};
pub use date::{display_to_wire, parse_display, parse_wire, wire_to_display, WireTimestamp};
pub use document::{decode, encode, PostDocument};

/// Ordered, lower-cased category names as typed in a document.
///
/// The first entry is the primary category.
pub type CategoryList = Vec<String>;

/// A post as exchanged with the server.
///
/// Every field is optional: a field the document never mentioned stays
/// `None` so the server keeps (or applies) its own value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRecord {
    pub title: Option<String>,
    pub date_created: Option<WireTimestamp>,
    /// 0 = none, 1 = open, 2 = closed.
    pub allow_comments: Option<u8>,
    pub allow_pings: Option<i32>,
    /// Kept as typed; `0`/`1` or the key of an installed text filter.
    pub convert_breaks: Option<String>,
    pub keywords: Option<String>,
    pub ping_urls: Vec<String>,
    pub post_id: Option<String>,
    pub description: Option<String>,
    pub text_more: Option<String>,
    pub excerpt: Option<String>,
}

/// A category attached to an existing post, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCategory {
    pub name: String,
    pub primary: bool,
}

impl PostCategory {
    /// Mark the first name of a decoded category list as primary.
    pub fn from_names(names: &[String]) -> Vec<PostCategory> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| PostCategory {
                name: name.clone(),
                primary: index == 0,
            })
            .collect()
    }
}
