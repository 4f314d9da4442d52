//! Predicate-based document queries
//!
//! Mirrors the subset of the Prismic query language the blog needs:
//! `at` predicates, pagination (`pageSize`, `page`, `after`) and orderings.

use std::fmt;

/// Document type field
pub const DOCUMENT_TYPE: &str = "document.type";

/// Document id field
pub const DOCUMENT_ID: &str = "document.id";

/// First publication timestamp, the canonical ordering for posts
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";

/// Last publication timestamp
pub const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

/// A query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match of a field against a value
    At { path: String, value: String },
}

impl Predicate {
    /// Build an `at` predicate
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Predicate matching the document with the given uid within a type
    pub fn uid(doc_type: &str, uid: impl Into<String>) -> Self {
        Predicate::at(format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, escaped)
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering on a named field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{}", self.field),
            Direction::Desc => write!(f, "{} desc", self.field),
        }
    }
}

/// A document query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
}

impl Query {
    /// Create a query with a single predicate
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            ..Default::default()
        }
    }

    /// Query all documents of a type
    pub fn by_type(doc_type: &str) -> Self {
        Self::new(Predicate::at(DOCUMENT_TYPE, doc_type))
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Only return documents that come after the given document id
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orderings.push(Ordering {
            field: field.into(),
            direction,
        });
        self
    }

    /// Value of the `q` parameter, e.g. `[[at(document.type, "posts")]]`
    pub fn q_param(&self) -> String {
        let inner: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", inner)
    }

    /// Value of the `orderings` parameter, if any ordering is set
    pub fn orderings_param(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }
        let fields: Vec<String> = self.orderings.iter().map(|o| o.to_string()).collect();
        Some(format!("[{}]", fields.join(",")))
    }
}
