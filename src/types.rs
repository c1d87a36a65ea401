//! Core data types for the pipeline.
//!
//! One OSM element becomes one [`Record`]: a tagged variant over node, way
//! and relation with a fixed attribute set per variant. Using a closed enum
//! instead of a free-form attribute map keeps key-presence checks out of the
//! shaping logic; a `Record` that exists is already schema-complete.

/// The three top-level element kinds of an OSM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// All three kinds, the default emission set for a full pass.
    pub const ALL: [ElementKind; 3] = [Self::Node, Self::Way, Self::Relation];

    /// Map an XML tag name to an element kind.
    #[must_use]
    pub fn from_tag_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }

    /// The XML tag name for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// Authorship metadata shared by all three record kinds.
///
/// Kept as text: the flat schema loads these columns without coercion, and
/// `version`/`changeset`/`uid` are opaque identifiers to this pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

/// A key/value attribute attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// One member of a relation: a roled, typed reference to another record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub reference: i64,
    pub role: String,
    pub member_type: String,
}

/// A point with a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub meta: Meta,
    pub tags: Vec<Tag>,
}

/// An ordered sequence of node references describing a line or area.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub meta: Meta,
    /// Member node ids in file order; this order is the way's geometry.
    pub node_refs: Vec<i64>,
    pub tags: Vec<Tag>,
}

/// A group of roled references to other records.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub meta: Meta,
    pub members: Vec<Member>,
    pub tags: Vec<Tag>,
}

/// One top-level map element.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Record {
    /// The element kind of this record.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
            Self::Relation(_) => ElementKind::Relation,
        }
    }

    /// The record's identity.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Node(n) => n.id,
            Self::Way(w) => w.id,
            Self::Relation(r) => r.id,
        }
    }

    /// The record's child attributes.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        match self {
            Self::Node(n) => &n.tags,
            Self::Way(w) => &w.tags,
            Self::Relation(r) => &r.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Meta {
        Meta {
            user: "glassman".to_string(),
            uid: "123".to_string(),
            version: "2".to_string(),
            changeset: "456".to_string(),
            timestamp: "2015-02-01T12:34:56Z".to_string(),
        }
    }

    #[test]
    fn test_element_kind_from_tag_name() {
        assert_eq!(ElementKind::from_tag_name(b"node"), Some(ElementKind::Node));
        assert_eq!(ElementKind::from_tag_name(b"way"), Some(ElementKind::Way));
        assert_eq!(
            ElementKind::from_tag_name(b"relation"),
            Some(ElementKind::Relation)
        );
        assert_eq!(ElementKind::from_tag_name(b"bounds"), None);
    }

    #[test]
    fn test_record_accessors() {
        let record = Record::Way(Way {
            id: 42,
            meta: meta(),
            node_refs: vec![1, 2, 3],
            tags: vec![Tag {
                key: "highway".to_string(),
                value: "residential".to_string(),
            }],
        });

        assert_eq!(record.kind(), ElementKind::Way);
        assert_eq!(record.id(), 42);
        assert_eq!(record.tags().len(), 1);
    }
}
