//! Streaming element reader.
//!
//! [`ElementReader`] iterates the top-level elements of an OSM XML file with
//! quick-xml's pull API, yielding one typed [`Record`] at a time in file
//! order. The sequence is lazy, finite and non-restartable; internal buffers
//! are reused between elements, so peak memory is bounded by the largest
//! single element rather than the file size. A multi-gigabyte metro export
//! streams through in constant memory.
//!
//! [`write_sample`] is the companion spot-checking tool: it copies every k-th
//! top-level element verbatim into a smaller file wrapped in the same `<osm>`
//! container.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::error::{Result, TidyError};
use crate::types::{ElementKind, Member, Meta, Node, Record, Relation, Tag, Way};

/// Owned attribute list of one XML element.
struct AttrMap(Vec<(String, String)>);

impl AttrMap {
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Collect an element's attributes into owned strings.
fn collect_attrs(event: &BytesStart<'_>) -> Result<AttrMap> {
    let mut out = Vec::new();
    for attr in event.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(AttrMap(out))
}

/// Child elements accumulated while reading one record's subtree.
#[derive(Default)]
struct Children {
    tags: Vec<Tag>,
    node_refs: Vec<i64>,
    members: Vec<Member>,
}

/// Outcome of one pull step at the top level.
enum Step {
    Eof,
    Ignore,
    SkipSubtree(ElementKind),
    Open(ElementKind, AttrMap),
    Complete(ElementKind, AttrMap),
    Fail(TidyError),
}

/// Lazy iterator over the top-level records of an OSM XML stream.
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    child_buf: Vec<u8>,
    kinds: Vec<ElementKind>,
    done: bool,
}

impl ElementReader<BufReader<File>> {
    /// Open a file and emit all three record kinds.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_kinds(path, &ElementKind::ALL)
    }

    /// Open a file and emit only the given record kinds.
    pub fn from_path_with_kinds(path: &Path, kinds: &[ElementKind]) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), kinds))
    }
}

impl<R: BufRead> ElementReader<R> {
    /// Wrap an already-open XML stream.
    pub fn new(inner: R, kinds: &[ElementKind]) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            child_buf: Vec::new(),
            kinds: kinds.to_vec(),
            done: false,
        }
    }

    /// Skip a top-level element we were asked not to emit.
    fn skip_subtree(&mut self, kind: ElementKind) -> Result<()> {
        let name = kind.as_str().as_bytes().to_vec();
        self.child_buf.clear();
        self.reader
            .read_to_end_into(QName(&name), &mut self.child_buf)?;
        Ok(())
    }

    /// Read one record's children up to its closing tag.
    fn read_children(&mut self, kind: ElementKind, parent_id: &str) -> Result<Children> {
        let mut children = Children::default();

        loop {
            self.child_buf.clear();
            let parsed = match self.reader.read_event_into(&mut self.child_buf) {
                Err(e) => return Err(e.into()),
                Ok(Event::Eof) => {
                    return Err(TidyError::Xml(quick_xml::Error::UnexpectedEof(format!(
                        "inside <{}> {}",
                        kind.as_str(),
                        parent_id
                    ))))
                }
                Ok(Event::End(e)) if e.name().as_ref() == kind.as_str().as_bytes() => break,
                Ok(Event::Start(e)) => {
                    Some((e.name().as_ref().to_vec(), collect_attrs(&e)?, true))
                }
                Ok(Event::Empty(e)) => {
                    Some((e.name().as_ref().to_vec(), collect_attrs(&e)?, false))
                }
                Ok(_) => None,
            };

            let Some((name, attrs, has_subtree)) = parsed else {
                continue;
            };

            match name.as_slice() {
                b"tag" => children.tags.push(Tag {
                    key: required(&attrs, "tag", parent_id, "k")?.to_string(),
                    value: required(&attrs, "tag", parent_id, "v")?.to_string(),
                }),
                b"nd" => children
                    .node_refs
                    .push(parse_attr("nd", "ref", required(&attrs, "nd", parent_id, "ref")?)?),
                b"member" => children.members.push(Member {
                    reference: parse_attr(
                        "member",
                        "ref",
                        required(&attrs, "member", parent_id, "ref")?,
                    )?,
                    role: required(&attrs, "member", parent_id, "role")?.to_string(),
                    member_type: required(&attrs, "member", parent_id, "type")?.to_string(),
                }),
                _ => {}
            }

            if has_subtree {
                self.buf.clear();
                self.reader.read_to_end_into(QName(&name), &mut self.buf)?;
            }
        }

        Ok(children)
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let step = match self.reader.read_event_into(&mut self.buf) {
                Err(e) => Step::Fail(e.into()),
                Ok(Event::Eof) => Step::Eof,
                // Field access keeps the borrow disjoint from the event
                // still holding self.buf.
                Ok(Event::Start(e)) => match ElementKind::from_tag_name(e.name().as_ref()) {
                    Some(kind) if self.kinds.contains(&kind) => match collect_attrs(&e) {
                        Ok(attrs) => Step::Open(kind, attrs),
                        Err(err) => Step::Fail(err),
                    },
                    Some(kind) => Step::SkipSubtree(kind),
                    None => Step::Ignore,
                },
                Ok(Event::Empty(e)) => match ElementKind::from_tag_name(e.name().as_ref()) {
                    Some(kind) if self.kinds.contains(&kind) => match collect_attrs(&e) {
                        Ok(attrs) => Step::Complete(kind, attrs),
                        Err(err) => Step::Fail(err),
                    },
                    _ => Step::Ignore,
                },
                Ok(_) => Step::Ignore,
            };

            match step {
                Step::Eof => {
                    self.done = true;
                    return None;
                }
                Step::Ignore => {}
                Step::Fail(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Step::SkipSubtree(kind) => {
                    if let Err(err) = self.skip_subtree(kind) {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                Step::Open(kind, attrs) => {
                    let id_text = attrs.get("id").unwrap_or("?").to_string();
                    let result = self
                        .read_children(kind, &id_text)
                        .and_then(|children| build_record(kind, &attrs, children));
                    if result.is_err() {
                        self.done = true;
                    }
                    return Some(result);
                }
                Step::Complete(kind, attrs) => {
                    let result = build_record(kind, &attrs, Children::default());
                    if result.is_err() {
                        self.done = true;
                    }
                    return Some(result);
                }
            }
        }
    }
}

/// Look up a required attribute, failing with the record's identity.
fn required<'a>(
    attrs: &'a AttrMap,
    kind: &'static str,
    id: &str,
    attribute: &'static str,
) -> Result<&'a str> {
    attrs.get(attribute).ok_or_else(|| TidyError::MissingAttribute {
        kind,
        id: id.to_string(),
        attribute,
    })
}

/// Parse a required attribute value as a number.
fn parse_attr<T: std::str::FromStr>(
    kind: &'static str,
    attribute: &'static str,
    value: &str,
) -> Result<T> {
    value.parse().map_err(|_| TidyError::InvalidAttribute {
        kind,
        attribute,
        value: value.to_string(),
    })
}

/// Assemble a typed record, enforcing the destination schema.
///
/// Identity, coordinates and authorship are invariants of valid input;
/// absence means a corrupt source record, not a normal hole.
fn build_record(kind: ElementKind, attrs: &AttrMap, children: Children) -> Result<Record> {
    let kind_name = kind.as_str();
    let id_text = attrs.get("id").unwrap_or("?").to_string();
    let id: i64 = parse_attr(kind_name, "id", required(attrs, kind_name, &id_text, "id")?)?;

    let meta = Meta {
        user: required(attrs, kind_name, &id_text, "user")?.to_string(),
        uid: required(attrs, kind_name, &id_text, "uid")?.to_string(),
        version: required(attrs, kind_name, &id_text, "version")?.to_string(),
        changeset: required(attrs, kind_name, &id_text, "changeset")?.to_string(),
        timestamp: required(attrs, kind_name, &id_text, "timestamp")?.to_string(),
    };

    let record = match kind {
        ElementKind::Node => Record::Node(Node {
            id,
            lat: parse_attr(kind_name, "lat", required(attrs, kind_name, &id_text, "lat")?)?,
            lon: parse_attr(kind_name, "lon", required(attrs, kind_name, &id_text, "lon")?)?,
            meta,
            tags: children.tags,
        }),
        ElementKind::Way => Record::Way(Way {
            id,
            meta,
            node_refs: children.node_refs,
            tags: children.tags,
        }),
        ElementKind::Relation => Record::Relation(Relation {
            id,
            meta,
            members: children.members,
            tags: children.tags,
        }),
    };

    Ok(record)
}

/// Counts from one sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSummary {
    /// Top-level elements seen in the input.
    pub scanned: usize,
    /// Elements copied to the output.
    pub kept: usize,
}

/// Copy every k-th top-level element of `input` verbatim into `output`,
/// wrapped in the same `<osm>` container markup.
///
/// Streams both sides; memory use is bounded by one element regardless of
/// input size.
pub fn write_sample(input: &Path, output: &Path, k: usize) -> Result<SampleSummary> {
    if k == 0 {
        return Err(TidyError::InvalidSampleInterval(k));
    }

    let mut reader = Reader::from_reader(BufReader::new(File::open(input)?));
    reader.trim_text(true);

    let mut writer = Writer::new_with_indent(BufWriter::new(File::create(output)?), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("osm")))?;

    let mut buf = Vec::new();
    let mut scanned = 0usize;
    let mut kept = 0usize;
    // Depth inside the current top-level record; 0 between records.
    let mut record_depth = 0usize;
    let mut copying = false;

    loop {
        buf.clear();
        let ev = reader.read_event_into(&mut buf)?;

        let copy = match &ev {
            Event::Eof => break,
            Event::Start(e) => {
                if record_depth == 0 {
                    if ElementKind::from_tag_name(e.name().as_ref()).is_some() {
                        copying = scanned % k == 0;
                        scanned += 1;
                        record_depth = 1;
                        if copying {
                            kept += 1;
                        }
                        copying
                    } else {
                        false
                    }
                } else {
                    record_depth += 1;
                    copying
                }
            }
            Event::Empty(e) => {
                if record_depth == 0 {
                    if ElementKind::from_tag_name(e.name().as_ref()).is_some() {
                        let copy = scanned % k == 0;
                        scanned += 1;
                        if copy {
                            kept += 1;
                        }
                        copy
                    } else {
                        false
                    }
                } else {
                    copying
                }
            }
            Event::End(_) => {
                if record_depth > 0 {
                    let copy = copying;
                    record_depth -= 1;
                    if record_depth == 0 {
                        copying = false;
                    }
                    copy
                } else {
                    false
                }
            }
            _ => record_depth > 0 && copying,
        };

        if copy {
            writer.write_event(ev)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    writer.into_inner().flush()?;

    Ok(SampleSummary { scanned, kept })
}
