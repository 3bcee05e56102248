use log::warn;
use minidom::Element;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::errors::AxmlError;
use crate::structs::{
    ResChunkHeader, ResourceType, ResourceValueType, StringPool, XMLHeader, XMLResourceMap,
    XmlCData, XmlElement, XmlEndElement, XmlNamespace, XmlStartElement,
};

/// Sentinel used throughout the binary XML format for "no value here":
/// absent namespace, absent raw-text attribute value, end-of-list marker.
const NIL: u32 = 0xFFFF_FFFF;

enum XmlNode {
    StartNamespace(XmlNamespace),
    EndNamespace(XmlNamespace),
    StartElement(XmlStartElement),
    EndElement(XmlEndElement),
    CData(XmlCData),
    Unknown,
}

/// The namespace stack described in §4.5: a mapping from URI-ref to
/// prefix-ref that supports nested identical keys. `pending` accumulates
/// bindings opened since the last start-element, to be flushed as
/// `xmlns:*` declarations on the next one.
#[derive(Default)]
struct NamespaceStack {
    bindings: Vec<(u32, u32)>,
    pending: Vec<(u32, u32)>,
}

impl NamespaceStack {
    fn open(&mut self, uri: u32, prefix: u32) {
        self.bindings.push((uri, prefix));
        self.pending.push((uri, prefix));
    }

    fn close(&mut self, uri: u32) {
        if let Some(pos) = self.bindings.iter().rposition(|&(u, _)| u == uri) {
            self.bindings.remove(pos);
        }
    }

    fn prefix_for(&self, uri: u32) -> Option<u32> {
        self.bindings
            .iter()
            .rev()
            .find(|&&(u, _)| u == uri)
            .map(|&(_, p)| p)
    }

    fn flush_pending(&mut self) -> Vec<(u32, u32)> {
        std::mem::take(&mut self.pending)
    }
}

/// A decoded binary XML document (e.g. `AndroidManifest.xml`).
///
/// Decoding is a two-stage process per §4.5: a namespace-stack walk over
/// the chunk stream produces a textual XML byte stream, which is then
/// parsed with a standard XML reader to give callers a queryable tree.
pub struct AxmlDocument {
    xml: String,
    root: Element,
}

impl AxmlDocument {
    pub fn parse(input: &mut &[u8]) -> Result<AxmlDocument, AxmlError> {
        if input.len() < ResChunkHeader::size_of() {
            return Err(AxmlError::Truncated {
                declared: ResChunkHeader::size_of() as u32,
                available: input.len(),
            });
        }

        let available = input.len();
        let header = ResChunkHeader::parse(input).map_err(|_| AxmlError::BadHeader("RES_XML chunk header"))?;

        if header.type_ != ResourceType::Xml {
            warn!("chunk type is not RES_XML, continuing anyway");
        }

        if header.header_size as usize != ResChunkHeader::size_of() {
            return Err(AxmlError::BadHeader("RES_XML header_size must be 8"));
        }

        let consumed = available - input.len();
        let body_len = (header.size as usize).saturating_sub(consumed);
        let Some((mut body, rest)) = input.split_at_checked(body_len) else {
            return Err(AxmlError::Truncated {
                declared: header.size,
                available: input.len() + consumed,
            });
        };
        *input = rest;

        let string_pool = StringPool::parse(&mut body).map_err(|_| AxmlError::BadUtf8)?;

        // Ignored semantically; parsed only to advance past it.
        let _ = XMLResourceMap::parse(&mut body);

        let nodes = Self::parse_tree(&mut body);
        let xml = Self::emit(&nodes, &string_pool);

        let root: Element = xml.parse().map_err(|_| AxmlError::MissingRoot)?;

        Ok(AxmlDocument { xml, root })
    }

    fn parse_tree(input: &mut &[u8]) -> Vec<XmlNode> {
        let mut nodes = Vec::new();

        loop {
            let chunk_header = match ResChunkHeader::parse(input) {
                Ok(v) => v,
                Err(ErrMode::Backtrack(_)) => return nodes,
                Err(_) => return nodes,
            };

            if chunk_header.type_ < ResourceType::XmlStartNamespace
                || chunk_header.type_ > ResourceType::XmlLastChunk
            {
                let _ = take::<u32, &[u8], ContextError>(chunk_header.content_size())
                    .parse_next(input);
                continue;
            }

            if chunk_header.header_size != 0x10 {
                let _ = take::<u32, &[u8], ContextError>(chunk_header.content_size())
                    .parse_next(input);
                continue;
            }

            let xml_header = match XMLHeader::parse(input, chunk_header) {
                Ok(v) => v,
                Err(_) => return nodes,
            };

            let node = match xml_header.header.type_ {
                ResourceType::XmlStartNamespace => XmlNamespace::parse(input, xml_header)
                    .map(XmlNode::StartNamespace),
                ResourceType::XmlEndNamespace => {
                    XmlNamespace::parse(input, xml_header).map(XmlNode::EndNamespace)
                }
                ResourceType::XmlStartElement => {
                    XmlStartElement::parse(input, xml_header).map(XmlNode::StartElement)
                }
                ResourceType::XmlEndElement => {
                    XmlEndElement::parse(input, xml_header).map(XmlNode::EndElement)
                }
                ResourceType::XmlCdata => XmlCData::parse(input, xml_header).map(XmlNode::CData),
                _ => Ok(XmlNode::Unknown),
            };

            match node {
                Ok(node) => nodes.push(node),
                Err(_) => return nodes,
            }
        }
    }

    fn emit(nodes: &[XmlNode], strings: &StringPool) -> String {
        let mut out = String::new();
        let mut ns = NamespaceStack::default();

        let string_at = |idx: u32| -> String { strings.get(idx).cloned().unwrap_or_default() };

        let qualify = |ns_uri: u32, name_idx: u32, ns: &NamespaceStack| -> String {
            if ns_uri == NIL {
                return string_at(name_idx);
            }
            match ns.prefix_for(ns_uri) {
                Some(prefix_idx) => format!("{}:{}", string_at(prefix_idx), string_at(name_idx)),
                None => string_at(name_idx),
            }
        };

        for node in nodes {
            match node {
                XmlNode::StartNamespace(n) => ns.open(n.uri, n.prefix),
                XmlNode::EndNamespace(n) => ns.close(n.uri),
                XmlNode::StartElement(e) => {
                    out.push('<');
                    out.push_str(&qualify(e.namespace_uri, e.name, &ns));

                    for (uri, prefix) in ns.flush_pending() {
                        out.push_str(&format!(
                            " xmlns:{}=\"{}\"",
                            string_at(prefix),
                            escape_attr(&string_at(uri))
                        ));
                    }

                    for attribute in &e.attributes {
                        let name = qualify(attribute.namespace_uri, attribute.name, &ns);
                        let value = derive_attribute_value(attribute.value, &attribute.typed_value, strings);
                        out.push(' ');
                        out.push_str(&name);
                        out.push_str("=\"");
                        out.push_str(&escape_attr(&value));
                        out.push('"');
                    }

                    out.push('>');
                }
                XmlNode::EndElement(e) => {
                    out.push_str("</");
                    out.push_str(&qualify(e.namespace_uri, e.name, &ns));
                    out.push('>');
                }
                XmlNode::CData(c) => {
                    out.push_str(&escape_text(&string_at(c.data)));
                }
                XmlNode::Unknown => {}
            }
        }

        out
    }

    /// The decoded document as a byte stream (§4.5 emission contract).
    pub fn get_xml_string(&self) -> &str {
        &self.xml
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn get_attribute_value(&self, tag: &str, name: &str) -> Option<&str> {
        if self.root.name() == tag {
            return self.root.attr(name);
        }

        self.root
            .children()
            .find(|x| x.name() == tag)
            .and_then(|x| x.attr(name))
    }

    pub fn get_all_attribute_values<'a>(
        &'a self,
        tag: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let mut stack = vec![&self.root];

        std::iter::from_fn(move || {
            while let Some(elem) = stack.pop() {
                for child in elem.children() {
                    stack.push(child);
                }

                if elem.name() == tag {
                    for (attr_name, attr_value) in elem.attrs() {
                        if attr_name == name {
                            return Some(attr_value);
                        }
                    }
                }
            }
            None
        })
    }

    /// Activities (or activity-aliases) declared with an intent-filter matching
    /// `android.intent.action.MAIN` plus `LAUNCHER`/`INFO`.
    pub fn get_main_activities(&self) -> impl Iterator<Item = &str> {
        self.root
            .children()
            .filter(|c| c.name() == "application")
            .flat_map(|app| app.children())
            .filter_map(|activity| {
                let tag = activity.name();
                if (tag != "activity" && tag != "activity-alias")
                    || activity.attr("enabled") == Some("false")
                {
                    return None;
                }

                let has_matching_intent = activity.children().any(|intent_filter| {
                    if intent_filter.name() != "intent-filter" {
                        return false;
                    }

                    let mut has_main = false;
                    let mut has_launcher = false;

                    for child in intent_filter.children() {
                        match child.name() {
                            "action"
                                if child.attr("name") == Some("android.intent.action.MAIN") =>
                            {
                                has_main = true;
                            }
                            "category"
                                if matches!(
                                    child.attr("name"),
                                    Some("android.intent.category.LAUNCHER")
                                        | Some("android.intent.category.INFO")
                                ) =>
                            {
                                has_launcher = true;
                            }
                            _ => {}
                        }

                        if has_main && has_launcher {
                            return true;
                        }
                    }

                    false
                });

                if has_matching_intent {
                    return activity.attr("name");
                }
                None
            })
    }
}

/// Attribute value derivation (§4.5): prefer the raw pool string, else
/// project the typed value. Note this fallback differs from resource-table
/// projection (§4.3): any type without an explicit rule here renders as a
/// resource reference rather than raw data.
fn derive_attribute_value(
    raw_value: u32,
    typed: &crate::structs::ResourceValue,
    strings: &StringPool,
) -> String {
    if raw_value != NIL
        && let Some(s) = strings.get(raw_value)
    {
        return s.clone();
    }

    match typed.data_type {
        ResourceValueType::Null => String::new(),
        ResourceValueType::Reference => format!("@0x{:08X}", typed.data),
        ResourceValueType::Dec => typed.data.to_string(),
        ResourceValueType::Hex => format!("0x{:08X}", typed.data),
        ResourceValueType::Boolean => {
            if typed.data != 0 {
                "true".to_owned()
            } else {
                "false".to_owned()
            }
        }
        _ => format!("@0x{:08X}", typed.data),
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{ResourceValue, XmlAttributeElement};

    fn utf8_string_pool(strings: &[&str]) -> StringPool {
        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for s in strings {
            offsets.push(body.len() as u32);
            body.push(s.chars().count() as u8); // UTF-16 char count
            body.push(s.len() as u8); // UTF-8 byte count
            body.extend_from_slice(s.as_bytes());
            body.push(0);
        }
        let strings_start = 28 + offsets.len() as u32 * 4;
        let size = strings_start + body.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&28u16.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0x100u32.to_le_bytes()); // UTF8 flag
        out.extend_from_slice(&strings_start.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for off in offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&body);

        StringPool::parse(&mut out.as_slice()).expect("valid pool")
    }

    fn blank_xml_header() -> XMLHeader {
        XMLHeader {
            header: ResChunkHeader {
                type_: ResourceType::XmlStartElement,
                header_size: 0x10,
                size: 0,
            },
            line_number: 0,
            comment: NIL,
        }
    }

    #[test]
    fn namespace_stack_restores_exactly_on_close() {
        let mut ns = NamespaceStack::default();
        ns.open(1, 10);
        assert_eq!(ns.prefix_for(1), Some(10));

        // A nested binding for the same URI shadows the outer one.
        ns.open(1, 20);
        assert_eq!(ns.prefix_for(1), Some(20));

        ns.close(1);
        assert_eq!(ns.prefix_for(1), Some(10));

        ns.close(1);
        assert_eq!(ns.prefix_for(1), None);
    }

    #[test]
    fn namespace_stack_flush_pending_drains_once() {
        let mut ns = NamespaceStack::default();
        ns.open(1, 10);
        ns.open(2, 20);
        assert_eq!(ns.flush_pending(), vec![(1, 10), (2, 20)]);
        assert!(ns.flush_pending().is_empty());

        ns.open(3, 30);
        assert_eq!(ns.flush_pending(), vec![(3, 30)]);
    }

    // §8 boundary F: a start-namespace binding "android" followed by a
    // <manifest> start element carrying a namespaced, typed attribute emits
    // the xmlns declaration inline on that element and renders the typed
    // value per its data type rather than falling back to a reference.
    #[test]
    fn emit_renders_namespace_declaration_and_typed_attribute() {
        let strings = utf8_string_pool(&[
            "android",
            "http://schemas.android.com/apk/res/android",
            "manifest",
            "versionCode",
        ]);

        let nodes = vec![
            XmlNode::StartNamespace(XmlNamespace {
                header: blank_xml_header(),
                prefix: 0,
                uri: 1,
            }),
            XmlNode::StartElement(XmlStartElement {
                header: blank_xml_header(),
                namespace_uri: NIL,
                name: 2,
                attribute_start: 0x14,
                attribute_size: 0x14,
                attribute_count: 1,
                id_index: 0,
                class_index: 0,
                style_index: 0,
                attributes: vec![XmlAttributeElement {
                    namespace_uri: 1,
                    name: 3,
                    value: NIL,
                    typed_value: ResourceValue {
                        size: 8,
                        res: 0,
                        data_type: ResourceValueType::Dec,
                        data: 1,
                    },
                }],
            }),
            XmlNode::EndElement(XmlEndElement {
                header: blank_xml_header(),
                namespace_uri: NIL,
                name: 2,
            }),
            XmlNode::EndNamespace(XmlNamespace {
                header: blank_xml_header(),
                prefix: 0,
                uri: 1,
            }),
        ];

        let xml = AxmlDocument::emit(&nodes, &strings);
        assert_eq!(
            xml,
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" android:versionCode=\"1\"></manifest>"
        );
    }

    #[test]
    fn derive_attribute_value_prefers_raw_pool_string() {
        let strings = utf8_string_pool(&["hello"]);
        let typed = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Dec,
            data: 99,
        };
        assert_eq!(derive_attribute_value(0, &typed, &strings), "hello");
    }

    #[test]
    fn derive_attribute_value_projects_by_type_when_raw_is_nil() {
        let strings = utf8_string_pool(&[]);

        let null = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Null,
            data: 0,
        };
        assert_eq!(derive_attribute_value(NIL, &null, &strings), "");

        let reference = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Reference,
            data: 0x7f010000,
        };
        assert_eq!(
            derive_attribute_value(NIL, &reference, &strings),
            "@0x7F010000"
        );

        let dec = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Dec,
            data: 1,
        };
        assert_eq!(derive_attribute_value(NIL, &dec, &strings), "1");

        let hex = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Hex,
            data: 0x2a,
        };
        assert_eq!(derive_attribute_value(NIL, &hex, &strings), "0x0000002A");

        let yes = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Boolean,
            data: 1,
        };
        assert_eq!(derive_attribute_value(NIL, &yes, &strings), "true");

        let no = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::Boolean,
            data: 0,
        };
        assert_eq!(derive_attribute_value(NIL, &no, &strings), "false");

        // Any other type without an explicit rule falls back to a reference.
        let color = ResourceValue {
            size: 8,
            res: 0,
            data_type: ResourceValueType::ColorRgb8,
            data: 0xff0000,
        };
        assert_eq!(
            derive_attribute_value(NIL, &color, &strings),
            "@0x00FF0000"
        );
    }

    #[test]
    fn escape_attr_escapes_quotes_and_angle_brackets() {
        assert_eq!(
            escape_attr("a & b <c> \"d\""),
            "a &amp; b &lt;c&gt; &quot;d&quot;"
        );
    }

    #[test]
    fn escape_text_leaves_quotes_untouched() {
        assert_eq!(escape_text("a & b <c> \"d\""), "a &amp; b &lt;c&gt; \"d\"");
    }
}
