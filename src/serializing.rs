//! Serializing documents back to XML
//!
//! The emitted event stream of [`crate::events`] is rendered through a
//! quick-xml writer. Prefixes come from the names' prefix hints; namespace
//! declarations come from the relativized scopes in the event stream, so an
//! element only declares what differs from its parent.

use crate::error::{Error, Result};
use crate::events::{document_events, element_events, XmlEvent};
use crate::nodes::{Document, Element};
use crate::scopes::NamespaceScope;
use crate::XMLNS_PREFIX;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize a document, including the XML declaration
pub fn serialize_document(document: &Document) -> Result<String> {
    let events = document_events(document);
    write_events(&events, true)
}

/// Serialize a bare element as a document fragment
pub fn serialize_element(element: &Element) -> Result<String> {
    let events = element_events(element, &NamespaceScope::empty());
    write_events(&events, false)
}

fn write_events(events: &[XmlEvent], with_declaration: bool) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    if with_declaration {
        write(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
    }

    // Prefix mappings announced before a start tag become xmlns attributes
    // on that tag.
    let mut pending_mappings: Vec<(String, String)> = Vec::new();

    for event in events {
        match event {
            XmlEvent::StartDocument { .. }
            | XmlEvent::EndDocument
            | XmlEvent::EndPrefixMapping { .. } => {}
            XmlEvent::StartPrefixMapping { prefix, namespace } => {
                pending_mappings.push((prefix.clone(), namespace.clone()));
            }
            XmlEvent::StartElement {
                local_name,
                prefix,
                attributes,
                ..
            } => {
                let tag = syntactic(prefix.as_deref(), local_name);
                let mut start = BytesStart::new(tag);
                for (mapping_prefix, namespace) in pending_mappings.drain(..) {
                    let attribute_name = if mapping_prefix.is_empty() {
                        XMLNS_PREFIX.to_string()
                    } else {
                        format!("{}:{}", XMLNS_PREFIX, mapping_prefix)
                    };
                    start.push_attribute((attribute_name.as_str(), namespace.as_str()));
                }
                for attribute in attributes {
                    let attribute_name =
                        syntactic(attribute.prefix.as_deref(), &attribute.local_name);
                    start.push_attribute((attribute_name.as_str(), attribute.value.as_str()));
                }
                write(&mut writer, Event::Start(start))?;
            }
            XmlEvent::EndElement {
                local_name, prefix, ..
            } => {
                let tag = syntactic(prefix.as_deref(), local_name);
                write(&mut writer, Event::End(BytesEnd::new(tag)))?;
            }
            XmlEvent::Characters { value, cdata } => {
                if *cdata {
                    write(&mut writer, Event::CData(BytesCData::new(value.as_str())))?;
                } else {
                    write(&mut writer, Event::Text(BytesText::new(value.as_str())))?;
                }
            }
            XmlEvent::Comment(value) => {
                write(
                    &mut writer,
                    Event::Comment(BytesText::from_escaped(value.as_str())),
                )?;
            }
            XmlEvent::ProcessingInstruction { target, data } => {
                // Written through the raw sink: PI content takes no escaping.
                let rendered = if data.is_empty() {
                    format!("<?{}?>", target)
                } else {
                    format!("<?{} {}?>", target, data)
                };
                writer.get_mut().extend_from_slice(rendered.as_bytes());
            }
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Parser(format!("serialized output is not UTF-8: {}", e)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Parser(format!("failed to write event: {}", e)))
}

fn syntactic(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local_name),
        None => local_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clark::default_eq;
    use crate::nodes::{Comment, Node, Text};
    use crate::parsing::parse_document;

    #[test]
    fn test_serialize_declares_namespaces_once() {
        let child = Element::builder("f").declare("", "N").build().unwrap();
        let root = Element::builder("e")
            .declare("", "N")
            .child(child)
            .build()
            .unwrap();

        let xml = serialize_element(&root).unwrap();
        assert_eq!(xml, r#"<e xmlns="N"><f></f></e>"#);
    }

    #[test]
    fn test_serialize_prefixed_names() {
        let root = Element::builder("p:e")
            .declare("p", "urn:p")
            .attribute("p:a", "v")
            .build()
            .unwrap();

        let xml = serialize_element(&root).unwrap();
        assert_eq!(xml, r#"<p:e xmlns:p="urn:p" p:a="v"></p:e>"#);
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let root = Element::builder("e")
            .attribute("a", "x < y & z")
            .text("a < b")
            .build()
            .unwrap();

        let xml = serialize_element(&root).unwrap();
        assert!(xml.contains("a &lt; b"));
        assert!(xml.contains("x &lt; y &amp; z"));
    }

    #[test]
    fn test_serialize_cdata_comment_pi() {
        let root = Element::builder("e")
            .child(Node::Text(Text::cdata("a < b")))
            .child(Node::Comment(Comment::new(" note ")))
            .child(Node::ProcessingInstruction(
                crate::nodes::ProcessingInstruction::new("target", "data"),
            ))
            .build()
            .unwrap();

        let xml = serialize_element(&root).unwrap();
        assert!(xml.contains("<![CDATA[a < b]]>"));
        assert!(xml.contains("<!-- note -->"));
        assert!(xml.contains("<?target data?>"));
    }

    #[test]
    fn test_serialize_document_has_declaration() {
        let document = Document::from_element(Element::builder("root").build().unwrap());
        let xml = serialize_document(&document).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("<root>"));
    }

    #[test]
    fn test_round_trip_through_serializer() {
        let original = parse_document(
            r#"<a:doc xmlns:a="urn:a" xmlns:b="urn:b" a:x="1"><b:item>text</b:item><plain/></a:doc>"#,
        )
        .unwrap();

        let xml = serialize_document(&original).unwrap();
        let reparsed = parse_document(&xml).unwrap();
        assert!(default_eq(
            original.document_element(),
            reparsed.document_element()
        ));
    }

    #[test]
    fn test_round_trip_default_namespace_undeclaration() {
        let original =
            parse_document(r#"<root xmlns="N"><inner xmlns=""><leaf/></inner></root>"#).unwrap();
        let xml = serialize_document(&original).unwrap();
        assert!(xml.contains(r#"<inner xmlns="">"#));

        let reparsed = parse_document(&xml).unwrap();
        assert!(default_eq(
            original.document_element(),
            reparsed.document_element()
        ));
    }
}
