//! Parsing XML into documents
//!
//! A quick-xml reader loop that translates byte streams into the event
//! protocol of [`crate::events`] and feeds a [`TreeBuilder`]. Namespace
//! declarations are recognized here as `xmlns`/`xmlns:p` attributes and
//! forwarded as prefix-mapping events; all name resolution happens in the
//! sink, against the scope in force.

use crate::error::{Error, Result};
use crate::events::{EventAttribute, TreeBuilder, WhitespacePolicy, XmlEvent};
use crate::nodes::Document;
use crate::XMLNS_PREFIX;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use url::Url;

/// Options for [`parse_document_with`]
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Inter-element whitespace handling
    pub whitespace: WhitespacePolicy,
    /// Base URI recorded on the resulting document
    pub base_uri: Option<Url>,
}

/// Parse an XML document from a string
pub fn parse_document(xml: &str) -> Result<Document> {
    parse_document_with(xml.as_bytes(), ParseOptions::default())
}

/// Parse an XML document from bytes
pub fn parse_document_bytes(xml: &[u8]) -> Result<Document> {
    parse_document_with(xml, ParseOptions::default())
}

/// Parse an XML document with explicit options
pub fn parse_document_with(xml: &[u8], options: ParseOptions) -> Result<Document> {
    let mut reader = Reader::from_reader(xml);
    let mut builder = TreeBuilder::with_policy(options.whitespace);
    builder.push(XmlEvent::StartDocument {
        base_uri: options.base_uri,
    })?;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                push_start(&mut builder, &e)?;
            }
            Ok(Event::Empty(e)) => {
                push_start(&mut builder, &e)?;
                let (prefix, local_name) = split_tag_name(e.name().as_ref())?;
                builder.push(XmlEvent::EndElement {
                    namespace: None,
                    local_name,
                    prefix,
                })?;
            }
            Ok(Event::End(e)) => {
                let (prefix, local_name) = split_tag_name(e.name().as_ref())?;
                builder.push(XmlEvent::EndElement {
                    namespace: None,
                    local_name,
                    prefix,
                })?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Parser(format!("failed to unescape text: {}", e)))?;
                builder.push(XmlEvent::Characters {
                    value: text.to_string(),
                    cdata: false,
                })?;
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8(e.into_inner().into_owned())
                    .map_err(|e| Error::Parser(format!("CDATA is not UTF-8: {}", e)))?;
                builder.push(XmlEvent::Characters {
                    value: text,
                    cdata: true,
                })?;
            }
            Ok(Event::Comment(e)) => {
                let text = String::from_utf8(e.to_vec())
                    .map_err(|e| Error::Parser(format!("comment is not UTF-8: {}", e)))?;
                builder.push(XmlEvent::Comment(text))?;
            }
            Ok(Event::PI(e)) => {
                let content = String::from_utf8(e.to_vec())
                    .map_err(|e| Error::Parser(format!("PI is not UTF-8: {}", e)))?;
                let (target, data) = match content.split_once(char::is_whitespace) {
                    Some((target, data)) => (target.to_string(), data.trim_start().to_string()),
                    None => (content, String::new()),
                };
                builder.push(XmlEvent::ProcessingInstruction { target, data })?;
            }
            Ok(Event::Decl(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Parser(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    builder.push(XmlEvent::EndDocument)?;
    builder.finish()
}

/// Forward prefix mappings and the start-element event for one start tag
fn push_start(builder: &mut TreeBuilder, start: &BytesStart) -> Result<()> {
    let mut attributes = Vec::new();

    for attr_result in start.attributes() {
        let attr =
            attr_result.map_err(|e| Error::Parser(format!("failed to parse attribute: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Parser(format!("attribute name is not UTF-8: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parser(format!("failed to unescape attribute value: {}", e)))?
            .to_string();

        if key == XMLNS_PREFIX {
            builder.push(XmlEvent::StartPrefixMapping {
                prefix: String::new(),
                namespace: value,
            })?;
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            builder.push(XmlEvent::StartPrefixMapping {
                prefix: prefix.to_string(),
                namespace: value,
            })?;
        } else {
            let (prefix, local_name) = match key.split_once(':') {
                Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
                None => (None, key.to_string()),
            };
            attributes.push(EventAttribute {
                namespace: None,
                local_name,
                prefix,
                value,
            });
        }
    }

    let (prefix, local_name) = split_tag_name(start.name().as_ref())?;
    builder.push(XmlEvent::StartElement {
        namespace: None,
        local_name,
        prefix,
        attributes,
    })
}

fn split_tag_name(raw: &[u8]) -> Result<(Option<String>, String)> {
    let name = std::str::from_utf8(raw)
        .map_err(|e| Error::Parser(format!("element name is not UTF-8: {}", e)))?;
    match name.split_once(':') {
        Some((prefix, local)) => Ok((Some(prefix.to_string()), local.to_string())),
        None => Ok((None, name.to_string())),
    }
}
