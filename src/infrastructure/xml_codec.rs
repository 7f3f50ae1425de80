//! XML parsing and serialization for webservice documents.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::domain::document::Element;
use crate::infrastructure::api_error::{ApiError, ApiResult};

/// Parse a response body into an element tree.
pub fn parse(xml: &str) -> ApiResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element_from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(ApiError::malformed_xml)?;
                append_text(&mut stack, &text);
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&bytes));
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ApiError::malformed_xml("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ApiError::malformed_xml(format!(
                    "error at position {}: {e}",
                    reader.error_position()
                )));
            }
            Ok(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(ApiError::malformed_xml("unclosed element at end of document"));
    }
    root.ok_or_else(|| ApiError::malformed_xml("empty document"))
}

/// Serialize a document with an XML declaration. Text goes out as CDATA so
/// HTML descriptions survive untouched.
pub fn serialize(document: &Element) -> ApiResult<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(ApiError::malformed_xml)?;
    write_element(&mut writer, document)?;
    String::from_utf8(writer.into_inner()).map_err(ApiError::malformed_xml)
}

fn element_from_start(start: &BytesStart<'_>) -> ApiResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(ApiError::malformed_xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(ApiError::malformed_xml)?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> ApiResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(ApiError::malformed_xml("more than one root element"))
    }
}

fn append_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> ApiResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer
        .write_event(Event::Start(start))
        .map_err(ApiError::malformed_xml)?;

    if let Some(text) = &element.text {
        let event = if text.contains("]]>") {
            Event::Text(BytesText::new(text))
        } else {
            Event::CData(BytesCData::new(text.as_str()))
        };
        writer.write_event(event).map_err(ApiError::malformed_xml)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(ApiError::malformed_xml)?;
    Ok(())
}
