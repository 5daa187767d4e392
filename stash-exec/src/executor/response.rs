use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;
use stash_core::types::ResponseFormat;

/// File extension for a response body: the lowercased media subtype, or `txt`.
pub fn extension_for(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|main| main.trim().split_once('/'))
        .map(|(_, sub)| sub.trim().to_ascii_lowercase())
        .filter(|sub| !sub.is_empty())
        .unwrap_or_else(|| "txt".to_string())
}

fn media_type(content_type: Option<&str>) -> Option<String> {
    let main = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    (!main.is_empty()).then_some(main)
}

/// Re-formats a JSON or XML body per the effective `Response` settings.
/// Anything that fails to parse is returned unchanged.
pub fn format_body(text: String, content_type: Option<&str>, format: Option<&ResponseFormat>) -> String {
    let Some(format) = format.filter(|f| f.pretty()) else {
        return text;
    };
    let Some(media) = media_type(content_type) else {
        return text;
    };
    let formatted = if media.ends_with("/json") {
        format_json(&text, format.sort())
    } else if media == "application/xml" || media == "text/xml" || media.ends_with("+xml") {
        format_xml(&text, format.sort())
    } else {
        None
    };
    formatted.unwrap_or(text)
}

pub fn format_json(text: &str, sort: bool) -> Option<String> {
    let mut value: Value = serde_json::from_str(text).ok()?;
    if sort {
        sort_json(&mut value);
    }
    let mut out = serde_json::to_string_pretty(&value).ok()?;
    out.push('\n');
    Some(out)
}

fn sort_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (k, mut v) in entries {
                sort_json(&mut v);
                map.insert(k, v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_json),
        _ => {}
    }
}

enum Node {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text(String),
    CData(String),
    /// Declarations, comments and processing instructions, kept verbatim.
    Raw(Event<'static>),
}

impl Node {
    fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn parse_xml(text: &str) -> Option<Vec<Node>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    fn push(stack: &mut [Node], top: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(Node::Element { children, .. }) => children.push(node),
            _ => top.push(node),
        }
    }

    fn element(start: &BytesStart<'_>) -> Option<Node> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.ok()?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().ok()?.into_owned();
            attrs.push((key, value));
        }
        Some(Node::Element {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    loop {
        match reader.read_event().ok()? {
            Event::Start(start) => stack.push(element(&start)?),
            Event::Empty(start) => {
                let node = element(&start)?;
                push(&mut stack, &mut top, node);
            }
            Event::End(_) => {
                let node = stack.pop()?;
                push(&mut stack, &mut top, node);
            }
            Event::Text(t) => {
                let text = t.unescape().ok()?.into_owned();
                if !text.is_empty() {
                    push(&mut stack, &mut top, Node::Text(text));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                push(&mut stack, &mut top, Node::CData(text));
            }
            Event::Eof => break,
            other => push(&mut stack, &mut top, Node::Raw(other.into_owned())),
        }
    }

    let has_root = top.iter().any(|n| n.tag().is_some());
    (stack.is_empty() && has_root).then_some(top)
}

fn sort_xml(node: &mut Node) {
    if let Node::Element { attrs, children, .. } = node {
        attrs.sort_by(|a, b| a.0.cmp(&b.0));
        children.iter_mut().for_each(sort_xml);
        let (mut elements, others): (Vec<Node>, Vec<Node>) =
            std::mem::take(children).into_iter().partition(|c| c.tag().is_some());
        elements.sort_by(|a, b| a.tag().cmp(&b.tag()));
        children.extend(elements);
        children.extend(others);
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Option<()> {
    match node {
        Node::Element {
            name,
            attrs,
            children,
        } => {
            let start = BytesStart::new(name.as_str())
                .with_attributes(attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            if children.is_empty() {
                writer.write_event(Event::Empty(start)).ok()?;
            } else {
                writer.write_event(Event::Start(start)).ok()?;
                for child in children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(name.as_str()))).ok()?;
            }
        }
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text))).ok()?,
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))).ok()?,
        Node::Raw(event) => writer.write_event(event.borrow()).ok()?,
    }
    Some(())
}

pub fn format_xml(text: &str, sort: bool) -> Option<String> {
    let mut nodes = parse_xml(text)?;
    if sort {
        nodes.iter_mut().for_each(sort_xml);
    }
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    for node in &nodes {
        write_node(&mut writer, node)?;
    }
    let mut out = String::from_utf8(writer.into_inner()).ok()?;
    out.push('\n');
    Some(out)
}
