//! SVG sanitizer for user-supplied hotbutton icons.
//!
//! Parsing is strict XML (`quick-xml`): the document must be well formed and
//! its root element must be `<svg>`. Active content is removed, colors are
//! stripped so the icon inherits `currentColor`, and the root is normalized to
//! a 24x24 box.

use std::fmt;
use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::dom::{escape_attr, escape_text};

/// Message shown to the user whenever an icon is rejected.
pub const INVALID_SVG_MESSAGE: &str = "Invalid SVG. Paste a full <svg>…</svg>.";

/// Elements removed together with their subtree.
const BLOCKED_TAGS: &[&str] = &["script", "iframe", "embed", "object", "foreignobject", "style"];

/// Presentation attributes removed from every element.
const COLOR_ATTRS: &[&str] = &["fill", "stroke", "color"];

const DEFAULT_EXTENT: f64 = 24.0;

/// Why an icon was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgError {
    /// Nothing but whitespace.
    Empty,
    /// Not well-formed XML.
    Malformed(String),
    /// Well formed, but the root is some other element.
    NotSvg(String),
}

impl SvgError {
    /// The text shown in the editor.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        INVALID_SVG_MESSAGE
    }
}

impl fmt::Display for SvgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "SVG input is empty"),
            Self::Malformed(reason) => write!(f, "SVG is not well-formed: {reason}"),
            Self::NotSvg(root) => write!(f, "Root element is <{root}>, expected <svg>"),
        }
    }
}

impl std::error::Error for SvgError {}

#[derive(Debug, Clone)]
enum SvgChild {
    Element(SvgElement),
    Text(String),
}

#[derive(Debug, Clone)]
struct SvgElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<SvgChild>,
}

impl SvgElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, SvgError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SvgError::Malformed(format!("attribute error: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| SvgError::Malformed(e.to_string()))?
                .to_string();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_attr(v));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                SvgChild::Element(el) => el.write(out),
                SvgChild::Text(t) => out.push_str(&escape_text(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn parse(raw: &str) -> Result<SvgElement, SvgError> {
    let mut reader = Reader::from_str(raw);
    let mut stack: Vec<SvgElement> = Vec::new();
    let mut root: Option<SvgElement> = None;

    let mut attach = |stack: &mut Vec<SvgElement>, el: SvgElement| -> Result<(), SvgError> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(SvgChild::Element(el));
        } else if root.is_none() {
            root = Some(el);
        } else {
            return Err(SvgError::Malformed("content after root element".into()));
        }
        Ok(())
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(SvgElement::from_start(e)?),
            Ok(Event::Empty(ref e)) => {
                let el = SvgElement::from_start(e)?;
                attach(&mut stack, el)?;
            }
            Ok(Event::End(ref e)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| SvgError::Malformed("unexpected closing tag".into()))?;
                if el.name.as_bytes() != e.name().as_ref() {
                    return Err(SvgError::Malformed(format!("mismatched </{}>", el.name)));
                }
                attach(&mut stack, el)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| SvgError::Malformed(err.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(SvgChild::Text(text.to_string())),
                    None if text.trim().is_empty() => {}
                    None => return Err(SvgError::Malformed("text outside root element".into())),
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    parent.children.push(SvgChild::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SvgError::Malformed(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            Ok(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(SvgError::Malformed("unclosed element".into()));
    }
    root.ok_or_else(|| SvgError::Malformed("no root element".into()))
}

fn color_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| Regex::new(r"(?i)^(fill|stroke|color)\s*:").expect("static pattern"))
}

fn number_prefix() -> &'static Regex {
    static NUM: OnceLock<Regex> = OnceLock::new();
    NUM.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static pattern")
    })
}

/// Leading numeric prefix of `value` (`"32px"` → 32); zero and garbage fall
/// back to 24.
fn extent(value: Option<&str>) -> f64 {
    value
        .and_then(|v| number_prefix().find(v))
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n != 0.0)
        .unwrap_or(DEFAULT_EXTENT)
}

/// Drops `fill`/`stroke`/`color` rules; `None` when nothing remains.
fn prune_style(style: &str) -> Option<String> {
    let kept: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|r| !r.is_empty() && !color_rule().is_match(r))
        .collect();
    (!kept.is_empty()).then(|| kept.join("; "))
}

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    compact.to_ascii_lowercase().starts_with("javascript:")
}

/// Lowercased name without its namespace prefix (`s:Script` → `script`).
fn local_name(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_ascii_lowercase()
}

fn scrub_attributes(el: &mut SvgElement) {
    el.attrs.retain(|(k, v)| {
        let key = local_name(k);
        if key.starts_with("on") || COLOR_ATTRS.contains(&key.as_str()) {
            return false;
        }
        !(key == "href" && is_script_url(v))
    });
    if let Some(style) = el.attr("style").map(str::to_string) {
        match prune_style(&style) {
            Some(pruned) => el.set_attr("style", &pruned),
            None => el.remove_attr("style"),
        }
    }
}

fn scrub(el: &mut SvgElement) {
    el.children.retain(|child| match child {
        SvgChild::Element(c) => !BLOCKED_TAGS.contains(&local_name(&c.name).as_str()),
        SvgChild::Text(_) => true,
    });
    for child in &mut el.children {
        if let SvgChild::Element(c) = child {
            scrub_attributes(c);
            scrub(c);
        }
    }
}

/// Validates and normalizes `raw`, returning the serialized icon.
///
/// # Errors
///
/// Returns [`SvgError`] when the input is empty, not well-formed, or not an
/// `<svg>` document.
pub fn sanitize_svg(raw: &str) -> Result<String, SvgError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SvgError::Empty);
    }
    let mut svg = parse(raw)?;
    if !svg.name.eq_ignore_ascii_case("svg") {
        return Err(SvgError::NotSvg(svg.name));
    }

    scrub(&mut svg);
    scrub_attributes(&mut svg);

    svg.set_attr("fill", "none");
    svg.set_attr("stroke", "currentColor");
    svg.set_attr("xmlns", "http://www.w3.org/2000/svg");
    if svg.attr("viewBox").is_none() {
        let w = extent(svg.attr("width"));
        let h = extent(svg.attr("height"));
        svg.set_attr("viewBox", &format!("0 0 {w} {h}"));
    }
    svg.set_attr("width", "24");
    svg.set_attr("height", "24");
    svg.set_attr("preserveAspectRatio", "xMidYMid meet");

    let mut out = String::new();
    svg.write(&mut out);
    Ok(out)
}
