//! WALS chapter XML reader
//!
//! Reads the per-feature export format of the World Atlas of Language
//! Structures:
//!
//! ```text
//! <feature number="1A" name="Consonant Inventories">
//!   <v numeric="1" description="Small">
//!     <l c="ach" n="Aché" lng="-55.1666666667" lat="-25.25"/>
//!     ...
//!   </v>
//! </feature>
//! ```
//!
//! Every `<l>` becomes one [`Site`] carrying the `numeric` category of its
//! enclosing `<v>`. Document order is preserved.

use crate::error::{Error, Result};
use crate::point::{FeatureDataset, GeoPoint, Site};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read a WALS chapter export from disk.
///
/// Returns `Ok(None)` for placeholder documents that contain no `<feature>`.
pub fn read_wals_feature<P: AsRef<Path>>(path: P) -> Result<Option<FeatureDataset>> {
    let xml = fs::read_to_string(path.as_ref())?;
    parse_wals_xml(&xml)
}

/// Parse a WALS chapter export held in memory.
///
/// Returns `Ok(None)` when the document is empty, a bare comment, or has no
/// `<feature>` element. Sites whose coordinates do not parse as numbers are
/// skipped with a warning; coordinates that parse but fall outside the valid
/// range are an error.
pub fn parse_wals_xml(xml: &str) -> Result<Option<FeatureDataset>> {
    let xml = xml.trim();
    if xml.is_empty() || xml.starts_with("<!--") || !xml.contains("<feature") {
        return Ok(None);
    }

    let xml = escape_bare_ampersands(xml);
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut id = None;
    let mut name = None;
    let mut category: Option<(i64, String)> = None;
    let mut sites = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"feature" => {
                    id = attr(&e, "number")?;
                    name = attr(&e, "name")?;
                }
                b"v" => {
                    let numeric = attr(&e, "numeric")?.unwrap_or_else(|| "0".into());
                    let value = numeric.trim().parse::<i64>().map_err(|_| {
                        Error::Parse(format!("invalid category value: {numeric:?}"))
                    })?;
                    let description = attr(&e, "description")?.unwrap_or_default();
                    category = Some((value, description));
                }
                b"l" => {
                    let Some((value, description)) = category.as_ref() else {
                        warn!("<l> element outside of a <v> category, skipped");
                        continue;
                    };
                    if let Some(site) = parse_site(&e, *value, description)? {
                        sites.push(site);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"v" => category = None,
            Event::Eof => break,
            _ => {}
        }
    }

    let dataset = FeatureDataset {
        id: id.unwrap_or_else(|| "Unknown".into()),
        name: name.unwrap_or_else(|| "Unknown".into()),
        sites,
    };
    debug!("Parsed feature {} with {} sites", dataset.id, dataset.len());
    Ok(Some(dataset))
}

fn parse_site(e: &BytesStart<'_>, value: i64, description: &str) -> Result<Option<Site>> {
    let code = attr(e, "c")?.unwrap_or_default();
    let name = attr(e, "n")?.unwrap_or_default();
    let lat = attr(e, "lat")?.unwrap_or_else(|| "0".into());
    let lng = attr(e, "lng")?.unwrap_or_else(|| "0".into());

    let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) else {
        warn!("Could not parse coordinates for {} ({}), skipped", name, code);
        return Ok(None);
    };

    Ok(Some(Site {
        code,
        name,
        point: GeoPoint::new(lat, lng)?,
        value,
        description: description.to_string(),
    }))
}

fn attr(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    match e.try_get_attribute(key)? {
        Some(a) => Ok(Some(a.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Entities every XML parser knows; HTML names such as `nbsp` are not among them.
const XML_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Replace `&` that does not start a predefined entity or a character
/// reference with `&amp;`, so undeclared entities come through as text.
fn escape_bare_ampersands(xml: &str) -> Cow<'_, str> {
    if !xml.contains('&') {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len() + 16);
    let mut rest = xml;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if starts_reference(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn starts_reference(s: &str) -> bool {
    let Some(end) = s.find(';') else {
        return false;
    };
    let body = &s[1..end];
    if let Some(hex) = body.strip_prefix("#x") {
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(dec) = body.strip_prefix('#') {
        !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit())
    } else {
        XML_ENTITIES.contains(&body)
    }
}
