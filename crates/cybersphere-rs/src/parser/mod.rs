//! Format parsers for the data_parse task family. Each parser
//! self-envelopes its failures; the dispatcher never sees a fault from
//! here.

use anyhow::{bail, Context};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::models::TaskResult;

pub fn parse_json(data: &str) -> TaskResult {
    match serde_json::from_str::<Value>(data) {
        Ok(value) => TaskResult::ok(value),
        Err(e) => TaskResult::err(format!("JSON parsing failed: {e}")),
    }
}

pub fn parse_yaml(data: &str) -> TaskResult {
    match serde_yaml::from_str::<Value>(data) {
        Ok(value) => TaskResult::ok(value),
        Err(e) => TaskResult::err(format!("YAML parsing failed: {e}")),
    }
}

/// First row is the header; every following row becomes an object of
/// string fields, like a dict reader.
pub fn parse_csv(data: &str) -> TaskResult {
    match csv_rows(data) {
        Ok(rows) => TaskResult::ok(Value::Array(rows)),
        Err(e) => TaskResult::err(format!("CSV parsing failed: {e}")),
    }
}

fn csv_rows(data: &str) -> anyhow::Result<Vec<Value>> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

pub fn parse_xml(data: &str) -> TaskResult {
    match xml_to_value(data) {
        Ok(value) => TaskResult::ok(value),
        Err(e) => TaskResult::err(format!("XML parsing failed: {e}")),
    }
}

/// Nested-map conversion: attributes under `@attributes`, mixed content
/// under `#text`, repeated child tags coalesced into arrays, and
/// text-only elements collapsing to their string.
fn xml_to_value(data: &str) -> anyhow::Result<Value> {
    let mut reader = Reader::from_str(data);
    loop {
        match reader.read_event()? {
            Event::Start(start) => return read_element(&mut reader, &start),
            Event::Empty(start) => return empty_element(&start),
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Text(text) => {
                if !text.unescape()?.trim().is_empty() {
                    bail!("unexpected text before root element");
                }
            }
            Event::Eof => bail!("no root element"),
            other => bail!("unexpected content before root element: {other:?}"),
        }
    }
}

fn read_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> anyhow::Result<Value> {
    let mut element = Map::new();
    if let Some(attrs) = attributes(start)? {
        element.insert("@attributes".to_string(), attrs);
    }

    let mut text = String::new();
    let mut has_children = false;

    loop {
        match reader.read_event()? {
            Event::Start(child) => {
                let tag = tag_name(&child)?;
                let child = child.into_owned();
                let value = read_element(reader, &child)?;
                insert_child(&mut element, tag, value);
                has_children = true;
            }
            Event::Empty(child) => {
                let tag = tag_name(&child)?;
                insert_child(&mut element, tag, empty_element(&child)?);
                has_children = true;
            }
            Event::Text(t) => {
                let piece = t.unescape()?;
                text.push_str(piece.trim());
            }
            Event::CData(t) => {
                text.push_str(String::from_utf8_lossy(&t.into_inner()).trim());
            }
            Event::End(_) => break,
            Event::Eof => bail!("unexpected end of document"),
            _ => {}
        }
    }

    // Text-only elements collapse to their string content.
    if !has_children && !text.is_empty() {
        return Ok(Value::String(text));
    }
    if has_children && !text.is_empty() {
        element.insert("#text".to_string(), Value::String(text));
    }
    Ok(Value::Object(element))
}

fn empty_element(start: &BytesStart) -> anyhow::Result<Value> {
    let mut element = Map::new();
    if let Some(attrs) = attributes(start)? {
        element.insert("@attributes".to_string(), attrs);
    }
    Ok(Value::Object(element))
}

fn attributes(start: &BytesStart) -> anyhow::Result<Option<Value>> {
    let mut attrs = Map::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        attrs.insert(key, Value::String(value));
    }
    if attrs.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Object(attrs)))
}

fn tag_name(start: &BytesStart) -> anyhow::Result<String> {
    String::from_utf8(start.name().as_ref().to_vec()).context("tag name is not valid UTF-8")
}

fn insert_child(element: &mut Map<String, Value>, tag: String, value: Value) {
    match element.get_mut(&tag) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            element.insert(tag, value);
        }
    }
}
