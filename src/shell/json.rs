//! A 2-space-indented JSON printer for lowered documents, emitting the
//! legacy extended-JSON forms the shell understands: 64-bit integers as
//! `{"$numberLong": "N"}`, dates as `{"$date": <millis>}`, binary as
//! `{"$binary": ..., "$type": ...}`.

use bson::{Bson, Document};

pub(crate) fn pretty_document(document: &Document) -> String {
    let mut out = String::new();
    write_document(&mut out, document, 0);
    out
}

fn write_document(out: &mut String, document: &Document, indent: usize) {
    if document.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    let last = document.len() - 1;
    for (i, (key, value)) in document.iter().enumerate() {
        push_indent(out, indent + 2);
        write_string(out, key);
        out.push_str(": ");
        write_value(out, value, indent + 2);
        if i != last {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, indent);
    out.push('}');
}

fn write_array(out: &mut String, values: &[Bson], indent: usize) {
    if values.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[\n");
    let last = values.len() - 1;
    for (i, value) in values.iter().enumerate() {
        push_indent(out, indent + 2);
        write_value(out, value, indent + 2);
        if i != last {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, indent);
    out.push(']');
}

fn write_value(out: &mut String, value: &Bson, indent: usize) {
    match value {
        Bson::Document(document) => write_document(out, document, indent),
        Bson::Array(values) => write_array(out, values, indent),
        Bson::String(text) => write_string(out, text),
        Bson::Int32(n) => out.push_str(&n.to_string()),
        Bson::Int64(n) => {
            let wrapped = bson::doc! { "$numberLong": n.to_string() };
            write_document(out, &wrapped, indent);
        }
        Bson::Double(d) => write_double(out, *d),
        Bson::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Bson::Null => out.push_str("null"),
        Bson::DateTime(dt) => {
            out.push_str("{\n");
            push_indent(out, indent + 2);
            out.push_str("\"$date\": ");
            out.push_str(&dt.timestamp_millis().to_string());
            out.push('\n');
            push_indent(out, indent);
            out.push('}');
        }
        Bson::ObjectId(oid) => {
            let wrapped = bson::doc! { "$oid": oid.to_hex() };
            write_document(out, &wrapped, indent);
        }
        Bson::Binary(binary) => {
            use base64::engine::general_purpose::STANDARD;
            use base64::Engine as _;
            let wrapped = bson::doc! {
                "$binary": STANDARD.encode(&binary.bytes),
                "$type": format!("{:02x}", u8::from(binary.subtype)),
            };
            write_document(out, &wrapped, indent);
        }
        other => write_string(out, &other.to_string()),
    }
}

fn write_double(out: &mut String, d: f64) {
    if d.is_finite() && d.fract() == 0.0 {
        out.push_str(&format!("{d:.1}"));
    } else {
        out.push_str(&d.to_string());
    }
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}
