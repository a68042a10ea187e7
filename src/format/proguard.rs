//! Mojang's mappings, written in the ProGuard format.
//!
//! ```text
//! # {"fileName":"client.txt"}
//! net.minecraft.World -> a:
//!     int time -> b
//!     1:3:void tick(int,java.lang.String) -> a
//! ```
//!
//! Class headers are unindented, members are indented and belong to the previous header.
//! Lines that don't make sense are skipped instead of failing the whole file.
use log::{debug, trace};

use crate::entry::{EntryKind, LineRange, MappingEntry};
use crate::error::ParseError;
use crate::table::{MappingTable, TableBuilder};

pub fn parse(text: &str) -> Result<MappingTable, ParseError> {
    let mut builder = TableBuilder::new();
    let mut current_class: Option<String> = None;
    let mut skipped = 0usize;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue
        }
        let entry = if trimmed.len() == line.len() {
            let class = parse_class(line);
            // Members of a broken header must not end up in the previous class
            current_class = class.as_ref().map(|entry| entry.deobfuscated.clone());
            class
        } else {
            current_class.as_ref().and_then(|owner| parse_member(owner, trimmed))
        };
        match entry {
            Some(entry) => {
                builder.push(entry);
            },
            None => {
                trace!("Skipping malformed ProGuard line {}: {:?}", index + 1, line);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        debug!("Skipped {} malformed ProGuard lines", skipped);
    }
    Ok(builder.build())
}

/// Parse a `deobfuscated -> obfuscated:` class header
fn parse_class(line: &str) -> Option<MappingEntry> {
    let (deobfuscated, obfuscated) = line.strip_suffix(':')?.split_once(" -> ")?;
    let deobfuscated = valid_name(deobfuscated.trim())?;
    let obfuscated = valid_name(obfuscated.trim())?;
    Some(MappingEntry::class(obfuscated.into(), deobfuscated.into()))
}

/// Parse an (already unindented) member line
fn parse_member(owner: &str, line: &str) -> Option<MappingEntry> {
    let (signature, obfuscated) = line.rsplit_once(" -> ")?;
    let obfuscated = obfuscated.trim();
    if obfuscated.contains(char::is_whitespace) {
        return None
    }
    let (line_range, signature) = split_line_range(signature.trim());
    let mut entry = match signature.find('(') {
        Some(open) => {
            let close = open + signature[open..].find(')')?;
            let (return_type, name) = split_declaration(&signature[..open])?;
            let arguments = signature[(open + 1)..close].trim();
            let mut descriptor = String::from("(");
            if !arguments.is_empty() {
                for argument in arguments.split(',') {
                    descriptor.push_str(&type_descriptor(argument)?);
                }
            }
            descriptor.push(')');
            descriptor.push_str(&type_descriptor(return_type)?);
            MappingEntry::member(EntryKind::Method, owner, obfuscated.into(), name.into())
                .with_descriptor(descriptor)
        },
        None => {
            let (field_type, name) = split_declaration(signature)?;
            MappingEntry::member(EntryKind::Field, owner, obfuscated.into(), name.into())
                .with_descriptor(type_descriptor(field_type)?)
        }
    };
    entry.line_range = line_range;
    Some(entry)
}

/// Strip the `start:end:` prefix the mappings give to methods
fn split_line_range(signature: &str) -> (Option<LineRange>, &str) {
    let mut parts = signature.splitn(3, ':');
    if let (Some(start), Some(end), Some(rest)) = (parts.next(), parts.next(), parts.next()) {
        if let (Ok(start), Ok(end)) = (start.parse(), end.parse()) {
            return (Some(LineRange { start, end }), rest);
        }
    }
    (None, signature)
}

/// Split `type name` into its parts
fn split_declaration(declaration: &str) -> Option<(&str, &str)> {
    let (declared_type, name) = declaration.trim().rsplit_once(' ')?;
    Some((declared_type.trim(), valid_name(name)?))
}

fn valid_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        None
    } else {
        Some(name)
    }
}

/// Convert a java source type (`int[]`, `java.lang.String`) into a JVM type descriptor
fn type_descriptor(java_type: &str) -> Option<String> {
    let mut base = java_type.trim();
    let mut dimensions = 0;
    loop {
        if let Some(inner) = base.strip_suffix("[]") {
            base = inner.trim_end();
        } else if let Some(inner) = base.strip_suffix("...") {
            base = inner.trim_end();
        } else {
            break
        }
        dimensions += 1;
    }
    let base = valid_name(base)?;
    let mut descriptor = "[".repeat(dimensions);
    match base {
        "void" => descriptor.push('V'),
        "boolean" => descriptor.push('Z'),
        "byte" => descriptor.push('B'),
        "char" => descriptor.push('C'),
        "short" => descriptor.push('S'),
        "int" => descriptor.push('I'),
        "long" => descriptor.push('J'),
        "float" => descriptor.push('F'),
        "double" => descriptor.push('D'),
        _ => {
            descriptor.push('L');
            descriptor.extend(base.chars().map(|c| if c == '.' { '/' } else { c }));
            descriptor.push(';');
        }
    }
    Some(descriptor)
}
