//! Yarn's mappings, written in the TinyV2 format.
//!
//! ```text
//! tiny	2	0	intermediary	named
//! c	net/minecraft/class_1	net/minecraft/World
//! 	c	A class comment
//! 	m	()V	method_1	tick
//! 		p	1		ticks
//! 	f	I	field_1	time
//! ```
//!
//! The header names the namespaces, and each row has one name column per namespace.
//! Rows are nested by leading tabs, so members belong to the closest class above them.
use std::borrow::Cow;

use log::{debug, trace};

use crate::entry::{EntryKind, MappingEntry};
use crate::error::{ParseError, ParseErrorKind};
use crate::format::MappingFormat;
use crate::table::{MappingTable, TableBuilder};

/// Which name columns we care about, resolved from the header
#[derive(Debug, Eq, PartialEq)]
struct Columns {
    obfuscated: usize,
    target: usize,
    intermediary: Option<usize>,
}
impl Columns {
    fn from_header(header: Option<&str>) -> Result<Columns, ParseError> {
        let missing = |message: &str| ParseError::new(
            MappingFormat::TinyV2,
            ParseErrorKind::MissingNamespaceHeader,
            message
        ).at_line(1);
        let header = header.ok_or_else(|| missing("Empty file"))?;
        let fields: Vec<&str> = header.split('\t').collect();
        if fields[0] != "tiny" || fields.len() < 3 {
            return Err(missing("Expected a `tiny` header"))
        }
        if fields[1] != "2" {
            return Err(ParseError::new(
                MappingFormat::TinyV2,
                ParseErrorKind::StructuralCorruption,
                format!("Unsupported tiny version {:?}", fields[1])
            ).at_line(1))
        }
        let namespaces = &fields[3..];
        if namespaces.len() < 2 {
            return Err(missing("The header must declare at least two namespaces"))
        }
        let find = |name: &str| namespaces.iter().position(|&namespace| namespace == name);
        let target = find("named").unwrap_or(namespaces.len() - 1);
        let obfuscated = find("official")
            .or_else(|| find("intermediary"))
            .filter(|&column| column != target)
            .or_else(|| (0..namespaces.len()).find(|&column| column != target))
            .ok_or_else(|| missing("No obfuscated namespace"))?;
        let intermediary = find("intermediary")
            .filter(|&column| column != target && column != obfuscated);
        debug!(
            "Tiny namespaces {:?}: obfuscated {:?}, target {:?}",
            namespaces, namespaces[obfuscated], namespaces[target]
        );
        Ok(Columns { obfuscated, target, intermediary })
    }
}

enum ClassState {
    /// No class rows yet, so members are a structural error
    NotSeen,
    Current(usize),
    /// The last class row was malformed, so its members are dropped too
    Skipped,
}

struct TinyParser {
    columns: Columns,
    escaped_names: bool,
    entries: Vec<MappingEntry>,
    class: ClassState,
    /// The last member of the current class, which comments attach to
    member: Option<usize>,
    skipped: usize,
}
impl TinyParser {
    fn name<'a>(&self, names: &[&'a str], column: usize) -> Option<Cow<'a, str>> {
        // Missing names fall back to the first namespace
        let name = names.get(column)
            .filter(|name| !name.is_empty())
            .or_else(|| names.first().filter(|name| !name.is_empty()))?;
        Some(if self.escaped_names { unescape(*name) } else { Cow::Borrowed(*name) })
    }
    fn entry(&self, kind: EntryKind, owner: &str, names: &[&str]) -> Option<MappingEntry> {
        let deobfuscated = self.name(names, self.columns.target)?.into_owned();
        let obfuscated = self.name(names, self.columns.obfuscated)
            .map_or_else(String::new, Cow::into_owned);
        let mut entry = match kind {
            EntryKind::Class => MappingEntry::class(obfuscated, deobfuscated),
            EntryKind::Method | EntryKind::Field => {
                MappingEntry::member(kind, owner, obfuscated, deobfuscated)
            }
        };
        entry.intermediary = self.columns.intermediary
            .and_then(|column| self.name(names, column))
            .map(Cow::into_owned);
        Some(entry)
    }
    fn row(&mut self, line_number: usize, depth: usize, fields: &[&str]) -> Result<bool, ParseError> {
        match (depth, fields[0]) {
            (0, "c") => {
                self.member = None;
                match self.entry(EntryKind::Class, "", &fields[1..]) {
                    Some(entry) => {
                        self.class = ClassState::Current(self.entries.len());
                        self.entries.push(entry);
                        Ok(true)
                    },
                    None => {
                        self.class = ClassState::Skipped;
                        Ok(false)
                    }
                }
            },
            (1, kind @ "m") | (1, kind @ "f") => {
                let class = match self.class {
                    ClassState::NotSeen => return Err(ParseError::new(
                        MappingFormat::TinyV2,
                        ParseErrorKind::StructuralCorruption,
                        "Member row before any class row"
                    ).at_line(line_number)),
                    ClassState::Skipped => return Ok(false),
                    ClassState::Current(class) => class,
                };
                if fields.len() < 3 {
                    return Ok(false)
                }
                let kind = if kind == "m" { EntryKind::Method } else { EntryKind::Field };
                let owner = self.entries[class].deobfuscated.clone();
                match self.entry(kind, &owner, &fields[2..]) {
                    Some(entry) => {
                        let entry = entry.with_descriptor(fields[1].into());
                        self.member = Some(self.entries.len());
                        self.entries.push(entry);
                        Ok(true)
                    },
                    None => Ok(false)
                }
            },
            (1, "c") => match self.class {
                ClassState::Current(class) => Ok(self.comment(class, fields)),
                _ => Ok(false)
            },
            (2, "c") => match self.member {
                Some(member) => Ok(self.comment(member, fields)),
                None => Ok(false)
            },
            (1, property) if matches!(self.class, ClassState::NotSeen) => {
                if property == "escaped-names" {
                    self.escaped_names = true;
                }
                Ok(true)
            },
            // Parameters, locals and their comments
            (2, "p") | (2, "v") | (3, "c") => Ok(true),
            _ => Ok(false)
        }
    }
    fn comment(&mut self, target: usize, fields: &[&str]) -> bool {
        match fields.get(1) {
            Some(comment) => {
                // Comments are always escaped
                self.entries[target].comment = Some(unescape(comment).into_owned());
                true
            },
            None => false
        }
    }
}

pub fn parse(text: &str) -> Result<MappingTable, ParseError> {
    let mut lines = text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .enumerate();
    let columns = Columns::from_header(lines.next().map(|(_, line)| line))?;
    let mut parser = TinyParser {
        columns,
        escaped_names: false,
        entries: Vec::new(),
        class: ClassState::NotSeen,
        member: None,
        skipped: 0
    };
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue
        }
        let depth = line.bytes().take_while(|&b| b == b'\t').count();
        let fields: Vec<&str> = line[depth..].split('\t').collect();
        if !parser.row(index + 1, depth, &fields)? {
            trace!("Skipping malformed tiny line {}: {:?}", index + 1, line);
            parser.skipped += 1;
        }
    }
    if parser.skipped > 0 {
        debug!("Skipped {} malformed tiny lines", parser.skipped);
    }
    let mut builder = TableBuilder::new();
    builder.extend(parser.entries);
    Ok(builder.build())
}

fn unescape(s: &str) -> Cow<str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s)
    }
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    Cow::Owned(result)
}
