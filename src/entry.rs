use std::fmt::{self, Display, Formatter};

use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Class,
    Method,
    Field
}
impl EntryKind {
    /// Lower is more important, classes come before their members
    #[inline]
    pub fn priority(self) -> u8 {
        match self {
            EntryKind::Class => 0,
            EntryKind::Method => 1,
            EntryKind::Field => 2,
        }
    }
    #[inline]
    pub fn is_member(self) -> bool {
        self != EntryKind::Class
    }
}
impl Display for EntryKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            EntryKind::Class => "class",
            EntryKind::Method => "method",
            EntryKind::Field => "field",
        })
    }
}

/// The original source lines of a ProGuard member
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32
}

/// A single mapped class, method or field
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct MappingEntry {
    pub kind: EntryKind,
    /// The obfuscated name, which may be empty if the format doesn't provide one
    pub obfuscated: String,
    /// The human readable name, never empty
    pub deobfuscated: String,
    /// The deobfuscated name of the declaring class, empty for classes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
impl MappingEntry {
    #[inline]
    pub fn class(obfuscated: String, deobfuscated: String) -> MappingEntry {
        MappingEntry::new(EntryKind::Class, obfuscated, deobfuscated, String::new())
    }
    #[inline]
    pub fn member(kind: EntryKind, owner: &str, obfuscated: String, deobfuscated: String) -> MappingEntry {
        debug_assert!(kind.is_member());
        MappingEntry::new(kind, obfuscated, deobfuscated, owner.into())
    }
    fn new(kind: EntryKind, obfuscated: String, deobfuscated: String, owner: String) -> MappingEntry {
        MappingEntry {
            kind, obfuscated, deobfuscated, owner,
            descriptor: None, intermediary: None,
            line_range: None, comment: None
        }
    }
    #[inline]
    pub fn with_descriptor(mut self, descriptor: String) -> MappingEntry {
        self.descriptor = Some(descriptor);
        self
    }
    /// The last segment of the deobfuscated name.
    ///
    /// For classes this strips the package and any outer classes,
    /// so `net/minecraft/world/World$Inner` becomes `Inner`.
    pub fn simple_name(&self) -> &str {
        match self.kind {
            EntryKind::Class => simple_class_name(&self.deobfuscated),
            EntryKind::Method | EntryKind::Field => &self.deobfuscated,
        }
    }
}

pub(crate) fn simple_class_name(name: &str) -> &str {
    match name.rfind(|c| c == '.' || c == '/' || c == '$') {
        Some(index) if index + 1 < name.len() => &name[(index + 1)..],
        _ => name
    }
}
