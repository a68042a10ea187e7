use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_derive::{Serialize, Deserialize};
use failure_derive::Fail;

use crate::format::MappingFormat;

/// A mapping provider, each with its own naming scheme and file format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Mojang's official mappings, distributed in the ProGuard format
    Mojang,
    /// FabricMC's crowd sourced mappings, distributed in the TinyV2 format
    Yarn
}
impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Mojang, Namespace::Yarn];
    #[inline]
    pub fn id(self) -> &'static str {
        match self {
            Namespace::Mojang => "mojang",
            Namespace::Yarn => "yarn",
        }
    }
    fn from_id(id: &str) -> Option<Namespace> {
        Some(match id {
            "mojang" | "mojmap" => Namespace::Mojang,
            "yarn" => Namespace::Yarn,
            _ => return None
        })
    }
    /// The format the raw mappings of this namespace are written in
    #[inline]
    pub fn format(self) -> MappingFormat {
        match self {
            Namespace::Mojang => MappingFormat::ProGuard,
            Namespace::Yarn => MappingFormat::TinyV2,
        }
    }
}
impl FromStr for Namespace {
    type Err = InvalidNamespace;

    fn from_str(s: &str) -> Result<Self, InvalidNamespace> {
        Namespace::from_id(&s.to_ascii_lowercase())
            .ok_or_else(|| InvalidNamespace(s.into()))
    }
}
impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid namespace {:?}, must be 'mojang' or 'yarn'", _0)]
pub struct InvalidNamespace(String);
