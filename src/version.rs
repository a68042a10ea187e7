use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serializer, Serialize, Deserialize, Deserializer};
use serde::de;

use failure_derive::Fail;

/// A minecraft version, as understood by the mapping providers.
///
/// Releases (`1.20.4`, `1.21`) are parsed into their components,
/// while snapshots, pre-releases and release candidates (`23w31a`, `1.20.4-pre1`)
/// are kept verbatim.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum MinecraftVersion {
    Release {
        major: u32,
        minor: u32,
        patch: Option<u32>
    },
    Snapshot(String)
}
impl MinecraftVersion {
    #[inline]
    pub fn release(major: u32, minor: u32, patch: Option<u32>) -> MinecraftVersion {
        MinecraftVersion::Release { major, minor, patch }
    }
    fn parse_release(s: &str) -> Option<MinecraftVersion> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(patch) => Some(patch.parse().ok()?),
            None => None
        };
        if parts.next().is_some() {
            return None
        }
        Some(MinecraftVersion::Release { major, minor, patch })
    }
}
impl FromStr for MinecraftVersion {
    type Err = InvalidMinecraftVersion;

    fn from_str(s: &str) -> Result<Self, InvalidMinecraftVersion> {
        let error = || InvalidMinecraftVersion(s.into());
        if s.is_empty() {
            return Err(error())
        }
        // Versions end up in cache keys and file names
        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '+';
        if !s.chars().all(valid_char) {
            return Err(error())
        }
        Ok(match MinecraftVersion::parse_release(s) {
            Some(release) => release,
            None => MinecraftVersion::Snapshot(s.into())
        })
    }
}
impl Display for MinecraftVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            MinecraftVersion::Release { major, minor, patch } => {
                write!(f, "{}.{}", major, minor)?;
                if let Some(patch) = patch {
                    write!(f, ".{}", patch)?;
                }
                Ok(())
            },
            MinecraftVersion::Snapshot(ref name) => f.write_str(name),
        }
    }
}
impl Serialize for MinecraftVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.collect_str(self)
    }
}
impl<'de> Deserialize<'de> for MinecraftVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where
        D: Deserializer<'de> {
        struct VersionVisitor;
        impl<'de> de::Visitor<'de> for VersionVisitor {
            type Value = MinecraftVersion;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a MinecraftVersion")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> where
                E: de::Error, {
                MinecraftVersion::from_str(v).map_err(de::Error::custom)
            }
        }
        deserializer.deserialize_str(VersionVisitor)
    }
}
#[derive(Debug, Fail)]
#[fail(display = "Invalid minecraft version {:?}", _0)]
pub struct InvalidMinecraftVersion(String);

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn parse_release() {
        assert_eq!(MinecraftVersion::release(1, 21, None), "1.21".parse().unwrap());
        assert_eq!(MinecraftVersion::release(1, 20, Some(4)), "1.20.4".parse().unwrap());
    }
    #[test]
    fn parse_snapshot() {
        assert_eq!(
            MinecraftVersion::Snapshot("23w31a".into()),
            "23w31a".parse().unwrap()
        );
        assert_eq!(
            MinecraftVersion::Snapshot("1.20.4-pre1".into()),
            "1.20.4-pre1".parse().unwrap()
        );
        assert!(matches!(
            "1.20.4-rc1".parse::<MinecraftVersion>().unwrap(),
            MinecraftVersion::Snapshot(_)
        ));
    }
    #[test]
    fn reject_invalid() {
        assert!("".parse::<MinecraftVersion>().is_err());
        assert!("1.20 ".parse::<MinecraftVersion>().is_err());
        assert!("../1.20".parse::<MinecraftVersion>().is_err());
    }
    #[test]
    fn display_roundtrip() {
        for s in &["1.21", "1.20.4", "24w14potato", "1.19.3-rc2"] {
            assert_eq!(format!("{}", s.parse::<MinecraftVersion>().unwrap()), *s);
        }
    }
    #[test]
    fn serde_as_string() {
        let version = MinecraftVersion::release(1, 20, Some(4));
        assert_eq!(::serde_json::to_string(&version).unwrap(), "\"1.20.4\"");
        let parsed: MinecraftVersion = ::serde_json::from_str("\"23w31a\"").unwrap();
        assert_eq!(parsed, MinecraftVersion::Snapshot("23w31a".into()));
    }
}
