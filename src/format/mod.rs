use std::fmt::{self, Display, Formatter};
use std::str;

use serde_derive::Serialize;

use crate::error::{ParseError, ParseErrorKind};
use crate::table::MappingTable;

pub mod proguard;
pub mod tiny;

/// The textual formats mappings are distributed in.
///
/// These are structurally different (indentation scoped vs tab-column scoped),
/// so each has its own parser.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum MappingFormat {
    /// Mojang's `client.txt` mappings
    ProGuard,
    /// Yarn's `mappings.tiny`
    TinyV2
}
impl MappingFormat {
    /// Parse raw mapping bytes into a table
    pub fn parse(self, raw: &[u8]) -> Result<MappingTable, ParseError> {
        let text = self.decode(raw)?;
        match self {
            MappingFormat::ProGuard => proguard::parse(text),
            MappingFormat::TinyV2 => tiny::parse(text),
        }
    }
    fn decode(self, raw: &[u8]) -> Result<&str, ParseError> {
        let text = str::from_utf8(raw).map_err(|cause| ParseError::new(
            self,
            ParseErrorKind::EncodingOrStructuralCorruption,
            format!("Not valid UTF-8: {}", cause)
        ))?;
        Ok(text.trim_start_matches('\u{FEFF}'))
    }
}
impl Display for MappingFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            MappingFormat::ProGuard => "ProGuard",
            MappingFormat::TinyV2 => "TinyV2",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn invalid_utf8() {
        for &format in &[MappingFormat::ProGuard, MappingFormat::TinyV2] {
            let error = format.parse(b"net.minecraft.World -> \xff\xfe:\n").unwrap_err();
            assert_eq!(error.kind(), ParseErrorKind::EncodingOrStructuralCorruption);
            assert_eq!(error.format(), format);
        }
    }
    #[test]
    fn byte_order_mark() {
        let table = MappingFormat::ProGuard
            .parse("\u{FEFF}net.minecraft.World -> a:\n".as_bytes())
            .unwrap();
        assert_eq!(table.entries()[0].deobfuscated, "net.minecraft.World");
    }
    #[test]
    fn deterministic() {
        let inputs: [(MappingFormat, &str); 2] = [
            (MappingFormat::ProGuard, concat!(
                "net.minecraft.World -> a:\n",
                "    int maxHeight -> b\n",
                "    1:4:void tick() -> a\n",
                "net.minecraft.block.BlockState -> b:\n",
                "    net.minecraft.World getWorld() -> a\n",
            )),
            (MappingFormat::TinyV2, concat!(
                "tiny\t2\t0\tofficial\tintermediary\tnamed\n",
                "c\ta\tclass_1\tnet/minecraft/World\n",
                "\tm\t()V\ta\tmethod_1\ttick\n",
                "\tf\tI\tb\tfield_1\tmaxHeight\n",
                "c\tb\tclass_2\tnet/minecraft/block/BlockState\n",
            )),
        ];
        for &(format, text) in &inputs {
            let first = format.parse(text.as_bytes()).unwrap();
            let second = format.parse(text.as_bytes()).unwrap();
            assert_eq!(first.entries(), second.entries());
            assert!(first.fragments().eq(second.fragments()), "{}", format);
            assert_eq!(first, second);
        }
    }
}
