#[macro_use]
extern crate clap;
extern crate failure;
extern crate log;
extern crate env_logger;
extern crate serde_json;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use failure::{Error, ResultExt};
use log::debug;

use mappings::{MappingService, MinecraftVersion, Namespace, RawMappingSupplier, SearchConfig};

/// Reads already downloaded mappings from a directory,
/// named like `mojang_1.20.4.txt` or `yarn_1.20.4.tiny`.
struct DirectorySupplier {
    dir: PathBuf
}
impl DirectorySupplier {
    fn location(&self, namespace: Namespace, version: &MinecraftVersion) -> PathBuf {
        let extension = match namespace {
            Namespace::Mojang => "txt",
            Namespace::Yarn => "tiny",
        };
        self.dir.join(format!("{}_{}.{}", namespace.id(), version, extension))
    }
}
impl RawMappingSupplier for DirectorySupplier {
    fn fetch(&self, namespace: Namespace, version: &MinecraftVersion) -> Result<Vec<u8>, Error> {
        let location = self.location(namespace, version);
        debug!("Reading {} mappings from {}", namespace, location.display());
        Ok(fs::read(&location).with_context(|_| format!("Unable to read {}", location.display()))?)
    }
}

fn app() -> clap::App<'static, 'static> {
    clap_app!(mapping_search =>
        (version: crate_version!())
        (author: crate_authors!())
        (about: crate_description!())
        (@arg dir: --dir +takes_value default_value[mappings] "The directory containing the downloaded mappings")
        (@arg namespace: --namespace +takes_value default_value[mojang] "The mappings to search, either mojang or yarn")
        (@arg limit: --limit +takes_value "The maximum number of results")
        (@arg config: --config +takes_value "A JSON file configuring the search")
        (@arg minecraft_version: +required "The minecraft version to search")
        (@arg query: +required "The name to search for")
    )
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let matches = app().get_matches();
    let namespace = value_t!(matches, "namespace", Namespace)
        .unwrap_or_else(|e| e.exit());
    let minecraft_version = value_t!(matches, "minecraft_version", MinecraftVersion)
        .unwrap_or_else(|e| e.exit());
    let config = match matches.value_of("config") {
        Some(location) => SearchConfig::load(Path::new(location))?,
        None => SearchConfig::default(),
    };
    let limit = if matches.is_present("limit") {
        value_t!(matches, "limit", i64).unwrap_or_else(|e| e.exit())
    } else {
        config.default_limit as i64
    };
    let dir = PathBuf::from(matches.value_of("dir").unwrap());
    let query = matches.value_of("query").unwrap();
    let service = MappingService::new(DirectorySupplier { dir }, config);
    let response = service.search(namespace, &minecraft_version, query, limit)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &response)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn locations() {
        let supplier = DirectorySupplier { dir: PathBuf::from("mappings") };
        let version = MinecraftVersion::release(1, 20, Some(4));
        assert_eq!(
            supplier.location(Namespace::Mojang, &version),
            Path::new("mappings/mojang_1.20.4.txt")
        );
        assert_eq!(
            supplier.location(Namespace::Yarn, &version),
            Path::new("mappings/yarn_1.20.4.tiny")
        );
    }
    #[test]
    fn arguments() {
        let matches = app().get_matches_from(vec!["mapping-search", "--namespace", "yarn", "1.20.4", "World"]);
        assert_eq!(value_t!(matches, "namespace", Namespace).unwrap(), Namespace::Yarn);
        assert_eq!(matches.value_of("dir"), Some("mappings"));
        assert_eq!(matches.value_of("query"), Some("World"));
    }
}
