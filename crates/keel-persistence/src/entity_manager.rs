//! Entity manager collaborator
//!
//! The entity manager for connection `<name>` is registered under
//! `doctrine.entity_manager.<name>`. It owns the shared connection and the
//! mapping driver settings from `doctrine.driver.<name>`; mapping itself is
//! out of scope, so the manager only locates mapping files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use keel_core::container::{service, Container, Factory, Service};
use keel_core::core_types::schema::OP_BUILD_ENTITY_MANAGER;
use keel_core::{log_op_end, log_op_error, log_op_start};

use crate::connection::Connection;
use crate::errors::{invalid_settings, io_error, unsupported_driver, Result};
use crate::identifiers::{ARRAY_CACHE, SIMPLIFIED_YAML_DRIVER};
use crate::provider::{connection_key, CONNECTION_ALIAS_PATTERN, DEFAULT_CONNECTION};
use crate::settings::{DoctrineSettings, DriverSettings, SETTINGS_SECTION};

/// Mapping drivers this build understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDriver {
    /// One `<Entity>.orm.yml` file per entity under each configured path
    SimplifiedYaml,
}

impl MappingDriver {
    pub fn from_class(class: &str) -> Result<Self> {
        match class {
            SIMPLIFIED_YAML_DRIVER => Ok(MappingDriver::SimplifiedYaml),
            other => Err(unsupported_driver("mapping driver", other)),
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            MappingDriver::SimplifiedYaml => SIMPLIFIED_YAML_DRIVER,
        }
    }

    fn suffixes(&self) -> &'static [&'static str] {
        match self {
            MappingDriver::SimplifiedYaml => &[".orm.yml", ".orm.yaml"],
        }
    }
}

#[derive(Debug)]
pub struct EntityManager {
    name: String,
    connection: Arc<Connection>,
    driver: MappingDriver,
    cache: String,
    paths: Vec<PathBuf>,
}

impl EntityManager {
    pub fn new(name: &str, connection: Arc<Connection>, settings: &DriverSettings) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            connection,
            driver: MappingDriver::from_class(&settings.class)?,
            cache: settings.cache.clone(),
            paths: settings.paths.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn driver(&self) -> MappingDriver {
        self.driver
    }

    /// Metadata cache strategy, e.g. `array`
    pub fn cache(&self) -> &str {
        &self.cache
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Whether the metadata cache survives the process
    pub fn has_persistent_cache(&self) -> bool {
        self.cache != ARRAY_CACHE
    }

    /// Mapping files under the configured paths, sorted
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_INPUT` when a configured path is not a directory,
    /// `ERR_IO` when a directory cannot be read.
    pub fn mapping_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in &self.paths {
            if !path.is_dir() {
                return Err(invalid_settings(
                    &format!("{}.driver.{}.paths", SETTINGS_SECTION, self.name),
                    format!("`{}` is not a directory", path.display()),
                ));
            }
            collect_mapping_files(path, self.driver.suffixes(), &mut files)?;
        }
        files.sort();
        Ok(files)
    }

    /// Entity names derived from mapping file names
    pub fn mapped_entities(&self) -> Result<Vec<String>> {
        let suffixes = self.driver.suffixes();
        Ok(self
            .mapping_files()?
            .iter()
            .filter_map(|file| file.file_name().and_then(|n| n.to_str()))
            .filter_map(|file_name| {
                suffixes
                    .iter()
                    .find_map(|suffix| file_name.strip_suffix(suffix))
                    .map(str::to_string)
            })
            .collect())
    }
}

fn collect_mapping_files(dir: &Path, suffixes: &[&str], out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| io_error("read_mapping_dir", e))?;
    for entry in entries {
        let path = entry.map_err(|e| io_error("read_mapping_dir", e))?.path();
        if path.is_dir() {
            collect_mapping_files(&path, suffixes, out)?;
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| suffixes.iter().any(|suffix| n.ends_with(suffix)))
            .unwrap_or(false);
        if matches {
            out.push(path);
        }
    }
    Ok(())
}

/// Builds `doctrine.entity_manager.<name>`, taking the name from the key
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityManagerFactory;

impl EntityManagerFactory {
    fn connection_name(service_key: &str) -> &str {
        let prefix = CONNECTION_ALIAS_PATTERN.trim_end_matches("%s");
        service_key
            .strip_prefix(prefix)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CONNECTION)
    }

    fn build(container: &Container, name: &str) -> Result<EntityManager> {
        let connection = container.get::<Connection>(connection_key(name).as_str())?;
        let settings = DoctrineSettings::from_config(container.config())?;
        let driver = settings.driver(name).ok_or_else(|| {
            invalid_settings(
                &format!("{}.driver.{}", SETTINGS_SECTION, name),
                "no mapping driver configured",
            )
        })?;
        EntityManager::new(name, connection, driver)
    }
}

impl Factory for EntityManagerFactory {
    fn create(
        &self,
        container: &Container,
        service_key: &str,
        _argument: Option<&str>,
    ) -> Result<Service> {
        let name = Self::connection_name(service_key);
        let started = Instant::now();
        log_op_start!(OP_BUILD_ENTITY_MANAGER, connection = name);

        match Self::build(container, name) {
            Ok(manager) => {
                log_op_end!(
                    OP_BUILD_ENTITY_MANAGER,
                    duration_ms = started.elapsed().as_millis() as u64,
                    connection = name,
                    driver = manager.driver().class()
                );
                Ok(service(manager))
            }
            Err(err) => {
                log_op_error!(
                    OP_BUILD_ENTITY_MANAGER,
                    err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    connection = name
                );
                Err(err)
            }
        }
    }
}
