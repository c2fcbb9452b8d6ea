//! Service-style sources bound at every command level.

use std::fmt;
use std::sync::Arc;

use cascade_options::{
    parse_properties, EnvReader, FileSystem, OptionError, Properties, RealEnv, ResourceLocator,
};
use log::debug;

/// Which property file and environment feed each level's store.
///
/// Both are off by default, leaving defaults and arguments only.
///
/// ```
/// use cascade_dispatch::SourceSettings;
/// use cascade_options::{MockEnv, StaticResources};
///
/// let settings = SourceSettings::new()
///     .property_file("embedded://app.properties")
///     .resources(StaticResources::new().with("app.properties", "PORT=9000"))
///     .environment("APP", "_")
///     .env_reader(MockEnv::new().with_var("APP_HOST", "example.org"));
/// assert_eq!(settings.property_locator(), Some("embedded://app.properties"));
/// ```
#[derive(Clone)]
pub struct SourceSettings {
    property_file: Option<String>,
    environment: Option<(String, String)>,
    env_reader: Arc<dyn EnvReader>,
    resources: Arc<dyn ResourceLocator>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            property_file: None,
            environment: None,
            env_reader: Arc::new(RealEnv),
            resources: Arc::new(FileSystem),
        }
    }
}

impl SourceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read properties from a path or `scheme://path` locator.
    pub fn property_file(mut self, locator: impl Into<String>) -> Self {
        self.property_file = Some(locator.into());
        self
    }

    /// Read `<prefix><separator><UPPER_NAME>` environment keys.
    pub fn environment(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.environment = Some((prefix.into(), separator.into()));
        self
    }

    /// Environment to read from instead of the process environment.
    pub fn env_reader(mut self, reader: impl EnvReader + 'static) -> Self {
        self.env_reader = Arc::new(reader);
        self
    }

    /// Locator used to open the property file.
    pub fn resources(mut self, resources: impl ResourceLocator + 'static) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    pub fn property_locator(&self) -> Option<&str> {
        self.property_file.as_deref()
    }

    pub(crate) fn environment_binding(&self) -> Option<(&str, &str)> {
        self.environment
            .as_ref()
            .map(|(prefix, separator)| (prefix.as_str(), separator.as_str()))
    }

    pub(crate) fn reader(&self) -> &dyn EnvReader {
        self.env_reader.as_ref()
    }

    /// Read and parse the property file. A missing file yields `None`.
    pub(crate) fn load_properties(&self) -> Result<Option<Properties>, OptionError> {
        let Some(locator) = self.property_file.as_deref() else {
            return Ok(None);
        };
        match self
            .resources
            .open(locator)
            .map_err(|e| OptionError::source_failure("property file", e))?
        {
            Some(text) => Ok(Some(parse_properties(&text))),
            None => {
                debug!("property file '{locator}' not found, skipping");
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSettings")
            .field("property_file", &self.property_file)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
