use std::path::PathBuf;

/// Environment variable holding an explicit path to the MagickCore shared library.
pub const LIBRARY_PATH_ENV: &str = "KORNIA_MAGICK_LIBRARY";

/// Environment variable holding the client name given to `MagickCoreGenesis`.
pub const CLIENT_NAME_ENV: &str = "KORNIA_MAGICK_CLIENT";

/// Settings used to load and initialize MagickCore.
///
/// # Example
///
/// ```rust
/// use kornia_magick::MagickConfig;
///
/// let config = MagickConfig::default()
///     .with_library_path("/usr/lib/libMagickCore-6.Q16.so.7")
///     .with_client_name("my-app");
/// assert!(!config.establish_signal_handlers);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MagickConfig {
    /// Shared library to open instead of the platform default names.
    pub library_path: Option<PathBuf>,
    /// Client name passed to `MagickCoreGenesis`. Defaults to the current executable.
    pub client_name: Option<String>,
    /// Whether MagickCore installs its own signal handlers.
    pub establish_signal_handlers: bool,
}

impl MagickConfig {
    /// Reads the configuration from the process environment.
    ///
    /// See [`LIBRARY_PATH_ENV`] and [`CLIENT_NAME_ENV`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            library_path: non_empty(LIBRARY_PATH_ENV).map(PathBuf::from),
            client_name: non_empty(CLIENT_NAME_ENV),
            establish_signal_handlers: false,
        }
    }

    /// Sets the shared library to open.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Sets the client name given to MagickCore.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Enables or disables the MagickCore signal handlers.
    pub fn with_signal_handlers(mut self, enabled: bool) -> Self {
        self.establish_signal_handlers = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        let config = MagickConfig::from_lookup(|key| match key {
            LIBRARY_PATH_ENV => Some("/opt/im/libMagickCore-6.Q16.so".to_string()),
            CLIENT_NAME_ENV => Some("demo".to_string()),
            _ => None,
        });
        assert_eq!(
            config.library_path,
            Some(PathBuf::from("/opt/im/libMagickCore-6.Q16.so"))
        );
        assert_eq!(config.client_name.as_deref(), Some("demo"));
        assert!(!config.establish_signal_handlers);
    }

    #[test]
    fn test_from_lookup_ignores_blank_values() {
        let config = MagickConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, MagickConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = MagickConfig::default()
            .with_library_path("libMagickCore.so")
            .with_client_name("app")
            .with_signal_handlers(true);
        assert_eq!(config.library_path, Some(PathBuf::from("libMagickCore.so")));
        assert_eq!(config.client_name.as_deref(), Some("app"));
        assert!(config.establish_signal_handlers);
    }
}
