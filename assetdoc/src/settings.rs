const DOCUMENTATION: &str = r#"# Assetdoc settings. You may edit this file, but be aware that formatting and comments will not
# be preserved.

# log_level: one of "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE".
# autocommit: commit after every command that edits the document.
# prompt: shown before each line when running interactively.
# root_kind: the registered kind each new document is rooted at. Try the `kinds` command.

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    pub(crate) failed_to_load: bool,
    pub log_level: log::LevelFilter,
    pub autocommit: bool,
    pub prompt: String,
    pub root_kind: String,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            failed_to_load: false,
            log_level: log::LevelFilter::Info,
            autocommit: false,
            prompt: "> ".to_owned(),
            root_kind: "Scene".to_owned(),
        }
    }
}
impl Settings {
    const FILENAME: &'static str = "settings.toml";
    /// Load the user's settings, or defaults if there are none.
    ///
    /// Nothing is logged here, as this runs before the logger is installed. Check
    /// [`Self::did_fail_to_load`].
    #[must_use]
    pub fn load() -> Self {
        match preferences_dir() {
            None => Self::default(),
            Some(mut dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(&dir)
            }
        }
    }
    #[must_use]
    fn load_or_default(path: &std::path::Path) -> Self {
        if !path.exists() {
            // First run. Not a failure, defaults get written on save.
            return Self::default();
        }
        let settings: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings: Self = toml::from_str(&string)?;
            Ok(settings)
        };

        settings.unwrap_or_else(|_| Self {
            failed_to_load: true,
            ..Self::default()
        })
    }
    /// Return true if the user's settings exist but couldn't be read. Saving is refused in that case,
    /// so as not to clobber them.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    pub fn save(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.failed_to_load,
            "Refusing to overwrite settings that failed to load"
        );
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let string = DOCUMENTATION.to_owned() + &toml::ser::to_string_pretty(self)?;
        std::fs::write(preferences, string)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Settings;

    #[test]
    fn partial_file_uses_defaults() {
        let settings: Settings = toml::from_str("autocommit = true").unwrap();
        assert!(settings.autocommit);
        assert_eq!(settings.root_kind, "Scene");
        assert_eq!(settings.log_level, log::LevelFilter::Info);
    }
    #[test]
    fn round_trips_through_toml() {
        let settings = Settings {
            prompt: "asset> ".into(),
            log_level: log::LevelFilter::Trace,
            ..Settings::default()
        };
        let text = toml::ser::to_string_pretty(&settings).unwrap();
        assert_eq!(toml::from_str::<Settings>(&text).unwrap(), settings);
    }
    #[test]
    fn missing_file_is_not_a_failure() {
        let path = std::env::temp_dir().join("assetdoc-surely-missing/settings.toml");
        assert!(!Settings::load_or_default(&path).did_fail_to_load());
    }
    #[test]
    fn garbage_file_is_a_failure() {
        let path = std::env::temp_dir().join(format!("assetdoc-garbage-{}.toml", std::process::id()));
        std::fs::write(&path, "log_level = [[[").unwrap();
        let settings = Settings::load_or_default(&path);
        let _ = std::fs::remove_file(&path);
        assert!(settings.did_fail_to_load());
        assert!(settings.save().is_err());
    }
}
