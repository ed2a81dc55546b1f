use super::Command;
use crate::error::Error;
use arbor_core::preferences::Preferences;
use async_trait::async_trait;
use eyre::Result;
use std::io::Write;

pub struct PreferencesCommand {
    pub action: PreferencesAction,
}

pub enum PreferencesAction {
    Show,
    Path,
    Reset,
}

#[async_trait]
impl Command for PreferencesCommand {
    async fn execute(&self) -> Result<()> {
        match &self.action {
            PreferencesAction::Show => self.show().await.map_err(Into::into),
            PreferencesAction::Path => self.path().await.map_err(Into::into),
            PreferencesAction::Reset => self.reset().await.map_err(Into::into),
        }
    }
}

impl PreferencesCommand {
    async fn show(&self) -> std::result::Result<(), Error> {
        let prefs = Preferences::load()?;
        let path = Preferences::config_path()?;

        let mut stdout = std::io::stdout();
        writeln!(stdout, "Preferences file: {}", path.display())?;
        writeln!(stdout, "\n{}", render(&prefs)?)?;
        Ok(())
    }

    async fn path(&self) -> std::result::Result<(), Error> {
        let path = Preferences::config_path()?;
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", path.display())?;
        Ok(())
    }

    async fn reset(&self) -> std::result::Result<(), Error> {
        let path = Preferences::config_path()?;

        let mut stdout = std::io::stdout();
        if path.exists() {
            std::fs::remove_file(&path)?;
            writeln!(stdout, "Preferences reset to defaults")?;
        } else {
            writeln!(stdout, "No preferences file found")?;
        }
        Ok(())
    }
}

fn render(prefs: &Preferences) -> std::result::Result<String, Error> {
    Ok(toml::to_string_pretty(prefs)?)
}
