use carousel::EscapedKey;
use derive_more::{AsRef, Deref, Display};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, AsRef)]
pub struct CaseUrl(String);

impl CaseUrl {
    pub fn new(site_url: &str, key: &EscapedKey) -> Self {
        Self(format!("{}/case/{}", site_url.trim_end_matches('/'), key))
    }
}

#[derive(Debug, Error)]
pub enum NavigateError {
    #[error("Refusing to open '{0}': not a web or file URL")]
    Scheme(CaseUrl),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn open_case(url: &CaseUrl) -> Result<(), NavigateError> {
    if !["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
    {
        return Err(NavigateError::Scheme(url.clone()));
    }

    Command::new("xdg-open")
        .arg(url.as_str())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    log::info!("Opened {}", url);
    Ok(())
}
