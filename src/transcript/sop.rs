use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The weather lookup and report procedure used when no SOP file is given.
pub const EXAMPLE_SOP: &str = "\
Please perform the following SOP:
1. Open https://www.accuweather.com/en/in/hyderabad/202190/weather-forecast/202190 in the browser.
2. Check what is the weather in Hyderabad wait until you get the weather in Hyderabad, if you are not able to fetch the data using elements try to read the html text and get the data.
3. Run a shell command to list files in the current directory.
4. Fetch the page title and weather in Hyderabad and create a markdown file with the title and weather in the current directory.
";

/// Immutable SOP text attached to a run.
///
/// Cloning shares the same buffer; there is no way to mutate it after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SopDocument(Arc<str>);

impl SopDocument {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref().trim()))
    }

    pub fn example() -> Self {
        Self::new(EXAMPLE_SOP)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SOP file {}", path.display()))?;
        if text.trim().is_empty() {
            anyhow::bail!("SOP file {} is empty", path.display());
        }
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SopDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
