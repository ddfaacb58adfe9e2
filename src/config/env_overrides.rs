use super::Config;

/// A set, non-empty `SOP_CRITIC_*` variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Environment beats the file. Unparseable or out-of-range values are
    /// ignored so `validate` still sees the file's settings.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env_value("SOP_CRITIC_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = env_value("SOP_CRITIC_MODEL") {
            self.llm.model = model;
        }
        if let Some(workspace) = env_value("SOP_CRITIC_WORKSPACE") {
            self.tools.workspace_dir = workspace;
        }

        if let Some(revisions) = env_value("SOP_CRITIC_MAX_REVISIONS")
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|revisions| *revisions > 0)
        {
            self.control.max_revisions = revisions;
        }

        if let Some(temperature) = env_value("SOP_CRITIC_TEMPERATURE")
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|temperature| (0.0..=2.0).contains(temperature))
        {
            self.llm.temperature = temperature;
        }
    }
}
