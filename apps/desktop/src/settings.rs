use std::{collections::HashMap, fs};

#[derive(Debug)]
pub struct Settings {
    pub server_url: String,
    pub share_origin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8090".into(),
            share_origin: "http://127.0.0.1:8090".into(),
        }
    }
}

/// Defaults, overridden by `dashboard.toml`, overridden by environment
/// variables. CLI flags take final precedence at the call site.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("dashboard.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("share_origin") {
                settings.share_origin = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("DASHBOARD_SHARE_ORIGIN") {
        settings.share_origin = v;
    }

    settings
}
