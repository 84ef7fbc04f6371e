//! `nix-cache-info` marker object: `Key: Value` lines.

/// Parsed marker object. Every field is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub store_dir: Option<String>,
    pub want_mass_query: Option<bool>,
    pub priority: Option<i64>,
}

impl CacheInfo {
    /// Minimal marker written when initialising an empty cache.
    pub fn for_store_dir(store_dir: &str) -> Self {
        Self {
            store_dir: Some(store_dir.to_string()),
            ..Self::default()
        }
    }

    /// Parse a marker body. Never fails: a present marker is enough to
    /// accept the endpoint, so odd values are logged and treated leniently.
    /// `WantMassQuery` is true only for `1`; an unparseable `Priority` is
    /// skipped.
    pub fn parse(text: &str) -> Self {
        let mut info = CacheInfo::default();
        for line in text.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim() {
                "StoreDir" => info.store_dir = Some(value.to_string()),
                "WantMassQuery" => {
                    if value != "1" && value != "0" {
                        tracing::warn!(value, "unexpected WantMassQuery in nix-cache-info, treating as 0");
                    }
                    info.want_mass_query = Some(value == "1");
                }
                "Priority" => match value.parse::<i64>() {
                    Ok(priority) => info.priority = Some(priority),
                    Err(_) => {
                        tracing::warn!(value, "ignoring unparseable Priority in nix-cache-info");
                    }
                },
                _ => {}
            }
        }
        info
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(dir) = &self.store_dir {
            out.push_str(&format!("StoreDir: {dir}\n"));
        }
        if let Some(mass) = self.want_mass_query {
            out.push_str(&format!("WantMassQuery: {}\n", u8::from(mass)));
        }
        if let Some(priority) = self.priority {
            out.push_str(&format!("Priority: {priority}\n"));
        }
        out
    }
}
