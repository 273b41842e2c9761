use anyhow::{Context, Result};
use products_hr::{TraversalLimits, reporting::DEFAULT_MAX_DEPTH};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    pub max_reporting_depth: usize,
    pub seed_on_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: Vec::new(),
            max_reporting_depth: DEFAULT_MAX_DEPTH,
            seed_on_start: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let max_reporting_depth = match std::env::var("HR_MAX_REPORTING_DEPTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .with_context(|| format!("invalid HR_MAX_REPORTING_DEPTH {raw:?}"))?,
            Err(_) => DEFAULT_MAX_DEPTH,
        };

        let seed_on_start = std::env::var("SEED_ON_START")
            .ok()
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            cors_allowed_origins,
            max_reporting_depth,
            seed_on_start,
        })
    }

    pub fn traversal_limits(&self) -> TraversalLimits {
        TraversalLimits {
            max_depth: self.max_reporting_depth,
        }
    }
}
