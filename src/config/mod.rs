mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./jobreel.toml",
        "./config.toml",
        "~/.config/jobreel/config.toml",
        "/etc/jobreel/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Expand `~` in configured directories.
fn expand_paths(config: &mut Config) {
    fn expand(path: &mut std::path::PathBuf) {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        *path = expanded.into();
    }
    expand(&mut config.work_dir);
    expand(&mut config.storage.output_dir);
    if let Some(font) = config.render.font_file.as_mut() {
        expand(font);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let render = &config.render;
    if render.width == 0 || render.height == 0 {
        anyhow::bail!("Render size cannot be 0");
    }
    if render.width % 2 != 0 || render.height % 2 != 0 {
        anyhow::bail!(
            "Render size {}x{} must be even for yuv420p",
            render.width,
            render.height
        );
    }
    if render.fps == 0 {
        anyhow::bail!("Render fps cannot be 0");
    }
    if render.scene_seconds == 0 || render.scene_seconds > MAX_SCENE_SECONDS {
        anyhow::bail!(
            "render.scene_seconds must be between 1 and {}",
            MAX_SCENE_SECONDS
        );
    }
    if render.default_scene_count == 0 || render.default_scene_count > MAX_SCENE_COUNT {
        anyhow::bail!(
            "render.default_scene_count must be between 1 and {}",
            MAX_SCENE_COUNT
        );
    }
    if render.end_card_seconds == 0 {
        anyhow::bail!("render.end_card_seconds cannot be 0");
    }
    if render.cta_text.trim().is_empty() {
        anyhow::bail!("render.cta_text cannot be empty");
    }
    if let Some(font) = &render.font_file {
        if !font.exists() {
            tracing::warn!("Font file does not exist: {:?}", font);
        }
    }

    if config.generation.max_poll_attempts == 0 {
        anyhow::bail!("generation.max_poll_attempts cannot be 0");
    }
    if config.generation.poll_interval_secs == 0 {
        tracing::warn!("generation.poll_interval_secs is 0; the poll loop will not pause");
    }

    if config.quality.min_fps <= 0.0 || config.quality.duration_tolerance_secs < 0.0 {
        anyhow::bail!("Quality thresholds must be positive");
    }

    if config.llm.resolved_api_key().is_none() {
        tracing::warn!(
            "No language model API key configured (set llm.api_key or {})",
            LLM_API_KEY_ENV
        );
    }

    Ok(())
}
