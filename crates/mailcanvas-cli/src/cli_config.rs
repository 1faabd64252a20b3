use log::warn;
use mailcanvas_render::RenderConfig;

fn usize_setting(section: &toml::Value, key: &str, default: usize) -> usize {
    match section.get(key) {
        Some(v) => v
            .as_integer()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(default),
        None => default,
    }
}

/// `[render]` settings from `content`, then `MAILCANVAS_*` overrides from
/// `env`. Anything missing or malformed keeps its default.
pub(crate) fn load_render_config<F>(content: Option<&str>, env: F) -> RenderConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RenderConfig::default();
    if let Some(content) = content {
        match toml::from_str::<toml::Value>(content) {
            Ok(value) => {
                if let Some(render) = value.get("render") {
                    config.panel_width = usize_setting(render, "panel_width", config.panel_width);
                    config.preview_chars =
                        usize_setting(render, "preview_chars", config.preview_chars);
                    config.subject_max = usize_setting(render, "subject_max", config.subject_max);
                    config.id_prefix = usize_setting(render, "id_prefix", config.id_prefix);
                    config.own_address = render
                        .get("own_address")
                        .and_then(|v| v.as_str())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                }
            }
            Err(err) => warn!("ignoring unreadable config: {}", err),
        }
    }

    if let Some(width) = env("MAILCANVAS_PANEL_WIDTH") {
        match width.trim().parse::<usize>() {
            Ok(width) => config.panel_width = width,
            Err(_) => warn!("ignoring MAILCANVAS_PANEL_WIDTH={:?}", width),
        }
    }
    if let Some(address) = env("MAILCANVAS_OWN_ADDRESS").filter(|s| !s.trim().is_empty()) {
        config.own_address = Some(address.trim().to_string());
    }
    config
}
