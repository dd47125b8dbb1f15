//! Configuration templates for `ftq init`.
//!
//! Templates are kept as complete TOML files and handed out with every setting commented, so a
//! fresh config changes nothing until the user opts in.

/// Local configuration template.
const LOCAL_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Global configuration template.
const GLOBAL_TEMPLATE: &str = include_str!("../templates/config-global.toml");

/// Returns the template for a project `.ftq.toml`.
pub fn local_template() -> String {
    comment_settings(LOCAL_TEMPLATE)
}

/// Returns the template for `~/.ftq.toml`.
pub fn global_template() -> String {
    comment_settings(GLOBAL_TEMPLATE)
}

/// Comments out every key-value line of `template`.
///
/// Comments, blank lines and `[section]` headers are kept as they are, so the result is still
/// a valid config with empty sections.
fn comment_settings(template: &str) -> String {
    let mut result = String::with_capacity(template.len() + template.lines().count() * 2);
    for line in template.lines() {
        let keep = line.is_empty() || line.starts_with('#') || line.starts_with('[');
        if !keep {
            result.push_str("# ");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}
