//! Named-placeholder substitution for reply and label templates.
//!
//! `{name}` is replaced by the matching value, `{{` and `}}` produce literal braces.
//! An unknown name or an unbalanced brace is a [`Error::Template`].

use tracing::warn;

use shutup_common::Error;

pub fn render(template: &str, values: &[(&str, String)]) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(Error::Template(format!(
                        "unterminated placeholder '{{{}' in '{}'",
                        name, template
                    )));
                }
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| {
                        Error::Template(format!("unknown placeholder '{{{}}}' in '{}'", name, template))
                    })?;
                out.push_str(value);
            }
            '}' => {
                return Err(Error::Template(format!("single '}}' in '{}'", template)));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Renders `template`, or logs a warning and renders `fallback` instead.
/// A fallback that fails as well is returned verbatim.
pub fn render_or(template: &str, values: &[(&str, String)], fallback: &str) -> String {
    match render(template, values) {
        Ok(s) => s,
        Err(e) => {
            warn!("Template rendering failed, using fallback: {}", e);
            render(fallback, values).unwrap_or_else(|_| fallback.to_string())
        }
    }
}
