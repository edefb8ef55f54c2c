//! Literal placeholder substitution.
//!
//! Two placeholder styles are used: `{name}` in compile command arguments
//! and artifact stems, `${name}` in descriptor templates. Substitution is
//! plain string replacement; unknown placeholders are left untouched.

/// Placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `{name}`
    Braces,
    /// `${name}`
    Dollar,
}

impl PlaceholderStyle {
    fn token(&self, name: &str) -> String {
        match self {
            PlaceholderStyle::Braces => format!("{{{}}}", name),
            PlaceholderStyle::Dollar => format!("${{{}}}", name),
        }
    }
}

/// Replace each known placeholder in `text` with its value.
pub fn substitute(text: &str, style: PlaceholderStyle, vars: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    for (name, value) in vars {
        out = out.replace(&style.token(name), value);
    }
    out
}

/// Descriptor template variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorVars<'a> {
    pub version: &'a str,
    pub target: &'a str,
    pub companion_version: &'a str,
    pub loader_version: &'a str,
}

impl DescriptorVars<'_> {
    /// Render a descriptor template.
    pub fn render(&self, template: &str) -> String {
        substitute(
            template,
            PlaceholderStyle::Dollar,
            &[
                ("version", self.version),
                ("target", self.target),
                ("companionVersion", self.companion_version),
                ("loaderVersion", self.loader_version),
            ],
        )
    }
}
