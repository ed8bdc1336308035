// Welcome message template rendering
// Supported placeholders: {user}, {username}, {server}

/// Values available to a template. `None` leaves the placeholder verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    /// Mention syntax, e.g. `<@123>`
    pub mention: Option<&'a str>,
    /// Plain username without mention
    pub plain_name: Option<&'a str>,
    pub server_name: Option<&'a str>,
}

impl<'a> TemplateContext<'a> {
    fn lookup(&self, placeholder: &str) -> Option<&'a str> {
        match placeholder {
            "user" => self.mention,
            "username" => self.plain_name,
            "server" => self.server_name,
            _ => None,
        }
    }
}

/// Expand placeholders in a single pass.
///
/// Substituted values are never re-scanned, so a username containing
/// `{server}` stays literal. Unknown or unset placeholders and stray braces
/// are copied through unchanged.
pub fn render(template: &str, context: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match context.lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
