// Formatting utilities

use chrono::{DateTime, Utc};

/// Truncate string to max characters, appending "..." when cut
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Discord relative timestamp markup (e.g. "3 days ago" client side)
pub fn relative_timestamp(at: &DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

/// Format a 24-bit color as `#rrggbb`
pub fn format_color(color: u32) -> String {
    format!("#{:06x}", color)
}

pub fn channel_mention(id: u64) -> String {
    format!("<#{}>", id)
}

pub fn role_mention(id: u64) -> String {
    format!("<@&{}>", id)
}

/// Wrap text in a code block, truncated
pub fn code_block(s: &str, max_chars: usize) -> String {
    format!("```{}```", truncate(s, max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello...");
        assert_eq!(truncate("🎉🎉🎉", 2), "🎉🎉...");
    }

    #[test]
    fn test_relative_timestamp() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(relative_timestamp(&at), "<t:1700000000:R>");
    }

    #[test]
    fn test_format_color() {
        assert_eq!(format_color(0x00ff00), "#00ff00");
        assert_eq!(format_color(0xff00aa), "#ff00aa");
    }

    #[test]
    fn test_mentions() {
        assert_eq!(channel_mention(5), "<#5>");
        assert_eq!(role_mention(7), "<@&7>");
    }
}
