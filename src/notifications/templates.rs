//! Change message templates
//!
//! The `.html` template is autoescaped by tera and used for transports that
//! render Telegram-style HTML; the `.txt` template is for plain logs.

use tera::{Context, Tera};

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::event::ChangeNotification;

pub const CHANGE_HTML: &str = "change.html";
pub const CHANGE_TEXT: &str = "change.txt";

const CHANGE_HTML_TEMPLATE: &str = r#"🔔 <b>Content Changed!</b>

<b>Website:</b> {{ label }}
<b>URL:</b> {{ url }}
<b>XPath:</b> <code>{{ selector }}</code>

<b>Previous content:</b>
{{ previous }}

<b>New content:</b>
{{ current }}

<b>Updated:</b> {{ timestamp }}"#;

const CHANGE_TEXT_TEMPLATE: &str = r#"Content changed for {{ label }} ({{ url }})
XPath: {{ selector }}
Previous: {{ previous }}
New: {{ current }}
Updated: {{ timestamp }}"#;

/// Renders change notifications into message text
pub struct MessageRenderer {
    tera: Tera,
}

impl MessageRenderer {
    pub fn new() -> NotificationResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (CHANGE_HTML, CHANGE_HTML_TEMPLATE),
            (CHANGE_TEXT, CHANGE_TEXT_TEMPLATE),
        ])
        .map_err(|e| NotificationError::Template {
            template: "built-in templates".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, change: &ChangeNotification) -> NotificationResult<String> {
        let mut context = Context::new();
        context.insert("label", change.display_label());
        context.insert("url", &change.url);
        context.insert("selector", &change.selector);
        context.insert("previous", change.display_previous());
        context.insert("current", &change.new_content);
        context.insert(
            "timestamp",
            &change.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        context.insert("item_id", &change.item_id);

        self.tera
            .render(template, &context)
            .map_err(|e| NotificationError::Template {
                template: template.to_string(),
                message: e.to_string(),
            })
    }
}
