use crate::core::{PostRenderHook, Record};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const UNKNOWN_TITLE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Placeholder {
    /// 固定文字，例如 🐕
    Text(String),
    /// 直接顯示標題欄位的值
    TitleColumn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailStyle {
    #[default]
    Plain,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLine {
    pub label: String,
    pub column: String,
    #[serde(default)]
    pub style: DetailStyle,
}

impl DetailLine {
    pub fn plain(label: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
            style: DetailStyle::Plain,
        }
    }

    pub fn underline(label: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
            style: DetailStyle::Underline,
        }
    }
}

/// 外部表單連結，`{name}` 會換成 URL 編碼後的名稱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    pub url_template: String,
}

impl CallToAction {
    pub fn href_for(&self, name: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
        self.url_template.replace("{name}", &encoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub title_column: String,
    pub image_column: String,
    pub placeholder: Placeholder,
    #[serde(default)]
    pub details: Vec<DetailLine>,
    #[serde(default)]
    pub description_column: Option<String>,
    /// 描述裡代表換行的記號（例如 `$$`）
    #[serde(default)]
    pub line_break_token: Option<String>,
    #[serde(default)]
    pub badge_column: Option<String>,
    #[serde(default)]
    pub collapsible_description: bool,
    #[serde(default)]
    pub call_to_action: Option<CallToAction>,
    pub empty_message: String,
}

impl CardTemplate {
    pub fn render_cards(&self, records: &[&Record]) -> String {
        if records.is_empty() {
            return format!(
                r#"<p style="text-align: center; width: 100%; padding: 40px;">{}</p>"#,
                escape_html(&self.empty_message)
            );
        }

        records
            .iter()
            .map(|record| self.render_card(record))
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn render_card(&self, record: &Record) -> String {
        let name = record.value(&self.title_column);
        let title = if name.is_empty() { UNKNOWN_TITLE } else { name };

        let mut html = String::from("\n        <div class=\"card\">\n            ");
        html.push_str(&self.render_image(record, name));
        html.push_str("\n            <div class=\"card-info\">\n");
        html.push_str(&format!(
            "                <h2 class=\"card-name\">{}</h2>\n",
            escape_html(title)
        ));

        for detail in &self.details {
            let value = record.value(&detail.column);
            if value.is_empty() {
                continue;
            }
            let class = match detail.style {
                DetailStyle::Plain => "card-detail",
                DetailStyle::Underline => "card-detail-underline",
            };
            html.push_str(&format!(
                "                <div class=\"{}\"><strong>{}:</strong> {}</div>\n",
                class,
                escape_html(&detail.label),
                escape_html(value)
            ));
        }

        if let Some(column) = &self.description_column {
            let description = record.value(column);
            if !description.is_empty() {
                html.push_str(&format!(
                    "                <div class=\"card-description\">{}</div>\n",
                    self.render_description(description)
                ));
                if self.collapsible_description {
                    html.push_str(
                        "                <button class=\"card-toggle\" type=\"button\">Show more</button>\n",
                    );
                }
            }
        }

        if let Some(column) = &self.badge_column {
            let badge = record.value(column);
            if !badge.is_empty() {
                html.push_str(&format!(
                    "                <span class=\"card-badge\">{}</span>\n",
                    escape_html(badge)
                ));
            }
        }

        if let Some(cta) = &self.call_to_action {
            html.push_str(&format!(
                "                <a class=\"card-cta\" href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>\n",
                escape_html(&cta.href_for(name)),
                escape_html(&cta.label)
            ));
        }

        html.push_str("            </div>\n        </div>\n    ");
        html
    }

    fn render_image(&self, record: &Record, name: &str) -> String {
        let image = record.value(&self.image_column);
        if !image.is_empty() {
            return format!(
                r#"<img src="{}" alt="{}" class="card-image">"#,
                escape_html(image),
                escape_html(name)
            );
        }

        let text = match &self.placeholder {
            Placeholder::Text(text) => text.as_str(),
            Placeholder::TitleColumn => name,
        };
        format!(
            r#"<div class="card-image placeholder">{}</div>"#,
            escape_html(text)
        )
    }

    fn render_description(&self, description: &str) -> String {
        let escaped = escape_html(description);
        match &self.line_break_token {
            Some(token) if !token.is_empty() => escaped.replace(&escape_html(token), "<br>"),
            _ => escaped,
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 沒有版面引擎可以量溢位，改用字數判斷：描述不超過門檻就拿掉「Show more」按鈕
pub struct CollapseToggleHook {
    max_chars: usize,
    pattern: Regex,
    tags: Regex,
}

impl CollapseToggleHook {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            pattern: Regex::new(
                r#"(<div class="card-description">((?:[^<]|<br>)*)</div>\n)\s*<button class="card-toggle"[^>]*>[^<]*</button>\n"#,
            )
            .expect("toggle pattern is valid"),
            tags: Regex::new(r"<[^>]+>").expect("tag pattern is valid"),
        }
    }

    fn visible_len(&self, inner: &str) -> usize {
        self.tags.replace_all(inner, "").chars().count()
    }
}

impl PostRenderHook for CollapseToggleHook {
    fn after_render(&self, markup: &mut String) {
        let replaced = self.pattern.replace_all(markup, |caps: &Captures| {
            if self.visible_len(&caps[2]) <= self.max_chars {
                caps[1].to_string()
            } else {
                caps[0].to_string()
            }
        });
        *markup = replaced.into_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog_template() -> CardTemplate {
        CardTemplate {
            title_column: "Name".into(),
            image_column: "Image_URL".into(),
            placeholder: Placeholder::Text("🐕".into()),
            details: vec![
                DetailLine::plain("Breed", "Breed"),
                DetailLine::plain("Age", "Age"),
            ],
            description_column: Some("Description".into()),
            line_break_token: None,
            badge_column: Some("Rescue_Name".into()),
            collapsible_description: false,
            call_to_action: None,
            empty_message: "No dogs found.".into(),
        }
    }

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_set_renders_placeholder_message() {
        let html = dog_template().render_cards(&[]);
        assert!(html.contains("No dogs found."));
        assert!(!html.contains("class=\"card\""));
    }

    #[test]
    fn test_card_with_image_and_details() {
        let record = rec(&[
            ("Name", "Rex"),
            ("Breed", "Labrador"),
            ("Age", ""),
            ("Image_URL", "https://img.example/rex.jpg"),
            ("Rescue_Name", "Paws of Coronado"),
        ]);
        let html = dog_template().render_cards(&[&record]);

        assert!(html.contains(r#"<img src="https://img.example/rex.jpg" alt="Rex" class="card-image">"#));
        assert!(html.contains("<h2 class=\"card-name\">Rex</h2>"));
        assert!(html.contains("<strong>Breed:</strong> Labrador"));
        assert!(!html.contains("<strong>Age:</strong>"));
        assert!(html.contains("<span class=\"card-badge\">Paws of Coronado</span>"));
        assert!(!html.contains("card-description"));
    }

    #[test]
    fn test_blank_name_is_unknown_and_placeholder_used() {
        let record = rec(&[("Name", "")]);
        let html = dog_template().render_card(&record);

        assert!(html.contains("<h2 class=\"card-name\">Unknown</h2>"));
        assert!(html.contains("<div class=\"card-image placeholder\">🐕</div>"));
    }

    #[test]
    fn test_title_column_placeholder() {
        let mut template = dog_template();
        template.placeholder = Placeholder::TitleColumn;
        let html = template.render_card(&rec(&[("Name", "Kayak Tour")]));
        assert!(html.contains("<div class=\"card-image placeholder\">Kayak Tour</div>"));
    }

    #[test]
    fn test_line_break_token_becomes_br() {
        let mut template = dog_template();
        template.line_break_token = Some("$$".into());
        let html = template.render_card(&rec(&[("Name", "Tour"), ("Description", "Line one$$Line two")]));
        assert!(html.contains("<div class=\"card-description\">Line one<br>Line two</div>"));
    }

    #[test]
    fn test_values_are_escaped() {
        let html = dog_template().render_card(&rec(&[("Name", "<script>alert('x')</script>")]));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_underline_detail_class() {
        let mut template = dog_template();
        template.details = vec![DetailLine::underline("Deal", "Deal")];
        let html = template.render_card(&rec(&[("Name", "Tour"), ("Deal", "10% off")]));
        assert!(html.contains("<div class=\"card-detail-underline\"><strong>Deal:</strong> 10% off</div>"));
    }

    #[test]
    fn test_call_to_action_interpolates_encoded_name() {
        let mut template = dog_template();
        template.call_to_action = Some(CallToAction {
            label: "Apply to foster".into(),
            url_template: "https://forms.example/apply?dog={name}".into(),
        });
        let html = template.render_card(&rec(&[("Name", "Sir Barks & Co")]));
        assert!(html.contains("href=\"https://forms.example/apply?dog=Sir+Barks+%26+Co\""));
        assert!(html.contains(">Apply to foster</a>"));
    }

    #[test]
    fn test_collapse_hook_drops_toggle_for_short_descriptions() {
        let mut template = dog_template();
        template.collapsible_description = true;
        let short = rec(&[("Name", "Rex"), ("Description", "Good boy")]);
        let text = "Very energetic. ".repeat(20);
        let long = rec(&[("Name", "Max"), ("Description", text.as_str())]);

        let mut html = template.render_cards(&[&short, &long]);
        assert_eq!(html.matches("card-toggle").count(), 2);

        CollapseToggleHook::new(100).after_render(&mut html);

        assert_eq!(html.matches("card-toggle").count(), 1);
        assert!(html.contains("Good boy</div>"));
        let max_card = html.split("<div class=\"card\">").nth(2).unwrap();
        assert!(max_card.contains("card-toggle"));
    }
}
