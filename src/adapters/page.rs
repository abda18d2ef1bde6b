use crate::config::deployment::PageConfig;
use crate::core::render::escape_html;
use crate::core::{Criteria, UiSurface};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl {
    pub column: String,
    pub label: String,
    pub values: Vec<String>,
    pub selected: String,
}

/// 把四個畫面區塊收集起來，最後輸出成一份靜態 HTML
#[derive(Debug, Clone)]
pub struct HtmlPageSurface {
    page: PageConfig,
    loading: bool,
    error: Option<String>,
    search: String,
    selects: Vec<SelectControl>,
    grid: Option<String>,
    generated_at: DateTime<Utc>,
}

impl HtmlPageSurface {
    pub fn new(page: PageConfig) -> Self {
        Self {
            page,
            loading: false,
            error: None,
            search: String::new(),
            selects: Vec::new(),
            grid: None,
            generated_at: Utc::now(),
        }
    }

    /// 預先宣告一個下拉選單（選項可以之後由 loader 填入）
    pub fn with_select(mut self, column: impl Into<String>, label: impl Into<String>, values: Vec<String>) -> Self {
        self.selects.push(SelectControl {
            column: column.into(),
            label: label.into(),
            values,
            selected: String::new(),
        });
        self
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// 讓輸出的頁面顯示目前的搜尋字與選取值
    pub fn reflect_criteria(&mut self, criteria: &Criteria, weight_column: Option<&str>) {
        self.search = criteria.search.clone();
        for select in &mut self.selects {
            select.selected = match criteria.selections.get(&select.column) {
                Some(value) => value.clone(),
                None if weight_column == Some(select.column.as_str()) => criteria.weight.clone(),
                None => String::new(),
            };
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn grid(&self) -> Option<&str> {
        self.grid.as_deref()
    }

    pub fn options(&self, column: &str) -> Option<&[String]> {
        self.selects
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.values.as_slice())
    }

    pub fn to_document(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        html.push_str(&format!("    <title>{}</title>\n", escape_html(&self.page.title)));
        if let Some(stylesheet) = &self.page.stylesheet {
            html.push_str(&format!(
                "    <link rel=\"stylesheet\" href=\"{}\">\n",
                escape_html(stylesheet)
            ));
        }
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("    <h1>{}</h1>\n", escape_html(&self.page.heading)));

        html.push_str("    <div class=\"filters\">\n");
        html.push_str(&format!(
            "        <input type=\"text\" id=\"search\" placeholder=\"{}\" value=\"{}\">\n",
            escape_html(&self.page.search_placeholder),
            escape_html(&self.search)
        ));
        for select in &self.selects {
            html.push_str(&render_select(select));
        }
        html.push_str("    </div>\n");

        html.push_str(&format!(
            "    <div id=\"loading\" style=\"display: {}\">Loading...</div>\n",
            display(self.loading)
        ));
        html.push_str(&format!(
            "    <div id=\"error\" style=\"display: {}\">{}</div>\n",
            display(self.error.is_some()),
            escape_html(self.error.as_deref().unwrap_or(""))
        ));
        html.push_str(&format!(
            "    <div id=\"grid\" class=\"grid\">{}</div>\n",
            self.grid.as_deref().unwrap_or("")
        ));

        html.push_str(&format!(
            "    <footer>Last updated {}</footer>\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        html.push_str("</body>\n</html>\n");
        html
    }
}

fn display(visible: bool) -> &'static str {
    if visible {
        "block"
    } else {
        "none"
    }
}

fn render_select(select: &SelectControl) -> String {
    let id = format!("{}-filter", select.column.to_lowercase().replace(['_', ' '], "-"));
    let mut html = format!(
        "        <select id=\"{}\" name=\"{}\">\n            <option value=\"\">{}</option>\n",
        escape_html(&id),
        escape_html(&select.column),
        escape_html(&select.label)
    );
    for value in &select.values {
        let selected = if *value == select.selected { " selected" } else { "" };
        html.push_str(&format!(
            "            <option value=\"{0}\"{1}>{0}</option>\n",
            escape_html(value),
            selected
        ));
    }
    html.push_str("        </select>\n");
    html
}

impl UiSurface for HtmlPageSurface {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn publish_options(&mut self, column: &str, values: &[String]) {
        match self.selects.iter_mut().find(|s| s.column == column) {
            Some(select) => select.values = values.to_vec(),
            None => self.selects.push(SelectControl {
                column: column.to_string(),
                label: format!("All {}", column.replace('_', " ")),
                values: values.to_vec(),
                selected: String::new(),
            }),
        }
    }

    fn render_grid(&mut self, markup: &str) {
        self.grid = Some(markup.to_string());
    }
}
