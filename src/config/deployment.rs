use crate::core::catalog::LoaderSettings;
use crate::core::filter::{FilterSpec, WeightBucket};
use crate::core::parser::RowFilter;
use crate::core::render::{CardTemplate, DetailLine, Placeholder};
use crate::core::Delimiter;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ACTIVITIES_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSci-XCd0ne906VzOafwYm2k4P6i32G5dhZNUkvT0qxYGSmjOCpD5VIZ4rVB_fxuuNvBLjf8stmKbBu/pub?gid=1773829289&single=true&output=tsv";

/// 一個部署：資料來源 + 篩選欄位 + 卡片模板
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub page: PageConfig,
    pub feed: FeedConfig,
    pub filters: FilterSpec,
    pub card: CardTemplate,
    #[serde(default)]
    pub collapse: Option<CollapseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub title: String,
    pub heading: String,
    pub search_placeholder: String,
    pub error_message: String,
    pub stylesheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub url: String,
    pub delimiter: Delimiter,
    pub inclusion: Option<RowFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapseConfig {
    pub max_chars: usize,
}

impl DeploymentConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CatalogError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CatalogError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SHEET_URL})，找不到就保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CatalogError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 寄養狗狗名單：逗號分隔，只顯示 Available == Yes。
    ///
    /// 申請表連結因救援單位而異，預設不帶；用 `--cta-url` 或部署檔的
    /// `card.call_to_action` 設定。
    pub fn dogs() -> Self {
        Self {
            page: PageConfig {
                title: "Foster Dogs".to_string(),
                heading: "Dogs Looking for a Foster".to_string(),
                search_placeholder: "Search by name, breed, or description...".to_string(),
                error_message: "Failed to load dogs. Please try again later.".to_string(),
                stylesheet: Some("style.css".to_string()),
            },
            feed: FeedConfig {
                url: String::new(),
                delimiter: Delimiter::Comma,
                inclusion: Some(RowFilter::column_equals("Available", "Yes")),
            },
            filters: FilterSpec {
                search_columns: vec![
                    "Name".to_string(),
                    "Breed".to_string(),
                    "Description".to_string(),
                ],
                categorical: vec![
                    "Rescue_Name".to_string(),
                    "Gender".to_string(),
                    "Size".to_string(),
                ],
                weight_column: Some("Weight".to_string()),
            },
            card: CardTemplate {
                title_column: "Name".to_string(),
                image_column: "Image_URL".to_string(),
                placeholder: Placeholder::Text("🐕".to_string()),
                details: vec![
                    DetailLine::plain("Breed", "Breed"),
                    DetailLine::plain("Age", "Age"),
                    DetailLine::plain("Gender", "Gender"),
                    DetailLine::plain("Size", "Size"),
                    DetailLine::plain("Weight", "Weight"),
                    DetailLine::plain("Location", "Location"),
                ],
                description_column: Some("Description".to_string()),
                line_break_token: None,
                badge_column: Some("Rescue_Name".to_string()),
                collapsible_description: true,
                call_to_action: None,
                empty_message: "No dogs found.".to_string(),
            },
            collapse: Some(CollapseConfig { max_chars: 180 }),
        }
    }

    /// 在地活動優惠：Tab 分隔，描述用 `$$` 換行
    pub fn activities() -> Self {
        Self {
            page: PageConfig {
                title: "Activities".to_string(),
                heading: "Local Activities & Deals".to_string(),
                search_placeholder: "Search activities...".to_string(),
                error_message: "Failed to load activities. Please try again later.".to_string(),
                stylesheet: Some("style.css".to_string()),
            },
            feed: FeedConfig {
                url: ACTIVITIES_SHEET_URL.to_string(),
                delimiter: Delimiter::Tab,
                inclusion: None,
            },
            filters: FilterSpec {
                search_columns: vec![
                    "Name".to_string(),
                    "Business".to_string(),
                    "Description".to_string(),
                ],
                categorical: vec!["City".to_string()],
                weight_column: None,
            },
            card: CardTemplate {
                title_column: "Name".to_string(),
                image_column: "Image".to_string(),
                placeholder: Placeholder::TitleColumn,
                details: vec![
                    DetailLine::plain("Business", "Business"),
                    DetailLine::plain("City", "City"),
                    DetailLine::underline("Deal", "Deal"),
                ],
                description_column: Some("Description".to_string()),
                line_break_token: Some("$$".to_string()),
                badge_column: None,
                collapsible_description: false,
                call_to_action: None,
                empty_message: "No activities found.".to_string(),
            },
            collapse: None,
        }
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            delimiter: self.feed.delimiter,
            row_filter: self.feed.inclusion.clone(),
            option_columns: self.filters.categorical.clone(),
            error_message: self.page.error_message.clone(),
        }
    }

    /// 體重分級選單的固定選項
    pub fn weight_options(&self) -> Option<(String, Vec<String>)> {
        self.filters
            .weight_column
            .as_ref()
            .map(|column| (column.clone(), WeightBucket::labels()))
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(CatalogError::MissingConfigError {
                field: "feed.url".to_string(),
            });
        }
        validation::validate_url("feed.url", &self.feed.url)?;

        if let Some(RowFilter::ColumnEquals { column, .. }) = &self.feed.inclusion {
            validation::validate_non_empty_string("feed.inclusion.column", column)?;
        }

        validation::validate_unique_columns("filters.search_columns", &self.filters.search_columns)?;
        validation::validate_unique_columns("filters.categorical", &self.filters.categorical)?;
        if let Some(column) = &self.filters.weight_column {
            validation::validate_non_empty_string("filters.weight_column", column)?;
        }

        validation::validate_non_empty_string("card.title_column", &self.card.title_column)?;
        validation::validate_non_empty_string("card.image_column", &self.card.image_column)?;

        if let Some(cta) = &self.card.call_to_action {
            if !cta.url_template.contains("{name}") {
                return Err(CatalogError::InvalidConfigValueError {
                    field: "card.call_to_action.url_template".to_string(),
                    value: cta.url_template.clone(),
                    reason: "Template must contain a {name} placeholder".to_string(),
                });
            }
            validation::validate_url(
                "card.call_to_action.url_template",
                &cta.url_template.replace("{name}", "x"),
            )?;
        }

        if let Some(collapse) = &self.collapse {
            if collapse.max_chars == 0 {
                return Err(CatalogError::InvalidConfigValueError {
                    field: "collapse.max_chars".to_string(),
                    value: "0".to_string(),
                    reason: "Value must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for DeploymentConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
