use crate::core::board::CatalogView;
use crate::core::parser::{self, RowFilter};
use crate::core::{Criteria, Delimiter, FeedSource, ParsedFeed, Record, UiSurface};
use crate::domain::model::FilterOptions;
use crate::utils::error::Result;
use std::collections::HashSet;

/// 本次 session 的完整資料。只有 CatalogLoader 能整批替換，不做局部修改。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 某欄位中不重複、非空的值，依首次出現的順序
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.value(column))
            .filter(|value| !value.is_empty() && seen.insert(*value))
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn replace(&mut self, feed: ParsedFeed) {
        self.columns = feed.columns;
        self.records = feed.records;
    }
}

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub delimiter: Delimiter,
    pub row_filter: Option<RowFilter>,
    pub option_columns: Vec<String>,
    pub error_message: String,
}

pub struct CatalogLoader<F: FeedSource> {
    source: F,
    settings: LoaderSettings,
}

impl<F: FeedSource> CatalogLoader<F> {
    pub fn new(source: F, settings: LoaderSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// 抓取 → 解析 → 替換 Catalog → 填選項 → 渲染全部。
    ///
    /// 任何一步失敗都只顯示同一句錯誤訊息，Catalog 保持原狀，不重試。
    pub async fn load<S: UiSurface + ?Sized>(
        &self,
        catalog: &mut Catalog,
        view: &CatalogView,
        surface: &mut S,
    ) -> Result<usize> {
        surface.set_loading(true);
        surface.clear_error();

        let feed = match self.fetch_and_parse().await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!("❌ Error loading catalog from {}: {}", self.source.location(), e);
                surface.set_loading(false);
                surface.show_error(&self.settings.error_message);
                return Err(e);
            }
        };

        catalog.replace(feed);
        tracing::info!("📦 Catalog replaced with {} records", catalog.len());

        for options in self.derive_options(catalog) {
            tracing::debug!(
                "Publishing {} options for column '{}'",
                options.values.len(),
                options.column
            );
            surface.publish_options(&options.column, &options.values);
        }

        let visible = view.refresh(catalog, &Criteria::default(), &mut *surface);
        surface.set_loading(false);

        Ok(visible)
    }

    async fn fetch_and_parse(&self) -> Result<ParsedFeed> {
        tracing::debug!("Fetching feed from: {}", self.source.location());
        let text = self.source.fetch().await?;
        tracing::debug!("Received {} bytes", text.len());

        Ok(parser::parse_with_filter(
            &text,
            self.settings.delimiter,
            self.settings.row_filter.as_ref(),
        ))
    }

    fn derive_options(&self, catalog: &Catalog) -> Vec<FilterOptions> {
        self.settings
            .option_columns
            .iter()
            .map(|column| FilterOptions {
                column: column.clone(),
                values: catalog.distinct_values(column),
            })
            .collect()
    }
}
