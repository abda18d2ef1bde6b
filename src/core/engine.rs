use crate::adapters::{HtmlPageSurface, HttpFeedSource};
use crate::config::deployment::DeploymentConfig;
use crate::core::board::{CatalogBoard, CatalogView, InputEvent};
use crate::core::catalog::CatalogLoader;
use crate::core::parser;
use crate::core::render::CollapseToggleHook;
use crate::core::{Criteria, Delimiter, FeedSource, Record};
use crate::utils::error::{CatalogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Html,
    Json,
    Csv,
    Tsv,
}

/// 一次執行的結果。HTML 模式下載入失敗仍會產生帶錯誤狀態的頁面。
#[derive(Debug)]
pub struct RenderedCatalog {
    pub content: String,
    pub total: usize,
    pub visible: usize,
    pub failure: Option<CatalogError>,
}

pub struct CatalogEngine<F: FeedSource> {
    deployment: DeploymentConfig,
    loader: CatalogLoader<F>,
}

impl CatalogEngine<HttpFeedSource> {
    pub fn from_deployment(deployment: DeploymentConfig) -> Self {
        let source = HttpFeedSource::new(deployment.feed.url.clone());
        Self::new(deployment, source)
    }
}

impl<F: FeedSource> CatalogEngine<F> {
    pub fn new(deployment: DeploymentConfig, source: F) -> Self {
        let loader = CatalogLoader::new(source, deployment.loader_settings());
        Self { deployment, loader }
    }

    fn build_view(&self) -> CatalogView {
        let view = CatalogView::new(
            self.deployment.filters.clone(),
            self.deployment.card.clone(),
        );
        match &self.deployment.collapse {
            Some(collapse) if self.deployment.card.collapsible_description => {
                view.with_hook(Box::new(CollapseToggleHook::new(collapse.max_chars)))
            }
            _ => view,
        }
    }

    fn build_surface(&self) -> HtmlPageSurface {
        let mut surface = HtmlPageSurface::new(self.deployment.page.clone());
        for column in &self.deployment.filters.categorical {
            surface = surface.with_select(
                column.clone(),
                format!("All {}", column.replace('_', " ")),
                Vec::new(),
            );
        }
        if let Some((column, labels)) = self.deployment.weight_options() {
            surface = surface.with_select(column, "All Sizes", labels);
        }
        surface
    }

    /// 頁面載入一次，再把條件當作輸入事件重播
    pub async fn run(&self, criteria: &Criteria, format: OutputFormat) -> Result<RenderedCatalog> {
        tracing::info!("🚀 Loading catalog from {}", self.loader_location());

        let mut board = CatalogBoard::new(self.build_view(), self.build_surface());

        if let Err(e) = board.load(&self.loader).await {
            if format != OutputFormat::Html || !e.is_load_failure() {
                return Err(e);
            }
            tracing::warn!("⚠️ Rendering error page: {}", e);
            return Ok(RenderedCatalog {
                content: board.into_surface().to_document(),
                total: 0,
                visible: 0,
                failure: Some(e),
            });
        }

        for event in criteria_events(criteria) {
            tracing::debug!("Dispatching {:?}", event);
            board.handle(event);
        }

        let total = board.catalog().len();
        let visible = board.visible().len();
        tracing::info!("✅ {} of {} records match", visible, total);

        let content = match format {
            OutputFormat::Html => {
                let mut surface = board.into_surface();
                surface.reflect_criteria(criteria, self.deployment.filters.weight_column.as_deref());
                surface.to_document()
            }
            OutputFormat::Json => {
                let columns = board.catalog().columns();
                let rows: Vec<_> = board
                    .visible()
                    .into_iter()
                    .map(|record| record.in_column_order(columns))
                    .collect();
                serde_json::to_string_pretty(&rows)?
            }
            OutputFormat::Csv => self.encode(&board, Delimiter::Comma)?,
            OutputFormat::Tsv => self.encode(&board, Delimiter::Tab)?,
        };

        Ok(RenderedCatalog {
            content,
            total,
            visible,
            failure: None,
        })
    }

    fn encode(&self, board: &CatalogBoard<HtmlPageSurface>, delimiter: Delimiter) -> Result<String> {
        let visible: Vec<&Record> = board.visible();
        parser::encode_records(board.catalog().columns(), visible, delimiter)
    }

    fn loader_location(&self) -> &str {
        if self.deployment.feed.url.is_empty() {
            "<unset>"
        } else {
            &self.deployment.feed.url
        }
    }
}

fn criteria_events(criteria: &Criteria) -> Vec<InputEvent> {
    let mut events = Vec::new();
    if !criteria.search.is_empty() {
        events.push(InputEvent::SearchInput(criteria.search.clone()));
    }
    for (column, value) in &criteria.selections {
        events.push(InputEvent::SelectChange {
            column: column.clone(),
            value: value.clone(),
        });
    }
    if !criteria.weight.is_empty() {
        events.push(InputEvent::WeightChange(criteria.weight.clone()));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct TextFeed(std::result::Result<&'static str, u16>);

    #[async_trait]
    impl FeedSource for TextFeed {
        async fn fetch(&self) -> Result<String> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(CatalogError::FetchError { status }),
            }
        }

        fn location(&self) -> &str {
            "memory://activities"
        }
    }

    const ACTIVITIES: &str = "Name\tBusiness\tCity\tDeal\tDescription\tImage\nKayak Tour\tBay Kayaks\tCoronado\t10% off\tPaddle$$Snack\t\nWine Tasting\tOld Town Cellars\tSan Diego\t\tFlights\t\n";

    #[test]
    fn test_criteria_events_skip_inactive() {
        let criteria = Criteria::new().with_selection("City", "Coronado");
        assert_eq!(
            criteria_events(&criteria),
            vec![InputEvent::SelectChange {
                column: "City".into(),
                value: "Coronado".into()
            }]
        );
        assert!(criteria_events(&Criteria::new()).is_empty());
    }

    #[tokio::test]
    async fn test_run_html_with_filter() {
        let engine = CatalogEngine::new(DeploymentConfig::activities(), TextFeed(Ok(ACTIVITIES)));
        let criteria = Criteria::new().with_selection("City", "Coronado");

        let rendered = engine.run(&criteria, OutputFormat::Html).await.unwrap();

        assert_eq!(rendered.total, 2);
        assert_eq!(rendered.visible, 1);
        assert!(rendered.failure.is_none());
        assert!(rendered.content.contains("Paddle<br>Snack"));
        assert!(rendered.content.contains("<div class=\"card-image placeholder\">Kayak Tour</div>"));
        assert!(!rendered.content.contains("Wine Tasting</h2>"));
        assert!(rendered.content.contains("<option value=\"Coronado\" selected>Coronado</option>"));
        assert!(rendered.content.contains("<option value=\"San Diego\">San Diego</option>"));
    }

    #[tokio::test]
    async fn test_run_tsv_export() {
        let engine = CatalogEngine::new(DeploymentConfig::activities(), TextFeed(Ok(ACTIVITIES)));
        let rendered = engine
            .run(&Criteria::new().with_search("wine"), OutputFormat::Tsv)
            .await
            .unwrap();

        assert_eq!(
            rendered.content,
            "Name\tBusiness\tCity\tDeal\tDescription\tImage\nWine Tasting\tOld Town Cellars\tSan Diego\t\tFlights\t\n"
        );
    }

    #[tokio::test]
    async fn test_run_json_keeps_header_order() {
        let engine = CatalogEngine::new(DeploymentConfig::activities(), TextFeed(Ok(ACTIVITIES)));
        let rendered = engine
            .run(&Criteria::new().with_search("kayak"), OutputFormat::Json)
            .await
            .unwrap();

        let keys: Vec<usize> = ["\"Name\"", "\"Business\"", "\"City\"", "\"Deal\"", "\"Description\"", "\"Image\""]
            .iter()
            .map(|key| rendered.content.find(key).unwrap())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(rendered.visible, 1);
    }

    #[tokio::test]
    async fn test_run_failure_html_vs_json() {
        let engine = CatalogEngine::new(DeploymentConfig::activities(), TextFeed(Err(500)));

        let rendered = engine.run(&Criteria::new(), OutputFormat::Html).await.unwrap();
        assert!(matches!(rendered.failure, Some(CatalogError::FetchError { status: 500 })));
        assert!(rendered.content.contains("Failed to load activities. Please try again later."));
        assert!(!rendered.content.contains("class=\"card\""));

        let err = engine.run(&Criteria::new(), OutputFormat::Json).await.unwrap_err();
        assert!(matches!(err, CatalogError::FetchError { status: 500 }));
    }
}
