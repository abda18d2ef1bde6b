use crate::core::catalog::{Catalog, CatalogLoader};
use crate::core::filter::{Criteria, FilterSpec};
use crate::core::render::CardTemplate;
use crate::core::{FeedSource, PostRenderHook, Record, UiSurface};
use crate::utils::error::Result;
use std::collections::HashMap;

/// 篩選 + 模板 + 渲染後處理。只讀 Catalog。
pub struct CatalogView {
    pub filters: FilterSpec,
    pub template: CardTemplate,
    hooks: Vec<Box<dyn PostRenderHook>>,
}

impl CatalogView {
    pub fn new(filters: FilterSpec, template: CardTemplate) -> Self {
        Self {
            filters,
            template,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn PostRenderHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn visible<'a>(&self, catalog: &'a Catalog, criteria: &Criteria) -> Vec<&'a Record> {
        self.filters.apply(catalog.records(), criteria)
    }

    pub fn render(&self, records: &[&Record]) -> String {
        let mut markup = self.template.render_cards(records);
        for hook in &self.hooks {
            hook.after_render(&mut markup);
        }
        markup
    }

    /// 從完整 Catalog 重新計算並整個重畫，回傳可見筆數
    pub fn refresh<S: UiSurface + ?Sized>(
        &self,
        catalog: &Catalog,
        criteria: &Criteria,
        surface: &mut S,
    ) -> usize {
        let visible = self.visible(catalog, criteria);
        tracing::debug!("Rendering {} of {} records", visible.len(), catalog.len());
        surface.render_grid(&self.render(&visible));
        visible.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    SearchInput(String),
    SelectChange { column: String, value: String },
    WeightChange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SearchInput,
    SelectChange,
    WeightChange,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::SearchInput(_) => EventKind::SearchInput,
            InputEvent::SelectChange { .. } => EventKind::SelectChange,
            InputEvent::WeightChange(_) => EventKind::WeightChange,
        }
    }
}

pub type Handler = Box<dyn Fn(&InputEvent, &mut Criteria) + Send + Sync>;

/// 單執行緒的事件分派：依序執行已註冊的 handler
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 搜尋框、下拉選單、體重分級三種標準輸入
    pub fn with_default_handlers() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(
            EventKind::SearchInput,
            Box::new(|event: &InputEvent, criteria: &mut Criteria| {
                if let InputEvent::SearchInput(term) = event {
                    criteria.search = term.clone();
                }
            }),
        );
        dispatcher.register(
            EventKind::SelectChange,
            Box::new(|event: &InputEvent, criteria: &mut Criteria| {
                if let InputEvent::SelectChange { column, value } = event {
                    criteria.selections.insert(column.clone(), value.clone());
                }
            }),
        );
        dispatcher.register(
            EventKind::WeightChange,
            Box::new(|event: &InputEvent, criteria: &mut Criteria| {
                if let InputEvent::WeightChange(bucket) = event {
                    criteria.weight = bucket.clone();
                }
            }),
        );
        dispatcher
    }

    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// 沒有任何 handler 時回傳 false，呼叫端就不用重畫
    pub fn dispatch(&self, event: &InputEvent, criteria: &mut Criteria) -> bool {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            return false;
        };
        for handler in handlers {
            handler(event, criteria);
        }
        !handlers.is_empty()
    }
}

/// 一個頁面的完整狀態：Catalog、目前條件、事件分派與畫面
pub struct CatalogBoard<S: UiSurface> {
    catalog: Catalog,
    criteria: Criteria,
    view: CatalogView,
    dispatcher: Dispatcher,
    surface: S,
}

impl<S: UiSurface> CatalogBoard<S> {
    pub fn new(view: CatalogView, surface: S) -> Self {
        Self::with_dispatcher(view, surface, Dispatcher::with_default_handlers())
    }

    pub fn with_dispatcher(view: CatalogView, surface: S, dispatcher: Dispatcher) -> Self {
        Self {
            catalog: Catalog::new(),
            criteria: Criteria::default(),
            view,
            dispatcher,
            surface,
        }
    }

    /// 成功才清空條件；失敗時畫面與條件都維持上一次的狀態
    pub async fn load<F: FeedSource>(&mut self, loader: &CatalogLoader<F>) -> Result<usize> {
        let visible = loader
            .load(&mut self.catalog, &self.view, &mut self.surface)
            .await?;
        self.criteria = Criteria::default();
        Ok(visible)
    }

    /// 處理一個輸入事件並從完整 Catalog 重新篩選
    pub fn handle(&mut self, event: InputEvent) -> Option<usize> {
        if !self.dispatcher.dispatch(&event, &mut self.criteria) {
            tracing::debug!("No handler registered for {:?}", event.kind());
            return None;
        }
        Some(
            self.view
                .refresh(&self.catalog, &self.criteria, &mut self.surface),
        )
    }

    pub fn visible(&self) -> Vec<&Record> {
        self.view.visible(&self.catalog, &self.criteria)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::LoaderSettings;
    use crate::core::render::Placeholder;
    use crate::core::Delimiter;
    use crate::utils::error::CatalogError;
    use async_trait::async_trait;

    struct TextFeed(&'static str);

    struct DownFeed;

    #[async_trait]
    impl FeedSource for DownFeed {
        async fn fetch(&self) -> Result<String> {
            Err(CatalogError::FetchError { status: 500 })
        }

        fn location(&self) -> &str {
            "memory://down"
        }
    }

    #[async_trait]
    impl FeedSource for TextFeed {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn location(&self) -> &str {
            "memory://dogs"
        }
    }

    #[derive(Default)]
    struct GridOnly {
        renders: usize,
        grid: String,
    }

    impl UiSurface for GridOnly {
        fn set_loading(&mut self, _loading: bool) {}
        fn clear_error(&mut self) {}
        fn show_error(&mut self, _message: &str) {}
        fn publish_options(&mut self, _column: &str, _values: &[String]) {}
        fn render_grid(&mut self, markup: &str) {
            self.renders += 1;
            self.grid = markup.to_string();
        }
    }

    const FEED: &str = "Name\tBreed\tGender\tWeight\nRex\tLabrador\tMale\t60\nBella\tPoodle\tFemale\t20\nMax\tLab Mix\tMale\t22\n";

    fn board() -> CatalogBoard<GridOnly> {
        let view = CatalogView::new(
            FilterSpec {
                search_columns: vec!["Name".into(), "Breed".into()],
                categorical: vec!["Gender".into()],
                weight_column: Some("Weight".into()),
            },
            CardTemplate {
                title_column: "Name".into(),
                image_column: "Image_URL".into(),
                placeholder: Placeholder::Text("🐕".into()),
                details: vec![],
                description_column: None,
                line_break_token: None,
                badge_column: None,
                collapsible_description: false,
                call_to_action: None,
                empty_message: "No dogs found.".into(),
            },
        );
        CatalogBoard::new(view, GridOnly::default())
    }

    fn settings() -> LoaderSettings {
        LoaderSettings {
            delimiter: Delimiter::Tab,
            row_filter: None,
            option_columns: vec!["Gender".into()],
            error_message: "Failed to load dogs. Please try again later.".into(),
        }
    }

    fn loader() -> CatalogLoader<TextFeed> {
        CatalogLoader::new(TextFeed(FEED), settings())
    }

    fn visible_names<S: UiSurface>(board: &CatalogBoard<S>) -> Vec<String> {
        board
            .visible()
            .iter()
            .map(|r| r.value("Name").to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_events_recompute_from_full_catalog() {
        let mut board = board();
        assert_eq!(board.load(&loader()).await.unwrap(), 3);

        assert_eq!(board.handle(InputEvent::SearchInput("lab".into())), Some(2));
        assert_eq!(visible_names(&board), vec!["Rex", "Max"]);

        assert_eq!(board.handle(InputEvent::WeightChange("Small".into())), Some(1));
        assert_eq!(visible_names(&board), vec!["Max"]);

        // 清空搜尋後應該回到只受體重條件限制的結果
        assert_eq!(board.handle(InputEvent::SearchInput(String::new())), Some(2));
        assert_eq!(visible_names(&board), vec!["Bella", "Max"]);

        assert_eq!(board.surface().renders, 4);
    }

    #[tokio::test]
    async fn test_select_change_then_no_results() {
        let mut board = board();
        board.load(&loader()).await.unwrap();

        board.handle(InputEvent::SelectChange {
            column: "Gender".into(),
            value: "Female".into(),
        });
        board.handle(InputEvent::SearchInput("rex".into()));

        assert!(board.visible().is_empty());
        assert!(board.surface().grid.contains("No dogs found."));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_grid_and_criteria_in_sync() {
        let mut board = board();
        board.load(&loader()).await.unwrap();
        board.handle(InputEvent::SearchInput("rex".into()));
        assert_eq!(board.surface().grid.matches("class=\"card\"").count(), 1);

        let err = board
            .load(&CatalogLoader::new(DownFeed, settings()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::FetchError { status: 500 }));
        assert_eq!(board.criteria().search, "rex");
        assert_eq!(board.catalog().len(), 3);
        assert_eq!(
            board.surface().grid.matches("class=\"card\"").count(),
            board.visible().len()
        );
    }

    #[test]
    fn test_unregistered_event_does_not_render() {
        let view = board().view;
        let mut board = CatalogBoard::with_dispatcher(view, GridOnly::default(), Dispatcher::new());

        assert_eq!(board.handle(InputEvent::SearchInput("rex".into())), None);
        assert_eq!(board.surface().renders, 0);
    }

    #[test]
    fn test_custom_handler_runs_after_default() {
        let mut dispatcher = Dispatcher::with_default_handlers();
        dispatcher.register(
            EventKind::SearchInput,
            Box::new(|_: &InputEvent, criteria: &mut Criteria| {
                criteria.search = criteria.search.trim().to_string();
            }),
        );

        let mut criteria = Criteria::default();
        assert!(dispatcher.dispatch(&InputEvent::SearchInput("  lab ".into()), &mut criteria));
        assert_eq!(criteria.search, "lab");
    }
}
