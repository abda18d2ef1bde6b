use crate::utils::error::Result;
use async_trait::async_trait;

/// 發佈出去的試算表來源。唯一會 await 的地方。
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// 取回整份回應內容；非 2xx 狀態要回 FetchError
    async fn fetch(&self) -> Result<String>;

    fn location(&self) -> &str;
}

/// 畫面上可寫入的四個區塊：載入中、錯誤訊息、卡片格、篩選控制項
pub trait UiSurface {
    fn set_loading(&mut self, loading: bool);

    fn clear_error(&mut self);

    fn show_error(&mut self, message: &str);

    /// 把某個分類欄位觀察到的值填進對應的下拉選單
    fn publish_options(&mut self, column: &str, values: &[String]);

    fn render_grid(&mut self, markup: &str);
}

/// 渲染完成後對整段 markup 做的額外處理
pub trait PostRenderHook: Send + Sync {
    fn after_render(&self, markup: &mut String);
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
