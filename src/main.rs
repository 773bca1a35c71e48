use marketplace::{
    AppContext,
    config::Config,
    listing::FilterState,
    middleware::GuardOutcome,
    routes::Route,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置应用上下文并恢复会话
    let ctx = AppContext::new(config).expect("Failed to build application context");
    let _handles = ctx.boot();

    // 房源列表是公开页面
    if ctx.guard(Route::Listings) != GuardOutcome::Render {
        tracing::warn!("listings page is not accessible");
        return;
    }

    // 命令行参数即 URL 查询串，例如 "location=Austin&minPrice=100000&sortBy=price-low"
    let query = std::env::args().nth(1).unwrap_or_default();
    let filters = FilterState::from_query_string(&query);
    tracing::info!(query = %filters.to_query_string(), "searching listings");

    let listings = ctx.listing_controller();
    listings.set_filters(filters.clone());
    match listings.load(filters).await {
        Ok(Some(page)) => match serde_json::to_string_pretty(&page) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to render listing page: {}", e),
        },
        Ok(None) => tracing::warn!("listing response was superseded"),
        Err(e) => tracing::error!("Listing search failed: {}", e),
    }

    for toast in ctx.toasts.drain() {
        eprintln!("[{:?}] {}", toast.level, toast.message);
    }
}
