use anyhow::Result;
use transcript_summarizer::app::App;
use transcript_summarizer::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 交互式收集配置并运行批处理
    let app = App::from_interactive()?;
    app.run().await?;

    Ok(())
}
