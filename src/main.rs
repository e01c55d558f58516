//! # 笔记图片预览 — 命令行入口
//!
//! 读取一个 Markdown 笔记，对其中所有图片链接执行一次“全部预览”，
//! 把生成的叠加层 HTML 输出到标准输出。业务逻辑见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use note_preview::document::{BufferView, HeadlessView};
use note_preview::error::AppError;
use note_preview::image_handler::ImageConfig;
use note_preview::launcher::SystemLauncher;
use note_preview::service::PreviewService;
use note_preview::settings::PreviewSettings;

#[derive(Parser)]
#[command(name = "note-preview", about = "Render inline image previews for a Markdown note")]
struct Args {
    /// Markdown note to scan
    file: PathBuf,

    /// Viewport width used to fit previews
    #[arg(long, default_value = "1280")]
    max_width: f64,

    /// Viewport height used to fit previews
    #[arg(long, default_value = "800")]
    max_height: f64,

    /// JSON settings file (proxies, load timeout)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print a JSON report instead of raw HTML
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let text = tokio::fs::read_to_string(&args.file).await?;

    let service = PreviewService::with_config(ImageConfig::default(), Arc::new(SystemLauncher::new()))?;
    if let Some(path) = &args.settings {
        service.apply_settings(&PreviewSettings::load(path)?)?;
    }

    let view = Arc::new(
        HeadlessView::new(1, &text)
            .with_file_name(args.file.clone())
            .with_viewport(args.max_width, args.max_height),
    );
    let session = service.open_document(view.clone())?;
    if !session.is_enabled() {
        log::warn!("⚠️ 当前语法不支持预览: {}", view.syntax());
    }

    let report = session.toggle_all()?.await.map_err(|e| AppError::Session(e.to_string()))??;
    log::info!(
        "🏁 预览完成 - 区域数: {} 失败: {}",
        report.outcomes.len(),
        report
            .outcomes
            .iter()
            .filter(|o| matches!(o, note_preview::document::PreviewOutcome::Failed(_)))
            .count()
    );

    let mut overlays: Vec<_> = view.overlays().into_values().collect();
    overlays.sort_by_key(|overlay| overlay.region.begin());

    if args.json {
        let rendered: Vec<_> = overlays
            .iter()
            .map(|overlay| {
                serde_json::json!({
                    "line": view.substr(overlay.region),
                    "begin": overlay.region.begin(),
                    "end": overlay.region.end(),
                    "html": overlay.html,
                })
            })
            .collect();
        let output = serde_json::json!({
            "report": report,
            "overlays": rendered,
            "alerts": view.alerts(),
        });
        let pretty = serde_json::to_string_pretty(&output)
            .map_err(|e| AppError::Session(format!("序列化输出失败: {}", e)))?;
        println!("{}", pretty);
    } else {
        for overlay in &overlays {
            println!("<!-- {} -->", view.substr(overlay.region));
            print!("{}", overlay.html);
        }
    }

    service.close_document(view.id())?;
    Ok(())
}
