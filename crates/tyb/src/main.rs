use std::sync::Arc;

use tyb_core::{app::Tools, config::Config, ports::ChatModel};
use tyb_media::{FfmpegAudioTool, YtDlpFetcher};
use tyb_openai::OpenAiClient;

#[tokio::main]
async fn main() -> Result<(), tyb_core::Error> {
    tyb_core::logging::init("tyb")?;

    let cfg = Arc::new(Config::load()?);

    let chat_model: Option<Arc<dyn ChatModel>> = match &cfg.openai_api_key {
        Some(key) => Some(Arc::new(OpenAiClient::new(
            key.clone(),
            cfg.openai_model.clone(),
            cfg.openai_base_url.clone(),
        )?)),
        None => {
            tracing::info!("OPENAI_API_KEY not set; /chat disabled");
            None
        }
    };

    let tools = Tools {
        fetcher: Arc::new(YtDlpFetcher::new(
            cfg.ytdlp_path.clone(),
            cfg.fetch_socket_timeout,
            cfg.fetch_deadline,
        )),
        audio: Arc::new(FfmpegAudioTool::new(
            cfg.ffmpeg_path.clone(),
            cfg.ffprobe_path.clone(),
        )),
        chat_model,
    };

    tyb_telegram::router::run_polling(cfg, tools)
        .await
        .map_err(|e| tyb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
