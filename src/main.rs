use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use points_engine::prelude::*;

fn main() -> anyhow::Result<()> {
    // Load a .env if one is present; the engine itself reads no
    // environment variables, but this keeps parity with how the rest of
    // the stack bootstraps logging configuration.
    let _ = dotenvy::dotenv();

    let options = EngineOptions::parse();
    let _logger = Logger::try_with_env_or_str(&options.log_level)?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(match cfg!(debug_assertions) {
            true => AdaptiveFormat::WithThread,
            _ => AdaptiveFormat::Default,
        })
        .set_palette("b196;208;195;111;67".to_owned())
        .start()?;

    let mut server = EngineServer::new(options.engine_config());
    if let Err(err) = server.run() {
        log::error!("fatal error: {err:#}");
        return Err(err);
    }
    Ok(())
}
