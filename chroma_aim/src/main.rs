// A minimal shell around the library: load config from the environment,
// activate tracking on the real display, and run until F8 or Ctrl-C.

use anyhow::Context;
use chroma_aim::config::TrackerConfig;
use chroma_aim::control::{ControlPanel, TrackerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chroma_aim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chroma_aim v{}", env!("CARGO_PKG_VERSION"));

    let config = TrackerConfig::from_env().context("invalid configuration")?;
    let state = TrackerState::from_config(&config).context("invalid configuration")?;
    tracing::info!(
        color = %state.target_color(),
        threshold = state.threshold(),
        sensitivity = state.sensitivity(),
        tick_ms = config.tick_period.as_millis() as u64,
        "configuration loaded"
    );

    run(config, ControlPanel::new(state)).await
}

#[cfg(target_os = "linux")]
async fn run(config: TrackerConfig, panel: ControlPanel) -> anyhow::Result<()> {
    use chroma_aim::devices::StopFlag;
    use chroma_aim::pipeline::TrackingLoop;
    use chroma_aim::platform::pointer::EnigoPointer;
    use chroma_aim::platform::x11::{X11Display, X11Hotkey};

    let display = X11Display::connect()?;
    let stop = StopFlag::new();
    // The watcher thread is detached; it ends with the process.
    X11Hotkey::f8(display.connection())?.watch(stop.clone(), config.tick_period)?;
    let pointer = EnigoPointer::new()?;
    let mut tracker = TrackingLoop::new(panel.clone(), display, pointer, stop, &config);

    panel.activate(config.mode.clone());
    tokio::select! {
        ticks = tracker.run_session() => {
            tracing::info!(ticks, "tracking session ended");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            panel.deactivate();
        }
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: TrackerConfig, _panel: ControlPanel) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("no display backend is available on this platform"))
}
