use std::time::Duration;

use anyhow::Result;

use madrona::config::Config;
use madrona::core::compositor::Compositor;
use madrona::ShellEvent;

fn main() -> Result<()> {
    // Default log level to info unless the environment says otherwise
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,madrona=debug");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S".to_string(),
        ))
        .with_ansi(false)
        .init();

    let config = Config::load()?;
    let mut compositor = Compositor::new(config)?;
    if let Some(name) = compositor.socket_name() {
        std::env::set_var("WAYLAND_DISPLAY", &name);
    }

    // Headless shell loop: dispatch protocol traffic and log shell events.
    // A real desktop embeds the library and drives rendering itself.
    loop {
        compositor.accept_connections()?;
        compositor.dispatch()?;
        compositor.collect_pongs();

        for event in compositor.ping_clients() {
            tracing::warn!("{:?}", event);
        }
        for event in compositor.drain_events() {
            match event {
                ShellEvent::RedrawNeeded => {}
                other => tracing::info!("{:?}", other),
            }
        }

        std::thread::sleep(Duration::from_millis(8));
    }
}
