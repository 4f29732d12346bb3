//! Serial Plotter - Main Entry Point

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use plot_driver::PlotDriver;
use serial_plotter::{init_logging, AppConfig, Cli, PlotterApp, Session};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_ports {
        return list_ports();
    }

    let config = AppConfig::load(&cli).context("Failed to load configuration")?;
    init_logging(config.log_level()?, config.log_json)?;

    info!("=== Serial Plotter v{} ===", env!("CARGO_PKG_VERSION"));

    // Width/record size mismatches are fatal before anything touches the port.
    let driver = PlotDriver::new(
        config.sample,
        config.history_length,
        config.link.record_size,
        config.chart.line_label.clone(),
    )
    .context("Invalid sample configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let mut session = runtime
        .block_on(Session::start(&config.link, config.ready_timeout()))
        .with_context(|| format!("Failed to start session on {}", config.link.port))?;

    let app = PlotterApp::new(
        session.mailbox(),
        driver,
        config.chart.clone(),
        config.on_disconnect,
    );
    let handle = runtime.handle().clone();
    let options = eframe::NativeOptions::default();

    let result = eframe::run_native(
        &config.chart.title,
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            handle.spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, closing window");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    ctx.request_repaint();
                }
            });
            Ok(Box::new(app))
        }),
    );

    session.shutdown();
    result.map_err(|e| anyhow!("Display error: {}", e))?;

    info!("Serial plotter exited");
    Ok(())
}

fn list_ports() -> anyhow::Result<()> {
    let ports = serial_link::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\t{}", port.name, port.kind);
    }
    Ok(())
}
