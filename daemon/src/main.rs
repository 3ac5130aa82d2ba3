use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as AnyhowContext;
use clap::Parser;
use flexi_logger::{FileSpec, LevelFilter, LogSpecification, Logger, LoggerHandle, WriteMode};
use log::info;
use tokio::sync::Notify;

use fwupd_hybris::config::{Config, DEFAULT_CONFIG_PATH};
use fwupd_hybris::sensors::BinderCallSensorSource;
use fwupd_hybris::telephony::OfonoModemSource;
use fwupd_hybris::Snapshot;

mod interface;
use interface::FwupdInterface;

#[derive(Parser)]
#[command(name = "fwupd-hybrisd", version)]
struct Cli {
    /// `-c`, `--config`: Path to the daemon config file. Optional, defaults
    /// to `/etc/fwupd-hybris/config.toml`; a missing file means defaults.
    #[arg(short = 'c', long, help = "Path to the config file")]
    config: Option<PathBuf>,

    /// `-f`, `--log-file`: Send log output to the given file instead of
    /// stderr (the default, so journald picks the logs up).
    #[arg(short = 'f', long, help = "Send log output to the given file")]
    log_file: Option<PathBuf>,

    /// `-s`, `--log-spec`: Debug options for [flexi_logger](https://docs.rs/flexi_logger/latest/flexi_logger/struct.LogSpecification.html)
    #[arg(short = 's', long, help = "Log spec for flexi_logger")]
    log_spec: Option<String>,

    /// `-l`, `--log-level`: Set the desired log verbosity. Defaults to 0,
    /// all values are listed below:
    ///
    /// | Value | Log Level |
    /// | ----- | --------- |
    /// | **0** | **Warn** |
    /// | 1 | Info |
    /// | 2 | Debug |
    /// | 3 | Trace |
    #[arg(
        short = 'l',
        long,
        help = "Set the log level, 0 = warn, 1 = info, etc",
        default_value_t = 0
    )]
    log_level: u8,
}

impl Cli {
    fn configure_loggers(&self) -> anyhow::Result<LoggerHandle> {
        let log_spec = match &self.log_spec {
            Some(s) => {
                LogSpecification::parse(s).with_context(|| format!("parsing log spec {}", s))?
            }
            None => {
                if self.log_level > 0 {
                    let lvl = if self.log_level == 1 {
                        LevelFilter::Info
                    } else if self.log_level == 2 {
                        LevelFilter::Debug
                    } else {
                        LevelFilter::Trace
                    };
                    LogSpecification::builder()
                        .default(LevelFilter::Warn)
                        .module("fwupd_hybris", lvl)
                        .module("fwupd_hybris_daemon", lvl)
                        .build()
                } else {
                    LogSpecification::env().with_context(|| "getting log spec from env")?
                }
            }
        };

        let mut logger = Logger::with(log_spec);

        if let Some(v) = &self.log_file {
            let path = if v.is_absolute() {
                Cow::Borrowed(v)
            } else {
                Cow::Owned(std::env::current_dir()?.join(v))
            };
            logger = logger
                .log_to_file(
                    FileSpec::try_from(path.as_ref()).with_context(|| "creating filespec")?,
                )
                .append()
                .write_mode(WriteMode::BufferAndFlush);
        }

        Ok(logger.start().with_context(|| "starting logger")?)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _log_handle = cli.configure_loggers()?;

    let cfg_path = cli
        .config
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    let cfg = Config::load(cfg_path)?;

    // The aggregation pass runs exactly once, before we show up on the bus.
    // Everything served afterwards comes out of this snapshot.
    let modems = OfonoModemSource::new(cfg.probe_timeout());
    let sensors = BinderCallSensorSource::new(&cfg);
    let snapshot = Arc::new(Snapshot::build(&cfg, &modems, &sensors));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "building the runtime")?;
    runtime.block_on(serve(snapshot))
}

async fn serve(snapshot: Arc<Snapshot>) -> anyhow::Result<()> {
    let quit = Arc::new(Notify::new());
    let iface = FwupdInterface::new(snapshot, Arc::clone(&quit));

    // Failing to register on the bus is the only fatal error this daemon
    // has; everything before this degrades to empty results instead.
    let _conn = zbus::connection::Builder::system()
        .with_context(|| "connecting to the system bus")?
        .name(interface::BUS_NAME)
        .with_context(|| format!("claiming {}", interface::BUS_NAME))?
        .serve_at(interface::OBJECT_PATH, iface)
        .with_context(|| "exporting the fwupd interface")?
        .build()
        .await
        .with_context(|| "registering on the system bus")?;

    info!(
        "serving {} at {}",
        interface::BUS_NAME,
        interface::OBJECT_PATH
    );

    // TODO: also exit when the bus connection itself dies instead of
    //  relying on the service manager to reap us.
    tokio::select! {
        _ = quit.notified() => info!("shutting down: Quit requested"),
        _ = shutdown_signal() => info!("shutting down: signal received"),
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return std::future::pending().await,
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = term.recv() => {},
    }
}
