use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod model;
mod services;
mod utils;

use config::{Config, LoggingConfig, Overrides, PollConfig};
use error::WinError;
use services::{check_support, Daemon, DisplayServer, DryRunServer, X11Server};
use utils::{LogControl, Verbosity};

#[derive(Parser, Debug)]
#[command(name = "winrecall", version)]
#[command(about = "Запоминает положение окон для каждой расстановки мониторов и восстанавливает его")]
struct Args {
    /// X-сервер для подключения (по умолчанию $DISPLAY)
    #[arg(short, long, value_name = "HOST:DPY")]
    display: Option<String>,

    /// Интервал опроса окон в секундах (по умолчанию 10)
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true)]
    interval: Option<i64>,

    /// Подробное логирование; -vv включает отладочные сообщения
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "winrecall.toml")]
    config: PathBuf,

    /// Режим сухого запуска (окна не перемещаются)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let overrides = Overrides {
        display: args.display.clone(),
        interval_secs: args.interval,
        dry_run: args.dry_run,
    };
    let config = match Config::load(&args.config, overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ошибка конфигурации: {:#}", e);
            return ExitCode::from(1);
        }
    };

    let log_control = match init_tracing(&config.logging, args.verbose) {
        Ok(control) => control,
        Err(e) => {
            eprintln!("Не удалось настроить логирование: {:#}", e);
            return ExitCode::from(1);
        }
    };

    info!("Запуск winrecall v{}", env!("CARGO_PKG_VERSION"));
    run(config, log_control).await
}

async fn run(config: Config, log_control: LogControl) -> ExitCode {
    let server = match X11Server::connect(config.display.name.as_deref()) {
        Ok(server) => server,
        Err(e) => {
            error!("Не удалось подключиться к X-серверу: {}", e);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = check_support(&server) {
        error!("Оконный менеджер или X-сервер не подходят для работы: {}", e);
        return ExitCode::from(startup_exit_code(&e));
    }

    if let Err(e) = log_control.listen_for_toggle() {
        warn!("Переключение отладки по SIGUSR1 недоступно: {}", e);
    }

    if config.dry_run {
        serve(DryRunServer::new(server), &config.poll).await
    } else {
        serve(server, &config.poll).await
    }
}

async fn serve<S: DisplayServer>(server: S, poll: &PollConfig) -> ExitCode {
    let mut daemon = match Daemon::new(server, poll) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Не удалось подписаться на события RandR: {}", e);
            return ExitCode::from(startup_exit_code(&e));
        }
    };

    daemon.run(shutdown_signal()).await;

    info!("winrecall завершил работу");
    ExitCode::SUCCESS
}

/// 2 для неподходящего сервера или оконного менеджера, 1 для остальных ошибок запуска
fn startup_exit_code(err: &WinError) -> u8 {
    match err {
        WinError::Unsupported(_) => 2,
        _ => 1,
    }
}

/// Ctrl+C или SIGTERM
async fn shutdown_signal() {
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Не удалось подписаться на SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Ошибка при ожидании сигнала завершения: {}", e);
            }
        }
        _ = terminate => {}
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: u8) -> Result<LogControl> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter,
    };

    let verbosity = Verbosity::from_count(verbose, &logging.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&verbosity.initial))?;
    let (filter, handle) = reload::Layer::new(filter);

    let compact = logging.format == "compact";
    tracing_subscriber::registry()
        .with(filter)
        .with(compact.then(|| fmt::layer().compact()))
        .with((!compact).then(fmt::layer))
        .init();

    Ok(LogControl::new(handle, verbosity))
}
