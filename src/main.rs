//! # pixel-bridge — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与引擎加载，
//! 具体编辑逻辑由 `EditSession` 完成，详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pixel_bridge::{BridgeConfig, EditSession, EngineBinding, PixelBridge, ResampleFilter, Transform};

#[derive(Parser, Debug)]
#[command(name = "pixel-bridge", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 原生引擎库路径（覆盖配置与环境变量）
    #[arg(long)]
    library: Option<PathBuf>,

    /// 输入图片
    input: Option<PathBuf>,

    /// 依次执行的变换，例如 `rotate-right`、`resize=800x600:lanczos3`、`brightness=20`
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<Transform>,

    /// 输出路径；省略时只打印结果尺寸
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出可用的重采样滤镜
    Filters,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Some(Command::Filters) => {
            cmd_filters();
            Ok(())
        }
        None => cmd_edit(cli),
    }
}

fn cmd_filters() {
    let default = ResampleFilter::default();
    for filter in ResampleFilter::ALL {
        let marker = if filter == default { " (default)" } else { "" };
        println!("{}  {:<12} {}{marker}", filter.code(), filter.as_str(), filter.label());
    }
}

fn cmd_edit(cli: Cli) -> anyhow::Result<()> {
    let input = cli
        .input
        .context("missing <INPUT>; run `pixel-bridge --help` for usage")?;

    let mut config = match cli.config.as_deref() {
        Some(path) => BridgeConfig::load_from_path(path),
        None => BridgeConfig::default(),
    };
    if let Some(library) = cli.library {
        config.library_path = Some(library);
    }

    let binding = EngineBinding::init(&config).context("load native image engine")?;
    log::info!("🔗 引擎来源: {}", binding.origin());

    let mut session = EditSession::new(PixelBridge::new(binding), config);
    session
        .open(&input)
        .with_context(|| format!("open '{}'", input.display()))?;

    for op in cli.ops {
        session.apply(op).with_context(|| format!("apply '{op}'"))?;
        eprintln!("applied {op}");
    }

    match cli.out {
        Some(out) => {
            session
                .save_as(&out)
                .with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => eprintln!("{}", session.status()),
    }
    Ok(())
}
