mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "albflow")]
#[command(about = "宣言した姿へ、ロードバランサーを収束させる。", long_about = None)]
struct Cli {
    /// スナップショットの保存先（設定ファイルの snapshot_dir より優先）
    #[arg(long, global = true, env = "ALBFLOW_SNAPSHOT_DIR")]
    snapshot_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 差分を計算し、リージョンごとの変更内容を表示
    Plan {
        /// ロードバランサー定義 (YAML)
        spec: PathBuf,
    },
    /// 差分のあるリージョンにジョブを投入
    Apply {
        /// ロードバランサー定義 (YAML)
        spec: PathBuf,
    },
    /// 実行中のジョブがあるか確認
    Status {
        /// ロードバランサー定義 (YAML)
        spec: PathBuf,
    },
    /// 既存のロードバランサーを定義ファイルとして出力
    Export {
        /// アカウント名
        #[arg(short, long)]
        account: String,
        /// ロードバランサー名 (app-stack-detail)
        #[arg(short, long)]
        name: String,
        /// 対象リージョン（カンマ区切り）
        #[arg(short, long, value_delimiter = ',', required = true)]
        regions: Vec<String>,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout は export の出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("albflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = albflow_config::load_config()?;
    if let Some(dir) = cli.snapshot_dir {
        config.snapshot_dir = dir;
    }
    tracing::debug!(
        cloud_provider = %config.cloud_provider,
        service_account = %config.service_account,
        snapshot_dir = %config.snapshot_dir.display(),
        "Loaded configuration"
    );

    let handler = utils::build_handler(&config).await?;

    match cli.command {
        Commands::Plan { spec } => commands::plan::handle(&handler, &spec).await?,
        Commands::Apply { spec } => commands::apply::handle(&handler, &spec).await?,
        Commands::Status { spec } => commands::status::handle(&handler, &spec).await?,
        Commands::Export {
            account,
            name,
            regions,
        } => commands::export::handle(&handler, &config, account, &name, regions).await?,
        Commands::Version => {}
    }

    Ok(())
}
