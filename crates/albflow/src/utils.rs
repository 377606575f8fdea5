use albflow_cloud::{ActionType, Plan, Resource, ResourceDiff, ResourceHandler};
use albflow_cloud_aws::{
    ApplicationLoadBalancerHandler, ApplicationLoadBalancerSpec, RegionalDiff, SnapshotBackend,
    SnapshotStore,
};
use albflow_config::AlbflowConfig;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// スナップショットを開いてハンドラーを組み立てる
pub async fn build_handler(config: &AlbflowConfig) -> anyhow::Result<ApplicationLoadBalancerHandler> {
    let backend = Arc::new(SnapshotBackend::open(SnapshotStore::new(&config.snapshot_dir)).await?);

    Ok(ApplicationLoadBalancerHandler::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend,
    )
    .with_cloud_provider(config.cloud_provider.clone())
    .with_service_account(config.service_account.clone()))
}

/// ロードバランサー定義ファイルを読み込む
pub fn load_spec(path: &Path) -> anyhow::Result<ApplicationLoadBalancerSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("定義ファイルを読み込めません: {}: {}", path.display(), e)
    })?;
    let spec: ApplicationLoadBalancerSpec = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("定義ファイルの解析に失敗しました: {}: {}", path.display(), e))?;
    spec.moniker.validate()?;
    Ok(spec)
}

/// 期待する状態と現在の状態を並行して取得し、差分を作る
pub async fn compute_diff(
    handler: &ApplicationLoadBalancerHandler,
    resource: &Resource<ApplicationLoadBalancerSpec>,
) -> anyhow::Result<RegionalDiff> {
    let (desired, current) = tokio::try_join!(handler.resolve(resource), handler.current(resource))?;
    Ok(ResourceDiff::new(desired, Some(current)))
}

/// 変更内容を表示
pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let label = match action.action_type {
            ActionType::Create => "+ 作成".green(),
            ActionType::Update => "~ 更新".yellow(),
        };
        println!("  {} {}", label, action.region.cyan());
        for change in &action.changes {
            println!("      {}", change.dimmed());
        }
    }
    for region in &plan.unchanged {
        println!("  {} {}", "= 変更なし".dimmed(), region);
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
}
