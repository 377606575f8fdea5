use crate::utils;
use albflow_cloud::ResourceHandler;
use albflow_cloud_aws::ApplicationLoadBalancerHandler;
use colored::Colorize;
use std::path::Path;

pub async fn handle(handler: &ApplicationLoadBalancerHandler, spec: &Path) -> anyhow::Result<()> {
    let resource = handler.resource(utils::load_spec(spec)?);
    println!("リソース: {}", resource.id().cyan());

    let (in_progress, current) = tokio::try_join!(
        handler.actuation_in_progress(&resource),
        handler.current(&resource)
    )?;

    for region in resource.spec.locations.region_names() {
        let state = if current.contains_key(&region) {
            "存在".green()
        } else {
            "未作成".yellow()
        };
        println!("  {} {}", region.cyan(), state);
    }

    println!();
    if in_progress {
        println!("{}", "⏳ 実行中のジョブがあります".yellow().bold());
    } else {
        println!("{}", "✓ 実行中のジョブはありません".green());
    }

    Ok(())
}
