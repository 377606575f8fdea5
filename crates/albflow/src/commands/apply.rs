use crate::utils;
use albflow_cloud::ResourceHandler;
use albflow_cloud_aws::ApplicationLoadBalancerHandler;
use colored::Colorize;
use std::path::Path;

pub async fn handle(handler: &ApplicationLoadBalancerHandler, spec: &Path) -> anyhow::Result<()> {
    let resource = handler.resource(utils::load_spec(spec)?);
    println!("リソース: {}", resource.id().cyan());

    // 実行中のジョブがある間は新しいジョブを投入しない
    if handler.actuation_in_progress(&resource).await? {
        println!(
            "{}",
            "⚠ 実行中のジョブがあるため、適用をスキップします".yellow()
        );
        return Ok(());
    }

    let diff = utils::compute_diff(handler, &resource).await?;
    let plan = handler.plan(&resource, &diff);
    println!();
    utils::print_plan(&plan);

    if !plan.has_changes {
        println!("{}", "✓ 変更はありません".green());
        return Ok(());
    }

    let tasks = handler.upsert(&resource, &diff).await?;

    println!();
    println!(
        "{}",
        format!("✓ {}件のジョブを投入しました", tasks.len())
            .green()
            .bold()
    );
    for task in &tasks {
        println!("  • {} {}", task.id.cyan(), task.name);
    }

    Ok(())
}
