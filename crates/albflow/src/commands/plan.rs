use crate::utils;
use albflow_cloud_aws::ApplicationLoadBalancerHandler;
use colored::Colorize;
use std::path::Path;

pub async fn handle(handler: &ApplicationLoadBalancerHandler, spec: &Path) -> anyhow::Result<()> {
    println!("{}", "差分を計算中...".blue());

    let resource = handler.resource(utils::load_spec(spec)?);
    println!("リソース: {}", resource.id().cyan());
    println!();

    let diff = utils::compute_diff(handler, &resource).await?;
    let plan = handler.plan(&resource, &diff);
    utils::print_plan(&plan);

    if !plan.has_changes {
        println!("{}", "✓ すべてのリージョンが定義どおりです".green());
    }

    Ok(())
}
