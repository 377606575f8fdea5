use albflow_cloud::{ExportRequest, ResourceHandler};
use albflow_cloud_aws::{ApplicationLoadBalancerHandler, Moniker};
use albflow_config::AlbflowConfig;

/// 既存のロードバランサーを YAML として stdout に出力
pub async fn handle(
    handler: &ApplicationLoadBalancerHandler,
    config: &AlbflowConfig,
    account: String,
    name: &str,
    regions: Vec<String>,
) -> anyhow::Result<()> {
    let request = ExportRequest {
        account,
        moniker: Moniker::parse(name),
        regions,
        service_account: config.service_account.clone(),
    };

    let spec = handler.export(&request).await?;
    print!("{}", serde_yaml::to_string(&spec)?);

    Ok(())
}
