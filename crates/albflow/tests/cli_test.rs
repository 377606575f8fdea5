#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SPEC_YAML: &str = r#"
moniker:
  app: fnord
  stack: test
locations:
  account: test
  vpc: vpc0
  subnet: internal (vpc0)
  regions:
    - name: us-east-1
    - name: us-west-2
dependencies:
  securityGroupNames:
    - fnord
listeners:
  - port: 80
    protocol: HTTP
    defaultActions:
      - order: 1
        type: forward
        targetGroupName: fnord-tg
targetGroups:
  - name: fnord-tg
    port: 80
    healthCheck:
      port: 80
"#;

/// us-east-1 にだけロードバランサーが存在するプロジェクト
struct TestProject {
    root: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("alb.yaml"), SPEC_YAML).unwrap();
        let project = Self { root };
        project.write_snapshot();
        project
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    fn write_snapshot(&self) {
        let mut networks = Vec::new();
        let mut subnets = Vec::new();
        for region in ["us-east-1", "us-west-2"] {
            networks.push(json!({
                "id": "vpc-1",
                "name": "vpc0",
                "account": "test",
                "region": region,
            }));
            for zone in ["a", "b"] {
                subnets.push(json!({
                    "id": format!("subnet-{}{}", region, zone),
                    "account": "test",
                    "region": region,
                    "vpcId": "vpc-1",
                    "availabilityZone": format!("{}{}", region, zone),
                    "purpose": "internal (vpc0)",
                }));
            }
        }

        let snapshot = json!({
            "version": 1,
            "updatedAt": "2026-01-01T00:00:00Z",
            "loadBalancers": [{
                "account": "test",
                "region": "us-east-1",
                "model": {
                    "loadBalancerName": "fnord-test",
                    "availabilityZones": ["us-east-1a", "us-east-1b"],
                    "vpcId": "vpc-1",
                    "subnets": ["subnet-us-east-1a"],
                    "scheme": "internal",
                    "idleTimeout": 60,
                    "securityGroups": ["sg-1"],
                    "listeners": [{
                        "port": 80,
                        "protocol": "HTTP",
                        "defaultActions": [{
                            "type": "forward",
                            "order": 1,
                            "targetGroupName": "fnord-tg",
                        }],
                    }],
                    "targetGroups": [{
                        "targetGroupName": "fnord-tg",
                        "targetType": "instance",
                        "protocol": "HTTP",
                        "port": 80,
                        "healthCheckEnabled": true,
                        "healthCheckTimeoutSeconds": 5,
                        "healthCheckPort": "traffic-port",
                        "healthCheckProtocol": "HTTP",
                        "healthCheckPath": "/healthcheck",
                        "healthCheckIntervalSeconds": 10,
                        "healthyThresholdCount": 10,
                        "unhealthyThresholdCount": 2,
                        "matcher": { "httpCode": "200-299" },
                    }],
                },
            }],
            "securityGroups": [{
                "account": "test",
                "region": "us-east-1",
                "id": "sg-1",
                "name": "fnord",
            }],
            "networks": networks,
            "subnets": subnets,
        });

        fs::create_dir_all(self.snapshot_dir()).unwrap();
        fs::write(
            self.snapshot_dir().join("snapshot.json"),
            serde_json::to_string_pretty(&snapshot).unwrap(),
        )
        .unwrap();
    }

    fn read_snapshot(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.snapshot_dir().join("snapshot.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn albflow(&self) -> Command {
        let mut cmd = Command::cargo_bin("albflow").unwrap();
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env_remove("ALBFLOW_CONFIG_PATH")
            .arg("--snapshot-dir")
            .arg(self.snapshot_dir());
        cmd
    }
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("albflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ロードバランサーを収束させる"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("export"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("albflow").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("albflow"));
}

/// exportコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_export_help() {
    let mut cmd = Command::cargo_bin("albflow").unwrap();
    cmd.arg("export")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--account"))
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--regions"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("albflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// リージョン未指定の export は引数エラーになることを確認
#[test]
fn test_export_requires_regions() {
    let mut cmd = Command::cargo_bin("albflow").unwrap();
    cmd.arg("export")
        .arg("--account")
        .arg("test")
        .arg("--name")
        .arg("fnord-test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--regions"));
}

/// 定義ファイルが無い場合はエラーになることを確認
#[test]
fn test_plan_without_spec_file() {
    let project = TestProject::new();
    project
        .albflow()
        .arg("plan")
        .arg("missing.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yaml"));
}

/// ダッシュを含むアプリ名は読み込み時に拒否されることを確認
#[test]
fn test_plan_rejects_dashed_app_name() {
    let project = TestProject::new();
    fs::write(
        project.path().join("dashed.yaml"),
        SPEC_YAML.replace("app: fnord", "app: my-app"),
    )
    .unwrap();
    project
        .albflow()
        .arg("plan")
        .arg("dashed.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("my-app-test"));
}

/// 存在しないリージョンだけが変更対象になることを確認
#[test]
fn test_plan_reports_missing_region() {
    let project = TestProject::new();
    project
        .albflow()
        .arg("plan")
        .arg("alb.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ec2:application-load-balancer:test:fnord-test",
        ))
        .stdout(predicate::str::contains("us-west-2"))
        .stdout(predicate::str::contains("0 to create, 1 to update, 1 unchanged"));
}

/// apply でジョブが投入され、status で実行中と表示されることを確認
#[test]
fn test_apply_then_status() {
    let project = TestProject::new();
    project
        .albflow()
        .arg("apply")
        .arg("alb.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("1件のジョブを投入しました"));

    let snapshot = project.read_snapshot();
    let executions = snapshot["executions"].as_object().unwrap();
    assert_eq!(executions.len(), 1);
    let execution = &executions["ec2:application-load-balancer:test:fnord-test:us-west-2"];
    assert_eq!(execution["job"]["type"], json!("upsertLoadBalancer"));
    assert_eq!(execution["job"]["region"], json!("us-west-2"));

    project
        .albflow()
        .arg("status")
        .arg("alb.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("実行中のジョブがあります"));

    // 実行中の間は再投入しない
    project
        .albflow()
        .arg("apply")
        .arg("alb.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("適用をスキップします"));
    assert_eq!(
        project.read_snapshot()["executions"]
            .as_object()
            .unwrap()
            .len(),
        1
    );
}

/// 既存のロードバランサーを YAML として出力できることを確認
#[test]
fn test_export_prints_spec() {
    let project = TestProject::new();
    project
        .albflow()
        .arg("export")
        .arg("--account")
        .arg("test")
        .arg("--name")
        .arg("fnord-test")
        .arg("--regions")
        .arg("us-east-1,us-west-2")
        .assert()
        .success()
        .stdout(predicate::str::contains("app: fnord"))
        .stdout(predicate::str::contains("name: us-east-1"))
        .stdout(predicate::str::contains("fnord-tg"))
        .stdout(predicate::str::contains("us-west-2").not());
}

/// どのリージョンにも存在しない場合は export が失敗することを確認
#[test]
fn test_export_missing_load_balancer() {
    let project = TestProject::new();
    project
        .albflow()
        .arg("export")
        .arg("--account")
        .arg("test")
        .arg("--name")
        .arg("nope")
        .arg("--regions")
        .arg("us-east-1")
        .assert()
        .failure();
}
