//! End-to-end runs of a resources file against the in-memory device.

use std::sync::Arc;

use junos_provider::config::{ConfigParser, ConfigValidator, ProviderFile};
use junos_provider::error::ProviderError;
use junos_provider::planner::{ActionType, ChangePlan};
use junos_provider::reconciler::{FakeMode, OperationState, Reconciler};
use junos_provider::resource::{Security, SystemLoginUser, SystemRootAuthentication};
use junos_provider::session::{DetachedSessions, MemoryDevice, SetFileWriter};
use junos_provider::{CommandSet, ReadGuard};

const RESOURCES: &str = r#"
provider:
  platform_model: srx345
resources:
  security:
    ike_traceoptions:
      file:
        name: ike.log
        files: 3
        no_world_readable: true
      flag: [all]
  root_authentication:
    encrypted_password: "$6$root"
    ssh_public_keys: ["ssh-ed25519 AAAAC3NzaC1lZDI1NTE5 admin@host"]
  login_users:
    - name: ops
      class: operator
      uid: 2001
      authentication:
        encrypted_password: "$6$ops"
"#;

fn resources() -> ProviderFile {
    let file = ConfigParser::new().parse_yaml(RESOURCES, None).unwrap();
    ConfigValidator::new().validate(&file).unwrap();
    file
}

async fn apply_all(reconciler: &Reconciler<MemoryDevice>, file: &ProviderFile) {
    let resources = &file.resources;
    reconciler
        .create::<Security>(resources.security.as_ref().unwrap())
        .await
        .unwrap();
    reconciler
        .create::<SystemRootAuthentication>(resources.root_authentication.as_ref().unwrap())
        .await
        .unwrap();
    for user in &resources.login_users {
        reconciler.create::<SystemLoginUser>(user).await.unwrap();
    }
}

#[tokio::test]
async fn test_apply_then_no_drift() {
    let file = resources();
    let device = MemoryDevice::new().with_model("srx345");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());

    apply_all(&reconciler, &file).await;

    let resources = &file.resources;
    let security = resources.security.as_ref().unwrap();
    let report = reconciler
        .check_drift::<Security>("security", security)
        .await
        .unwrap();
    assert!(!report.has_drift(), "{report}");

    let root = resources.root_authentication.as_ref().unwrap();
    let report = reconciler
        .check_drift::<SystemRootAuthentication>("system_root_authentication", root)
        .await
        .unwrap();
    assert!(!report.has_drift(), "{report}");

    let ops = &resources.login_users[0];
    let outcome = reconciler.read::<SystemLoginUser>("ops").await.unwrap();
    assert_eq!(outcome.state.as_ref(), Some(ops));
    assert!(!device.is_locked());
}

#[tokio::test]
async fn test_reapply_is_idempotent() {
    let file = resources();
    let device = MemoryDevice::new().with_model("vsrx");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());

    apply_all(&reconciler, &file).await;
    let first = device.committed();
    apply_all(&reconciler, &file).await;

    assert_eq!(device.committed(), first);
}

#[tokio::test]
async fn test_plan_matches_committed_lines() {
    let file = resources();
    let plan = ChangePlan::from_resources(&file.resources, false).unwrap();
    assert_eq!(plan.count(ActionType::Create), 3);

    let device = MemoryDevice::new().with_model("srx345");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());
    apply_all(&reconciler, &file).await;

    let planned: Vec<String> = plan
        .commands()
        .iter()
        .filter_map(|line| line.strip_prefix("set ").map(str::to_string))
        .collect();
    assert_eq!(device.committed(), planned);
}

#[tokio::test]
async fn test_security_rejected_on_switch() {
    let file = resources();
    let device = MemoryDevice::new().with_model("ex4300-48p");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());

    let err = reconciler
        .create::<Security>(file.resources.security.as_ref().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Compatibility(_)));
    assert!(err.is_side_effect_free());
    assert_eq!(device.journal(), ["open", "close"]);

    let root = file.resources.root_authentication.as_ref().unwrap();
    reconciler
        .create::<SystemRootAuthentication>(root)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_line_rolls_back_whole_resource() {
    let file = resources();
    let device = MemoryDevice::new().with_model("srx345");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());
    device.fail_commands_containing("no-world-readable", "syntax error");

    let err = reconciler
        .create::<Security>(file.resources.security.as_ref().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RolledBack { rollback: None, .. }));
    assert!(device.committed().is_empty());
    assert!(!device.is_locked());
    let journal = device.journal();
    assert!(journal.contains(&String::from("rollback")));
    assert!(!journal.iter().any(|entry| entry.starts_with("commit")));
}

#[tokio::test]
async fn test_update_replaces_out_of_band_changes() {
    let file = resources();
    let device = MemoryDevice::new().with_model("srx345");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());
    let ops = &file.resources.login_users[0];
    reconciler.create::<SystemLoginUser>(ops).await.unwrap();

    let mut rogue = CommandSet::new();
    rogue.set("system login user ops full-name \"Someone Else\"");
    device.apply_out_of_band(&rogue);
    let report = reconciler
        .check_drift::<SystemLoginUser>("ops", ops)
        .await
        .unwrap();
    assert_eq!(report.diff.unexpected.len(), 1);

    let outcome = reconciler.update::<SystemLoginUser>("ops", ops).await.unwrap();
    assert_eq!(outcome.state.as_ref(), Some(ops));
    assert!(outcome.trace.contains(OperationState::Committed));

    let report = reconciler
        .check_drift::<SystemLoginUser>("ops", ops)
        .await
        .unwrap();
    assert!(!report.has_drift(), "{report}");
}

#[tokio::test]
async fn test_deletes() {
    let file = resources();
    let device = MemoryDevice::new().with_model("srx345");
    let reconciler = Reconciler::new(device.clone(), ReadGuard::new());
    apply_all(&reconciler, &file).await;
    let before = device.committed();
    device.clear_journal();

    reconciler
        .delete::<Security>("security")
        .await
        .unwrap();
    reconciler
        .delete::<SystemRootAuthentication>("system_root_authentication")
        .await
        .unwrap();
    assert!(device.journal().is_empty());
    assert_eq!(device.committed(), before);

    reconciler.delete::<SystemLoginUser>("ops").await.unwrap();
    assert!(!device.committed().iter().any(|s| s.starts_with("system login user ops")));

    let err = reconciler.import::<SystemLoginUser>("ops").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_reconcilers_share_device() {
    let file = resources();
    let device = MemoryDevice::new().with_model("srx345");
    let guard = ReadGuard::new();
    let reconciler = Arc::new(Reconciler::new(device.clone(), guard));

    let mut tasks = Vec::new();
    for name in ["alpha", "bravo", "charlie"] {
        let reconciler = Arc::clone(&reconciler);
        let mut user = file.resources.login_users[0].clone();
        user.name = name.to_string();
        user.uid = None;
        tasks.push(tokio::spawn(async move {
            loop {
                match reconciler.create::<SystemLoginUser>(&user).await {
                    Ok(outcome) => return outcome,
                    Err(ProviderError::Transport(_)) => tokio::task::yield_now().await,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        }));
    }
    for task in tasks {
        let outcome = task.await.unwrap();
        assert!(outcome.state.is_some());
    }

    let committed = device.committed();
    for name in ["alpha", "bravo", "charlie"] {
        let prefix = format!("system login user {name} class operator");
        assert!(committed.contains(&prefix), "{name}");
    }
    assert!(!device.is_locked());
}

#[tokio::test]
async fn test_export_to_set_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out.set");
    let file = resources();
    let fake = FakeMode::new(SetFileWriter::new(&path));
    let reconciler = Reconciler::new(DetachedSessions, ReadGuard::new()).with_fake_mode(Some(fake));

    let ops = &file.resources.login_users[0];
    let outcome = reconciler.create::<SystemLoginUser>(ops).await.unwrap();
    assert_eq!(outcome.state.as_ref(), Some(ops));
    reconciler
        .create::<Security>(file.resources.security.as_ref().unwrap())
        .await
        .unwrap();

    let err = reconciler.update::<SystemLoginUser>("ops", ops).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "set system login user ops class operator");
    assert!(lines.contains(&"set security ike traceoptions flag all"));
    assert!(!content.contains("delete "));
}
