//! Add-on and operator flows against scripted ocm and oc

mod common;

use common::*;
use ocmqe_cluster::addons::{GPU_ADDON, RHOAM_DEFAULT_CIDR};
use ocmqe_cluster::{AddonState, ClusterError, ClusterHandle, OperatorSubscription};

fn handle() -> ClusterHandle {
    ClusterHandle::new("qe-cluster", CLUSTER_ID)
}

fn all_operators_succeeded() -> ocmqe_core::CommandOutput {
    ok(&serde_json::json!({
        "items": [
            {"metadata": {"name": "authorino-operator.v0.10.0"}, "status": {"phase": "Succeeded"}},
            {"metadata": {"name": "servicemeshoperator.v2.5.0"}, "status": {"phase": "Succeeded"}},
            {"metadata": {"name": "serverless-operator.v1.31.0"}, "status": {"phase": "Succeeded"}}
        ]
    })
    .to_string())
}

#[tokio::test(start_paused = true)]
async fn test_install_rhods_installs_operators_first() {
    let runner = MockRunner::new();
    runner
        .on_seq(
            "ocm list addons",
            vec![
                addons("managed-odh", "not installed"),
                addons("managed-odh", "installing"),
                addons("managed-odh", "ready"),
            ],
        )
        .on(
            "oc apply -f",
            ok("subscription.operators.coreos.com/created"),
        )
        .on(
            "oc get csv -n openshift-operators -o json",
            all_operators_succeeded(),
        )
        .on("/addons --body", ok("{}"));
    let manager = manager(&runner);

    manager
        .install_rhods(&handle(), "qe@example.com")
        .await
        .unwrap();

    assert_eq!(runner.count("oc apply -f"), 3);
    assert_eq!(runner.count("oc get csv"), 3);
    assert_eq!(runner.count("ocm list addons"), 3);

    let manifests: Vec<String> = runner.files().into_iter().map(|f| f.content).collect();
    assert!(manifests[0].contains("name: authorino-operator"));
    assert!(manifests[0].contains("channel: tech-preview-v1"));
    assert!(manifests[1].contains("name: servicemeshoperator"));
    assert!(manifests[2].contains("name: serverless-operator"));

    let last_csv_check = runner
        .calls()
        .iter()
        .rposition(|c| c.contains("oc get csv"))
        .unwrap();
    assert!(last_csv_check < runner.position("/addons --body").unwrap());

    let body = runner.json_body("/addons --body");
    assert_eq!(body["addon"]["id"], "managed-odh");
    assert_eq!(body["parameters"]["items"][0]["id"], "notification-email");
    assert_eq!(body["parameters"]["items"][0]["value"], "qe@example.com");
}

#[tokio::test(start_paused = true)]
async fn test_install_rhods_skips_when_installed() {
    let runner = MockRunner::new();
    runner.on("ocm list addons", addons("managed-odh", "ready"));
    let manager = manager(&runner);

    manager
        .install_rhods(&handle(), "qe@example.com")
        .await
        .unwrap();

    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_uninstall_rhods_deletes_and_waits() {
    let runner = MockRunner::new();
    runner
        .on_seq(
            "ocm list addons",
            vec![
                addons("managed-odh", "ready"),
                addons("managed-odh", "deleting"),
                addons("managed-odh", "not installed"),
            ],
        )
        .on("delete /api/clusters_mgmt", ok(""));
    let manager = manager(&runner);

    manager.uninstall_rhods(&handle()).await.unwrap();

    assert!(runner.calls().contains(&format!(
        "ocm --v=0 delete /api/clusters_mgmt/v1/clusters/{}/addons/managed-odh",
        CLUSTER_ID
    )));
    assert_eq!(runner.count("ocm list addons"), 3);
}

#[tokio::test]
async fn test_uninstall_skipped_when_not_installed() {
    let runner = MockRunner::new();
    runner.on(
        "ocm list addons",
        addons("managed-starburst", "not installed"),
    );
    let manager = manager(&runner);

    manager
        .uninstall_addon(&handle(), "managed-starburst")
        .await
        .unwrap();

    assert_eq!(runner.count("delete"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_addon_failed_is_terminal() {
    let runner = MockRunner::new();
    runner
        .on_seq(
            "ocm list addons",
            vec![
                addons(GPU_ADDON, "not installed"),
                addons(GPU_ADDON, "installing"),
                addons(GPU_ADDON, "failed"),
                addons(GPU_ADDON, "ready"),
            ],
        )
        .on("/addons --body", ok("{}"));
    let manager = manager(&runner);

    let err = manager.install_gpu_addon(&handle()).await.unwrap_err();

    match &err {
        ClusterError::Wait { operation, source, .. } => {
            assert_eq!(*operation, "addon-installed");
            assert!(source.is_terminal_state());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(runner.count("ocm list addons"), 3);
}

#[tokio::test]
async fn test_addon_state_unlisted_addon() {
    let runner = MockRunner::new();
    runner.on("ocm list addons", addons("managed-odh", "ready"));
    let manager = manager(&runner);

    assert_eq!(
        manager.addon_state(&handle(), "managed-odh").await.unwrap(),
        AddonState::Ready
    );
    assert!(matches!(
        manager.addon_state(&handle(), "nvidia-gpu-addon").await,
        Err(ClusterError::Command(_))
    ));
}

fn rhoam_runner() -> std::sync::Arc<MockRunner> {
    let runner = MockRunner::new();
    runner
        .on(
            "ocm list addons",
            addons("managed-api-service", "not installed"),
        )
        .on("/addons --body", ok("{}"))
        .on_seq(
            "oc get rhmi rhoam -n redhat-rhoam-operator",
            vec![
                fail(concat!(
                    "Error from server (NotFound): ",
                    "rhmis.integreatly.org \"rhoam\" not found",
                )),
                ok("NAME    AGE\nrhoam   5s\n"),
            ],
        )
        .on(
            "oc patch rhmi rhoam",
            ok("rhmi.integreatly.org/rhoam patched"),
        )
        .on(
            "oc get secret redhat-rhoam-deadmanssnitch",
            ok(concat!(
                "NAME                          TYPE     DATA   AGE\n",
                "redhat-rhoam-deadmanssnitch   Opaque   1      1m\n",
            )),
        );
    runner
}

#[tokio::test(start_paused = true)]
async fn test_install_rhoam_reports_missing_smtp_secret() {
    let runner = rhoam_runner();
    runner.on(
        "oc get secret redhat-rhoam-smtp",
        fail(concat!(
            "Error from server (NotFound): ",
            "secrets \"redhat-rhoam-smtp\" not found",
        )),
    );
    let manager = manager(&runner);

    let err = manager
        .install_rhoam(&handle(), RHOAM_DEFAULT_CIDR)
        .await
        .unwrap_err();

    let missing = match &err {
        ClusterError::SecretMissing { name, .. } => name.as_str(),
        other => panic!("unexpected error: {}", other),
    };
    assert_eq!(missing, "redhat-rhoam-smtp");
    assert_eq!(runner.count("oc get rhmi"), 2);

    let body = runner.json_body("/addons --body");
    assert_eq!(body["addon"]["id"], "managed-api-service");
    assert_eq!(body["parameters"]["items"][0]["id"], "cidr-range");
    assert_eq!(body["parameters"]["items"][0]["value"], "10.1.0.0/26");

    let patch = runner
        .invocations()
        .into_iter()
        .find(|i| i.to_string().contains("oc patch"))
        .unwrap();
    assert!(patch
        .arguments()
        .contains(&r#"{"spec":{"useClusterStorage":"false"}}"#.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_install_rhoam_succeeds() {
    let runner = rhoam_runner();
    runner.on(
        "oc get secret redhat-rhoam-smtp",
        ok("redhat-rhoam-smtp   Opaque   5   1m\n"),
    );
    let manager = manager(&runner);

    manager
        .install_rhoam(&handle(), RHOAM_DEFAULT_CIDR)
        .await
        .unwrap();
    // The add-on is not awaited
    assert_eq!(runner.count("ocm list addons"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rhmi_never_appears() {
    let runner = MockRunner::new();
    runner
        .on(
            "ocm list addons",
            addons("managed-api-service", "not installed"),
        )
        .on("/addons --body", ok("{}"))
        .on("oc get rhmi", fail("Error from server (NotFound)"));
    let manager = manager(&runner);

    let err = manager
        .install_rhoam(&handle(), RHOAM_DEFAULT_CIDR)
        .await
        .unwrap_err();

    assert!(matches!(err, ClusterError::ObjectNotFound { .. }));
    // 35 lookups, three seconds apart
    assert_eq!(runner.count("oc get rhmi"), 35);
    assert_eq!(runner.count("oc patch"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_operator_csv_failed_is_terminal() {
    let runner = MockRunner::new();
    runner
        .on("oc apply -f", ok(""))
        .on_seq(
            "oc get csv",
            vec![
                ok(r#"{"items": []}"#),
                csvs("serverless-operator.v1.31.0", "Installing"),
                csvs("serverless-operator.v1.31.0", "Failed"),
            ],
        );
    let manager = manager(&runner);

    let err = manager
        .install_operator_and_wait(&OperatorSubscription::new(
            "serverless-operator",
            "stable",
            "redhat-operators",
        ))
        .await
        .unwrap_err();

    assert!(err.is_terminal_state(), "unexpected error: {}", err);
    assert_eq!(runner.count("oc get csv"), 3);
}

#[tokio::test]
async fn test_starburst_install_and_email_update() {
    let runner = MockRunner::new();
    runner
        .on(
            "ocm list addons",
            addons("managed-starburst", "not installed"),
        )
        .on("/addons --body", ok("{}"))
        .on("patch /api/clusters_mgmt", ok("{}"));
    let manager = manager(&runner);

    manager
        .install_starburst(&handle(), "license-text", "qe@example.com")
        .await
        .unwrap();
    manager
        .update_notification_email(&handle(), "managed-starburst", "other@example.com")
        .await
        .unwrap();

    let install = runner.json_body("/addons --body");
    assert_eq!(install["parameters"]["items"][1]["id"], "starburst-license");
    assert_eq!(install["parameters"]["items"][1]["value"], "license-text");

    let update = runner.json_body("patch /api/clusters_mgmt");
    let email = &update["parameters"]["items"][0]["value"];
    assert_eq!(email, "other@example.com");
    assert!(runner.calls().iter().any(|c| c.starts_with(&format!(
        "ocm --v=0 patch /api/clusters_mgmt/v1/clusters/{}/addons/managed-starburst --body=",
        CLUSTER_ID
    ))));
}
