//! Shared test utilities for ocmqe-cluster integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ocmqe_cluster::ClusterManager;
use ocmqe_core::types::SettleConfig;
use ocmqe_core::{CommandError, CommandOutput, CommandRunner, HarnessConfig, Invocation};

pub const CLUSTER_ID: &str = "2ans0g24pc4l4f08fcu6tdusf883avvu";

struct Rule {
    pattern: String,
    responses: VecDeque<CommandOutput>,
}

/// A file handed to a command through `--body=<path>` or `-f <path>`
#[derive(Debug, Clone)]
pub struct SentFile {
    pub command: String,
    pub content: String,
}

/// Scripted command runner
///
/// Each rule matches when its pattern is a substring of the displayed
/// command line; the first matching rule wins. A rule answers with its
/// responses in order and keeps repeating the last one. Unmatched commands
/// exit with 127.
#[derive(Default)]
pub struct MockRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
    files: Mutex<Vec<SentFile>>,
}

impl MockRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, pattern: &str, output: CommandOutput) -> &Self {
        self.on_seq(pattern, vec![output])
    }

    pub fn on_seq(&self, pattern: &str, outputs: Vec<CommandOutput>) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            responses: outputs.into(),
        });
        self
    }

    /// Displayed command lines, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    /// Index of the first call matching `pattern`
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.contains(pattern))
    }

    pub fn files(&self) -> Vec<SentFile> {
        self.files.lock().unwrap().clone()
    }

    /// Parsed JSON body of the first command matching `pattern`
    pub fn json_body(&self, pattern: &str) -> serde_json::Value {
        let file = self
            .files()
            .into_iter()
            .find(|f| f.command.contains(pattern))
            .unwrap_or_else(|| panic!("no body sent by a command matching {:?}", pattern));
        serde_json::from_str(&file.content).unwrap()
    }

    fn record_files(&self, invocation: &Invocation) {
        let args = invocation.arguments();
        let mut paths = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            if let Some(path) = arg.strip_prefix("--body=") {
                paths.push(path.to_string());
            } else if arg == "-f" {
                if let Some(path) = args.get(i + 1) {
                    paths.push(path.clone());
                }
            }
        }
        for path in paths {
            if let Ok(content) = std::fs::read_to_string(&path) {
                self.files.lock().unwrap().push(SentFile {
                    command: invocation.to_string(),
                    content,
                });
            }
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.record_files(invocation);

        let line = invocation.to_string();
        let mut rules = self.rules.lock().unwrap();
        let output = match rules.iter_mut().find(|r| line.contains(&r.pattern)) {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front(),
            Some(rule) => rule.responses.front().cloned(),
            None => None,
        };
        let unmatched = || CommandOutput::failed(127, format!("no mock for: {}", line));
        Ok(output.unwrap_or_else(unmatched))
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput::ok(stdout)
}

pub fn fail(stderr: &str) -> CommandOutput {
    CommandOutput::failed(1, stderr)
}

/// `ocm describe cluster --json` output in the given state
pub fn describe(state: &str) -> CommandOutput {
    ok(&serde_json::json!({
        "kind": "Cluster",
        "id": CLUSTER_ID,
        "name": "qe-cluster",
        "external_id": "feb5a50a-b9ce-40ad-99a7-69159f0ca957",
        "state": state,
        "console": {"url": "https://console-openshift-console.apps.qe-cluster.x8k2.p1.openshiftapps.com"},
        "api": {"url": "https://api.qe-cluster.x8k2.p1.openshiftapps.com:6443"},
        "version": {
            "raw_id": "4.14.12",
            "channel_group": "stable",
            "available_upgrades": ["4.14.13", "4.15.2"]
        }
    })
    .to_string())
}

/// `ocm list addons --columns id,state` output with one add-on row
pub fn addons(addon: &str, state: &str) -> CommandOutput {
    ok(&format!(
        "ID                  STATE\n{:<20}{}\nother-addon         not installed\n",
        addon, state
    ))
}

/// `oc get csv -o json` output with one CSV
pub fn csvs(name: &str, phase: &str) -> CommandOutput {
    ok(&serde_json::json!({
        "items": [{"metadata": {"name": name}, "status": {"phase": phase}}]
    })
    .to_string())
}

/// Harness configuration without settle delays
pub fn quick_config() -> HarnessConfig {
    HarnessConfig {
        settle: SettleConfig::none(),
        ..Default::default()
    }
}

pub fn manager(runner: &Arc<MockRunner>) -> ClusterManager {
    manager_with(runner, quick_config())
}

pub fn manager_with(runner: &Arc<MockRunner>, config: HarnessConfig) -> ClusterManager {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    ClusterManager::new(runner, config)
}

/// Mock that resolves any cluster name to [`CLUSTER_ID`]
pub fn resolving_runner() -> Arc<MockRunner> {
    let runner = MockRunner::new();
    runner.on("ocm list clusters", ok(&format!("{}\n", CLUSTER_ID)));
    runner
}
