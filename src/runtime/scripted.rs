// Scripted container runtime for exercising the lifecycle controller without an engine

use super::{ContainerDetails, ContainerRuntime, ContainerSummary, RunOptions};
use crate::errors::{LocalstackError, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// How one `retry` call should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Succeed without invoking the check
    Ready,
    /// Fail without invoking the check
    Exhausted,
    /// Invoke the real check up to this many times
    Check { attempts: u32 },
}

/// Every call the controller made, in arrival order per operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedCalls {
    pub list: usize,
    pub inspect: Vec<String>,
    pub run: Vec<RunOptions>,
    pub logs: Vec<String>,
    pub retry: usize,
    pub ping: usize,
    pub purge: Vec<String>,
}

type Scripted<T> = VecDeque<std::result::Result<T, String>>;

#[derive(Default)]
struct Script {
    list: Scripted<Vec<ContainerSummary>>,
    inspect: Scripted<ContainerDetails>,
    run: Scripted<ContainerDetails>,
    logs: Scripted<String>,
    retry: VecDeque<RetryOutcome>,
    ping_error: Option<String>,
    purge_error: Option<String>,
    calls: RecordedCalls,
}

/// Container runtime that replays queued responses.
///
/// Each operation pops the next scripted response. When a queue is empty the
/// fallback is: empty listing, empty logs, a successful ping and purge, a
/// single real check per retry, and an error for inspect and run.
#[derive(Default)]
pub struct ScriptedRuntime {
    script: Mutex<Script>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_containers(self, containers: Vec<ContainerSummary>) -> Self {
        self.script().list.push_back(Ok(containers));
        self
    }

    pub fn with_list_error(self, message: &str) -> Self {
        self.script().list.push_back(Err(message.to_string()));
        self
    }

    pub fn with_inspect(self, details: ContainerDetails) -> Self {
        self.script().inspect.push_back(Ok(details));
        self
    }

    pub fn with_inspect_error(self, message: &str) -> Self {
        self.script().inspect.push_back(Err(message.to_string()));
        self
    }

    pub fn with_run(self, details: ContainerDetails) -> Self {
        self.script().run.push_back(Ok(details));
        self
    }

    pub fn with_run_error(self, message: &str) -> Self {
        self.script().run.push_back(Err(message.to_string()));
        self
    }

    pub fn with_logs(self, logs: &str) -> Self {
        self.script().logs.push_back(Ok(logs.to_string()));
        self
    }

    pub fn with_logs_error(self, message: &str) -> Self {
        self.script().logs.push_back(Err(message.to_string()));
        self
    }

    pub fn with_retry(self, outcome: RetryOutcome) -> Self {
        self.script().retry.push_back(outcome);
        self
    }

    pub fn with_ping_error(self, message: &str) -> Self {
        self.script().ping_error = Some(message.to_string());
        self
    }

    pub fn with_purge_error(self, message: &str) -> Self {
        self.script().purge_error = Some(message.to_string());
        self
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> RecordedCalls {
        self.script().calls.clone()
    }
}

fn replay<T>(queue: &mut Scripted<T>, fallback: impl FnOnce() -> Result<T>) -> Result<T> {
    match queue.pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(LocalstackError::Docker(message)),
        None => fallback(),
    }
}

impl ContainerRuntime for ScriptedRuntime {
    fn list_containers(&self, _all: bool) -> Result<Vec<ContainerSummary>> {
        let mut script = self.script();
        script.calls.list += 1;
        replay(&mut script.list, || Ok(Vec::new()))
    }

    fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let mut script = self.script();
        script.calls.inspect.push(id.to_string());
        replay(&mut script.inspect, || {
            Err(LocalstackError::Docker(format!("no such container: {}", id)))
        })
    }

    fn run_with_options(&self, options: &RunOptions) -> Result<ContainerDetails> {
        let mut script = self.script();
        script.calls.run.push(options.clone());
        replay(&mut script.run, || {
            Err(LocalstackError::Docker("no scripted run response".to_string()))
        })
    }

    fn logs(&self, id: &str) -> Result<String> {
        let mut script = self.script();
        script.calls.logs.push(id.to_string());
        replay(&mut script.logs, || Ok(String::new()))
    }

    fn ping(&self) -> Result<()> {
        let mut script = self.script();
        script.calls.ping += 1;
        match &script.ping_error {
            Some(message) => Err(LocalstackError::Docker(message.clone())),
            None => Ok(()),
        }
    }

    fn purge(&self, id: &str) -> Result<()> {
        let mut script = self.script();
        script.calls.purge.push(id.to_string());
        match &script.purge_error {
            Some(message) => Err(LocalstackError::Docker(message.clone())),
            None => Ok(()),
        }
    }

    fn retry(&self, check: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        // The guard must be released before `check` runs, since it calls back into `logs`.
        let outcome = {
            let mut script = self.script();
            script.calls.retry += 1;
            script
                .retry
                .pop_front()
                .unwrap_or(RetryOutcome::Check { attempts: 1 })
        };

        match outcome {
            RetryOutcome::Ready => Ok(()),
            RetryOutcome::Exhausted => Err(LocalstackError::RetryExhausted {
                attempts: 0,
                last_error: "scripted exhaustion".to_string(),
            }),
            RetryOutcome::Check { attempts } => {
                let mut last_error = String::from("no attempts made");
                for _ in 0..attempts {
                    match check() {
                        Ok(()) => return Ok(()),
                        Err(e) => last_error = e.to_string(),
                    }
                }
                Err(LocalstackError::RetryExhausted {
                    attempts,
                    last_error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_replay_in_order() {
        let runtime = ScriptedRuntime::new()
            .with_logs("first")
            .with_logs_error("boom")
            .with_list_error("daemon down");

        assert_eq!(runtime.logs("c1").unwrap(), "first");
        assert!(matches!(runtime.logs("c1"), Err(LocalstackError::Docker(m)) if m == "boom"));
        assert_eq!(runtime.logs("c1").unwrap(), "");
        assert!(runtime.list_containers(true).is_err());
        assert!(runtime.list_containers(true).unwrap().is_empty());

        let calls = runtime.calls();
        assert_eq!(calls.logs.len(), 3);
        assert_eq!(calls.list, 2);
    }

    #[test]
    fn test_retry_check_runs_until_success() {
        let runtime = ScriptedRuntime::new().with_retry(RetryOutcome::Check { attempts: 5 });
        let mut calls = 0;
        runtime
            .retry(&mut || {
                calls += 1;
                if calls == 3 {
                    Ok(())
                } else {
                    Err(LocalstackError::NotReady)
                }
            })
            .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_scripted_retry_skips_check() {
        let runtime = ScriptedRuntime::new()
            .with_retry(RetryOutcome::Ready)
            .with_retry(RetryOutcome::Exhausted);
        let mut invoked = false;

        let first = runtime.retry(&mut || {
            invoked = true;
            Ok(())
        });
        let second = runtime.retry(&mut || Ok(()));

        assert!(first.is_ok());
        assert!(second.is_err());
        assert!(!invoked);
        assert_eq!(runtime.calls().retry, 2);
    }
}
