//! Shared fixtures for integration tests

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use modcore::{CoreError, FactoryRegistry, Module, ModuleBehavior};

/// Install the test log subscriber; honors `RUST_LOG`, safe to call twice
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared call log threaded through probe behaviors
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Behavior that records every lifecycle call in a shared log
pub struct ProbeBehavior {
    name: String,
    log: CallLog,
}

impl ProbeBehavior {
    pub fn boxed(name: &str, log: &CallLog) -> Box<dyn ModuleBehavior> {
        Box::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
        })
    }
}

impl ModuleBehavior for ProbeBehavior {
    fn initialize(&self, _module: &Module) -> Result<bool, CoreError> {
        self.log.lock().unwrap().push(format!("init:{}", self.name));
        Ok(true)
    }

    fn process(
        &self,
        _module: &Module,
        data: Value,
        _context: Option<Value>,
    ) -> Result<Value, CoreError> {
        Ok(json!({ "processed_by": self.name, "input": data }))
    }

    fn on_shutdown(&self, _module: &Module) {
        self.log
            .lock()
            .unwrap()
            .push(format!("shutdown:{}", self.name));
    }
}

/// Behavior whose initialization always fails with a fixed message
pub struct FailingBehavior {
    message: String,
}

impl FailingBehavior {
    pub fn boxed(message: &str) -> Box<dyn ModuleBehavior> {
        Box::new(Self {
            message: message.to_string(),
        })
    }
}

impl ModuleBehavior for FailingBehavior {
    fn initialize(&self, _module: &Module) -> Result<bool, CoreError> {
        Err(CoreError::InitializationError(self.message.clone()))
    }

    fn process(
        &self,
        _module: &Module,
        _data: Value,
        _context: Option<Value>,
    ) -> Result<Value, CoreError> {
        Err(CoreError::OperationError("failing module".to_string()))
    }
}

/// Factory table covering the probe and failing variants
///
/// `pipeline::Probe` reads an optional `name` kwarg; `pipeline::Failing`
/// reads an optional `message` kwarg.
pub fn test_factories(log: &CallLog) -> FactoryRegistry {
    let mut factories = FactoryRegistry::new();

    let probe_log = Arc::clone(log);
    factories.register("pipeline", "Probe", move |kwargs| {
        let name = kwargs
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("probe")
            .to_string();
        Ok(ProbeBehavior::boxed(&name, &probe_log))
    });

    factories.register("pipeline", "Failing", |kwargs| {
        let message = kwargs
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("boom")
            .to_string();
        Ok(FailingBehavior::boxed(&message))
    });

    factories
}
