use std::sync::Arc;

use apo_core::agent::{Agent, AskResult};
use tokio::runtime::Handle;

/// Synchronous access to the query interpreter for the UI thread.
pub trait QueryService: Send {
    fn ask(&self, query: &str) -> AskResult;
}

/// Drives the async [`Agent`] to completion on the shared runtime.
///
/// Must be called from a blocking thread (the UI loop runs under
/// `spawn_blocking`), never from inside an async task.
pub struct BlockingAgent {
    agent: Arc<Agent>,
    handle: Handle,
}

impl BlockingAgent {
    pub fn new(agent: Arc<Agent>, handle: Handle) -> Self {
        Self { agent, handle }
    }
}

impl QueryService for BlockingAgent {
    fn ask(&self, query: &str) -> AskResult {
        self.handle.block_on(self.agent.ask(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeSource;

    #[test]
    fn test_blocking_agent_from_plain_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let agent = Arc::new(Agent::new(Arc::new(FakeSource::new())));
        let service = BlockingAgent::new(agent, runtime.handle().clone());

        let result = std::thread::spawn(move || service.ask("list pipelines"))
            .join()
            .unwrap();
        assert!(result.success);
        assert!(result.message.starts_with("Found "));
    }
}
