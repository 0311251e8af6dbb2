use recap_agent::pipeline::DigestContext;
use recap_agent::runtime::AgentRuntime;
use recap_core::config::RecapConfig;
use recap_memory::RateLimiter;

/// Process-wide state shared with the Discord adapter.
pub struct AppState {
    pub config: RecapConfig,
    pub agent: AgentRuntime,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: RecapConfig, agent: AgentRuntime, limiter: RateLimiter) -> Self {
        Self {
            config,
            agent,
            limiter,
        }
    }
}

impl DigestContext for AppState {
    fn agent(&self) -> &AgentRuntime {
        &self.agent
    }

    fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
