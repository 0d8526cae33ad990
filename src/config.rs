use crate::error::{Error, Result};

/// Hard upper bound on the worker threads any pool may be configured with.
pub const MAX_THREADS: usize = 20;

/// Upper bound on outstanding (queued plus running) tasks per pool.
pub const MAX_TASKS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_workers: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().min(MAX_THREADS),
            thread_name_prefix: "lazypool-worker".to_string(),
            stack_size: None,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::invalid_argument("max_workers must be > 0"));
        }
        if self.max_workers > MAX_THREADS {
            return Err(Error::invalid_argument(format!(
                "max_workers too large (max {})",
                MAX_THREADS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = n;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
