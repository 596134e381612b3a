use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::info;

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Collects the bot's background loops and spawns them together once the
/// services they need are built.
#[derive(Default)]
pub struct TaskRunner {
    tasks: Vec<(&'static str, Task)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, Box::pin(task)));
    }

    pub fn start_all(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|(name, task)| {
                info!(task = name, "starting background task");
                tokio::spawn(task)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn starts_every_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        for name in ["first", "second"] {
            let counter = counter.clone();
            runner.add_task(name, async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        let handles = runner.start_all();
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
