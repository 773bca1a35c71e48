use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

enum Command<T> {
    Set(T),
    Flush,
    Cancel,
}

/// 值防抖：输入在 `delay` 内保持不变后才更新输出值。
///
/// 每次 [`Debouncer::set`] 都会重新计时，未到期的旧值被丢弃。输出值与当前值
/// 相等时不会触发通知。需要在 tokio 运行时内创建。
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<Command<T>>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, commands) = mpsc::unbounded_channel();
        let (publisher, output) = watch::channel(initial);
        let task = tokio::spawn(run(commands, publisher, delay));
        Self {
            input,
            output,
            task,
        }
    }

    pub fn set(&self, value: T) {
        if self.input.send(Command::Set(value)).is_err() {
            tracing::warn!("debounce task has stopped, update dropped");
        }
    }

    /// 立即发布尚未到期的值
    pub fn flush(&self) {
        let _ = self.input.send(Command::Flush);
    }

    /// 丢弃尚未到期的值
    pub fn cancel(&self) {
        let _ = self.input.send(Command::Cancel);
    }

    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    publisher: watch::Sender<T>,
    delay: Duration,
) where
    T: PartialEq,
{
    let mut pending: Option<T> = None;
    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = commands.recv() => command,
                _ = tokio::time::sleep(delay) => {
                    publish(&publisher, pending.take());
                    continue;
                }
            }
        } else {
            commands.recv().await
        };

        match command {
            Some(Command::Set(value)) => pending = Some(value),
            Some(Command::Flush) => publish(&publisher, pending.take()),
            Some(Command::Cancel) => pending = None,
            None => break,
        }
    }
}

fn publish<T: PartialEq>(publisher: &watch::Sender<T>, value: Option<T>) {
    let Some(value) = value else {
        return;
    };
    publisher.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::sleep;

    use super::*;

    fn collect(debouncer: &Debouncer<String>) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut rx = debouncer.subscribe();
        let sink = seen.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let value = rx.borrow_and_update().clone();
                sink.lock().unwrap().push(value);
            }
        });
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_emit_once_with_final_value() {
        let debouncer = Debouncer::new(String::new(), Duration::from_millis(500));
        let seen = collect(&debouncer);

        for text in ["a", "au", "aus", "austin"] {
            debouncer.set(text.to_string());
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(debouncer.value(), "");

        sleep(Duration::from_millis(450)).await;
        assert_eq!(debouncer.value(), "austin");

        sleep(Duration::from_secs(2)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["austin".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn equal_value_does_not_notify() {
        let debouncer = Debouncer::new("x".to_string(), Duration::from_millis(200));
        let seen = collect(&debouncer);

        debouncer.set("x".to_string());
        sleep(Duration::from_millis(300)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_and_cancel() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(500));

        debouncer.set(1);
        debouncer.flush();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(debouncer.value(), 1);

        debouncer.set(2);
        debouncer.cancel();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(debouncer.value(), 1);
    }
}
