//! Throttled, bounded batching of a stream.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::BufferWindow;

/// Re-emits a source stream as batches, at most one batch per `period`.
///
/// - The first item after a quiet period is delivered immediately.
/// - Items arriving within the period are collected and flushed together
///   at `last_flush + period`.
/// - A window holds at most `buffer_size` items; when it overflows the
///   oldest items are dropped.
/// - When the source ends, what is left is flushed at the next allowed
///   instant and the stream ends.
///
/// Dropping the buffer, or calling [`ThrottledBuffer::cancel`], stops the
/// shaping task; nothing is delivered afterwards.
pub struct ThrottledBuffer<T> {
    batches: mpsc::UnboundedReceiver<Vec<T>>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl<T: Send + 'static> ThrottledBuffer<T> {
    /// Starts shaping `source`. Requires a Tokio runtime.
    pub fn new<S>(source: S, period: Duration, buffer_size: usize) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        let (tx, batches) = mpsc::unbounded_channel();
        let task = tokio::spawn(shape(source, period, buffer_size, tx));
        Self {
            batches,
            task,
            cancelled: false,
        }
    }
}

impl<T> ThrottledBuffer<T> {
    /// Stops shaping; the stream ends immediately and buffered items are
    /// discarded.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.task.abort();
        self.batches.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<T> Stream for ThrottledBuffer<T> {
    type Item = Vec<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        self.batches.poll_recv(cx)
    }
}

impl<T> Drop for ThrottledBuffer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn shape<S, T>(
    source: S,
    period: Duration,
    buffer_size: usize,
    tx: mpsc::UnboundedSender<Vec<T>>,
) where
    S: Stream<Item = T>,
{
    let mut source = Box::pin(source);
    let mut window = BufferWindow::new(buffer_size);

    loop {
        let deadline = window.next_flush_at(period).filter(|_| !window.is_empty());

        tokio::select! {
            item = source.next() => match item {
                Some(item) => {
                    let dropped = window.push(item);
                    if dropped > 0 {
                        tracing::debug!(
                            dropped,
                            capacity = window.capacity(),
                            "Throttle window full, dropped oldest items"
                        );
                    }
                    if window.is_due(Instant::now(), period) && !flush(&mut window, &tx) {
                        return;
                    }
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if !flush(&mut window, &tx) {
                    return;
                }
            }
        }
    }

    if !window.is_empty() {
        if let Some(at) = window.next_flush_at(period) {
            sleep_until(at).await;
        }
        flush(&mut window, &tx);
    }
}

/// Sends the window's contents; returns false once nobody is listening.
fn flush<T>(window: &mut BufferWindow<T>, tx: &mpsc::UnboundedSender<Vec<T>>) -> bool {
    window.mark_flushed(Instant::now());
    tx.send(window.take()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as source_channel;

    const PERIOD: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn first_item_is_immediate_then_windowed() {
        let (tx, rx) = source_channel::unbounded();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 50);
        let start = Instant::now();

        tx.unbounded_send(1).unwrap();
        assert_eq!(buffer.next().await, Some(vec![1]));
        assert_eq!(Instant::now(), start);

        tx.unbounded_send(2).unwrap();
        tx.unbounded_send(3).unwrap();
        assert_eq!(buffer.next().await, Some(vec![2, 3]));
        assert_eq!(Instant::now(), start + PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_keeps_newest_items() {
        let (tx, rx) = source_channel::unbounded();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 3);

        tx.unbounded_send(0).unwrap();
        assert_eq!(buffer.next().await, Some(vec![0]));

        for i in 1..=7 {
            tx.unbounded_send(i).unwrap();
        }
        assert_eq!(buffer.next().await, Some(vec![5, 6, 7]));
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_items_flush_when_source_ends() {
        let (tx, rx) = source_channel::unbounded();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 50);

        tx.unbounded_send("a").unwrap();
        assert_eq!(buffer.next().await, Some(vec!["a"]));

        tx.unbounded_send("b").unwrap();
        drop(tx);

        assert_eq!(buffer.next().await, Some(vec!["b"]));
        assert_eq!(buffer.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_resets_throttle() {
        let (tx, rx) = source_channel::unbounded();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 50);

        tx.unbounded_send(1).unwrap();
        assert_eq!(buffer.next().await, Some(vec![1]));

        tokio::time::sleep(PERIOD * 4).await;
        let before = Instant::now();
        tx.unbounded_send(2).unwrap();
        assert_eq!(buffer.next().await, Some(vec![2]));
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_stream_and_discards_buffer() {
        let (tx, rx) = source_channel::unbounded();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 50);

        tx.unbounded_send(1).unwrap();
        assert_eq!(buffer.next().await, Some(vec![1]));
        tx.unbounded_send(2).unwrap();

        buffer.cancel();
        assert!(buffer.is_cancelled());
        assert_eq!(buffer.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn ending_source_with_empty_window_ends_stream() {
        let (tx, rx) = source_channel::unbounded::<u8>();
        let mut buffer = ThrottledBuffer::new(rx, PERIOD, 50);

        drop(tx);
        assert_eq!(buffer.next().await, None);
    }
}
