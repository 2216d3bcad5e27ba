//! Duplex text-frame transport with a movable deadline.

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;

/// Inbound half of a client connection.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Next text frame, or `None` once the peer closed the connection.
    async fn read_frame(&mut self) -> AppResult<Option<String>>;
}

/// Outbound half of a client connection.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Writes one text frame.
    async fn write_frame(&mut self, frame: &str) -> AppResult<()>;

    /// Closes the connection. Errors are not actionable at this point.
    async fn close(&mut self);
}

#[async_trait]
impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    async fn read_frame(&mut self) -> AppResult<Option<String>> {
        (**self).read_frame().await
    }
}

#[async_trait]
impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    async fn write_frame(&mut self, frame: &str) -> AppResult<()> {
        (**self).write_frame(frame).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Absolute deadline shared by both halves of one connection.
///
/// Moving or clearing it takes effect on reads and writes already in flight.
#[derive(Debug)]
pub struct Deadline {
    tx: watch::Sender<Option<Instant>>,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new()
    }
}

impl Deadline {
    /// No deadline.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Sets the deadline `after` from now.
    pub fn set_after(&self, after: Duration) {
        self.tx.send_replace(Some(Instant::now() + after));
    }

    /// Removes the deadline.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Current deadline.
    pub fn current(&self) -> Option<Instant> {
        *self.tx.borrow()
    }

    /// Wraps a transport half so it honours this deadline.
    pub fn bind<T>(&self, inner: T) -> Deadlined<T> {
        Deadlined {
            inner,
            deadline: self.tx.subscribe(),
        }
    }
}

/// A transport half whose operations fail with a `Timeout` error once the
/// bound [`Deadline`] passes.
#[derive(Debug)]
pub struct Deadlined<T> {
    inner: T,
    deadline: watch::Receiver<Option<Instant>>,
}

/// Runs `op` until it completes or the watched deadline passes, following
/// deadline changes made while it runs.
async fn run_until_deadline<F, R>(
    deadline: &mut watch::Receiver<Option<Instant>>,
    op: F,
    what: &'static str,
) -> AppResult<R>
where
    F: Future<Output = AppResult<R>>,
{
    tokio::pin!(op);
    let mut watching = true;

    loop {
        let at = *deadline.borrow_and_update();
        tokio::select! {
            result = &mut op => return result,
            _ = sleep_until(at) => {
                return Err(AppError::timeout(format!("{what} deadline elapsed")));
            }
            changed = deadline.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                }
            }
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl<T: FrameSource> FrameSource for Deadlined<T> {
    async fn read_frame(&mut self) -> AppResult<Option<String>> {
        let Self { inner, deadline } = self;
        run_until_deadline(deadline, inner.read_frame(), "read").await
    }
}

#[async_trait]
impl<T: FrameSink> FrameSink for Deadlined<T> {
    async fn write_frame(&mut self, frame: &str) -> AppResult<()> {
        let Self { inner, deadline } = self;
        run_until_deadline(deadline, inner.write_frame(frame), "write").await
    }

    async fn close(&mut self) {
        self.inner.close().await
    }
}
