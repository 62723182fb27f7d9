use std::sync::mpsc;
use std::time::Duration;

pub const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

#[derive(Debug, PartialEq)]
pub enum WorkerPoll<T> {
    Pending,
    Ready(T),
    /// The worker thread ended without sending a result.
    Lost,
}

/// Receiving half of a background job; polled from the editor thread.
#[derive(Debug)]
pub struct WorkerHandle<T> {
    rx: mpsc::Receiver<T>,
}

pub fn spawn_worker<T, W>(work: W) -> WorkerHandle<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });
    WorkerHandle { rx }
}

impl<T> WorkerHandle<T> {
    pub fn try_take(&self) -> WorkerPoll<T> {
        match self.rx.try_recv() {
            Ok(result) => WorkerPoll::Ready(result),
            Err(mpsc::TryRecvError::Empty) => WorkerPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn settle<T>(handle: &WorkerHandle<T>) -> WorkerPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match handle.try_take() {
                WorkerPoll::Pending if Instant::now() < deadline => {
                    std::thread::sleep(RESULT_POLL_INTERVAL);
                }
                poll => return poll,
            }
        }
    }

    #[test]
    fn worker_result_is_delivered_once() {
        let handle = spawn_worker(|| 41 + 1);
        assert_eq!(settle(&handle), WorkerPoll::Ready(42));
        assert_eq!(handle.try_take(), WorkerPoll::Lost);
    }

    #[test]
    fn panicking_worker_reports_lost() {
        let handle = spawn_worker(|| -> u8 { panic!("worker failed") });
        assert_eq!(settle(&handle), WorkerPoll::Lost);
    }
}
