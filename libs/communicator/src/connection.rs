//! A single peer connection: a reader task demultiplexing frames into
//! per-tag FIFO queues, and a writer guarded by a mutex.

use crate::{
    errors::Error,
    stream::MaybeTlsStream,
    tag::Tag,
    wire::{read_frame, write_frame, Frame},
};
use cicada_party::Rank;
use rustc_hash::FxHashMap;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{split, WriteHalf},
    sync::{Mutex, Notify},
};

struct Inbox {
    queues: Mutex<FxHashMap<Tag, VecDeque<Vec<u8>>>>,
    notify: Notify,
    revoked: AtomicBool,
    terminated: AtomicBool,
}

impl Inbox {
    fn new() -> Self {
        Self { queues: Mutex::new(FxHashMap::default()), notify: Notify::new(), revoked: AtomicBool::new(false), terminated: AtomicBool::new(false) }
    }

    async fn push(&self, tag: Tag, payload: Vec<u8>) {
        self.queues.lock().await.entry(tag).or_default().push_back(payload);
        self.notify.notify_waiters();
    }

    fn mark_revoked(&self) {
        self.revoked.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn try_pop(&self, tag: Tag) -> Option<Vec<u8>> {
        self.queues.lock().await.get_mut(&tag).and_then(VecDeque::pop_front)
    }

    async fn recv(&self, tag: Tag, timeout: Option<Duration>) -> Result<Vec<u8>, Error> {
        loop {
            // Register for the next notification before checking the queue/flags,
            // so a `notify_waiters()` racing with this loop iteration can't be
            // missed between the check and the await below.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(tag).await {
                return Ok(payload);
            }
            if self.revoked.load(Ordering::SeqCst) {
                return Err(Error::Revoked);
            }
            if self.terminated.load(Ordering::SeqCst) {
                return Err(Error::Terminated(0));
            }
            match timeout {
                Some(duration) => {
                    if tokio::time::timeout(duration, notified).await.is_err() {
                        return Err(Error::Timeout);
                    }
                }
                None => notified.await,
            }
        }
    }
}

/// A live connection to one peer.
pub(crate) struct Connection {
    pub(crate) peer_rank: Rank,
    writer: Mutex<WriteHalf<MaybeTlsStream>>,
    inbox: Arc<Inbox>,
    serial: AtomicU64,
    reader_task: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub(crate) fn spawn(peer_rank: Rank, stream: MaybeTlsStream) -> Arc<Self> {
        let (mut read_half, write_half) = split(stream);
        let inbox = Arc::new(Inbox::new());
        let reader_inbox = inbox.clone();
        let reader_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut read_half).await {
                    Ok(frame) => {
                        if frame.tag == Tag::REVOKE {
                            reader_inbox.mark_revoked();
                        } else {
                            reader_inbox.push(frame.tag, frame.payload).await;
                        }
                    }
                    Err(_) => {
                        reader_inbox.mark_terminated();
                        break;
                    }
                }
            }
        });
        Arc::new(Self { peer_rank, writer: Mutex::new(write_half), inbox, serial: AtomicU64::new(0), reader_task })
    }

    pub(crate) async fn send(&self, tag: Tag, src_rank: u32, payload: Vec<u8>) -> Result<(), Error> {
        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let frame = Frame { tag, src_rank, serial, payload };
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &frame).await
    }

    pub(crate) async fn recv(&self, tag: Tag, timeout: Option<Duration>) -> Result<Vec<u8>, Error> {
        self.inbox.recv(tag, timeout).await
    }

    pub(crate) fn poison(&self) {
        self.inbox.mark_revoked();
    }

    pub(crate) fn close(&self) {
        self.reader_task.abort();
    }
}
