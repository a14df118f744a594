//! A generic single-threaded actor primitive (spec §5, §9 "Actors replace
//! per-module processes"): a dedicated thread owns its state and processes
//! one request at a time from a bounded channel, replying on a one-shot
//! channel the caller blocks on. Used by `gk-repository` for the working-tree
//! actor and can host any other serialized owner the façade needs.

use crossbeam_channel::{bounded, Sender};
use std::thread;

/// A single long-lived owner of mutable state, dispatching one request type
/// to one reply type. Implementors run on the actor's dedicated thread; `Self`
/// need not be `Sync`, only `Send` (it is moved onto that thread once).
pub trait Handler: Send + 'static {
    type Request: Send + 'static;
    type Reply: Send + 'static;

    fn handle(&mut self, request: Self::Request) -> Self::Reply;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("actor has terminated")]
    Terminated,
}

struct Envelope<Req, Rep> {
    request: Req,
    reply_to: Sender<Rep>,
}

/// A handle to a running actor. Cloning shares the same underlying thread;
/// dropping the last handle closes the request channel, which ends the
/// actor's thread after it drains any in-flight request.
pub struct Actor<H: Handler> {
    sender: Sender<Envelope<H::Request, H::Reply>>,
}

impl<H: Handler> Clone for Actor<H> {
    fn clone(&self) -> Self {
        Actor {
            sender: self.sender.clone(),
        }
    }
}

impl<H: Handler> Actor<H> {
    /// Spawns `handler` onto its own thread with a mailbox of depth `mailbox_depth`.
    pub fn spawn(handler: H, mailbox_depth: usize) -> Self {
        let (tx, rx) = bounded::<Envelope<H::Request, H::Reply>>(mailbox_depth.max(1));
        thread::spawn(move || {
            let mut handler = handler;
            while let Ok(envelope) = rx.recv() {
                let reply = handler.handle(envelope.request);
                // The caller may have abandoned its request (spec §5
                // "Cancellation"); a closed reply channel is not an error.
                let _ = envelope.reply_to.send(reply);
            }
            tracing::debug!("actor mailbox closed, thread exiting");
        });
        Actor { sender: tx }
    }

    /// Sends `request` and blocks for the reply. Fails only if the actor's
    /// thread has already exited (mailbox dropped).
    pub fn call(&self, request: H::Request) -> Result<H::Reply, Error> {
        let (reply_tx, reply_rx) = bounded(1);
        self.sender
            .send(Envelope {
                request,
                reply_to: reply_tx,
            })
            .map_err(|_| Error::Terminated)?;
        reply_rx.recv().map_err(|_| Error::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct Counter(u64);

    impl Handler for Counter {
        type Request = i64;
        type Reply = u64;

        fn handle(&mut self, request: i64) -> u64 {
            self.0 = (self.0 as i64 + request) as u64;
            self.0
        }
    }

    #[test]
    fn serializes_calls_and_returns_replies_in_order() {
        let actor = Actor::spawn(Counter(0), 8);
        assert_eq!(actor.call(5).unwrap(), 5);
        assert_eq!(actor.call(3).unwrap(), 8);
        assert_eq!(actor.call(-2).unwrap(), 6);
    }

    #[test]
    fn concurrent_callers_are_serialized() {
        let actor = Actor::spawn(Counter(0), 32);
        let seen = Arc::new(AtomicU64::new(0));
        let mut threads = Vec::new();
        for _ in 0..16 {
            let actor = actor.clone();
            let seen = seen.clone();
            threads.push(std::thread::spawn(move || {
                let reply = actor.call(1).unwrap();
                seen.fetch_max(reply, Ordering::SeqCst);
            }));
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(actor.call(0).unwrap(), 16);
    }

    #[test]
    fn dropping_actor_ends_pending_calls_as_terminated() {
        let actor = Actor::spawn(Counter(0), 1);
        drop(actor);
    }
}
