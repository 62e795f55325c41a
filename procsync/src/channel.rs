//! Ordered message transport between exactly two execution units.
//!
//! Messages are serialized when sent and deserialized when received, so a
//! receiver always gets its own copy and nothing is ever shared by reference
//! across the link, just as with a pipe between two processes.
//!
//! End-of-stream is signalled in-band: [`Sender::finish`] sends a sentinel
//! frame, which the receiving side observes as `Ok(None)`. A peer that goes
//! away *without* sending the sentinel is reported as
//! [`Error::ChannelBroken`].
//!
//! # Examples
//!
//! ```
//! use procsync::{channel, unit};
//!
//! let (parent, mut child) = channel::pipe::<String>();
//!
//! let sender = unit::spawn("sender", move || -> procsync::Result<()> {
//!     for msg in ["Hello", "How are you", "Good, thanks"] {
//!         parent.send(&msg.to_owned())?;
//!     }
//!     parent.finish()
//! });
//!
//! let mut received = Vec::new();
//! while let Some(msg) = child.recv().unwrap() {
//!     received.push(msg);
//! }
//!
//! sender.join().unwrap().unwrap();
//! assert_eq!(received, ["Hello", "How are you", "Good, thanks"]);
//! ```
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::sync::mpsc;
use crate::{Error, Result};

/// The number of frames a link buffers before [`Sender::send`] blocks.
pub const DEFAULT_CAPACITY: usize = 64;

/// A unit of transfer on a link.
#[derive(Debug, Deserialize, Serialize)]
enum Frame<T> {
    Message(T),
    End,
}

/// Creates a one-directional link with room for `capacity` frames.
///
/// A `capacity` of zero makes every send wait for the matching receive.
pub fn simplex<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (link_tx, link_rx) = mpsc::sync_channel(capacity);
    (
        Sender {
            link: link_tx,
            _message_type: PhantomData,
        },
        Receiver {
            link: link_rx,
            finished: false,
            _message_type: PhantomData,
        },
    )
}

/// Creates a pair of linked duplex endpoints, each buffering up to
/// [`DEFAULT_CAPACITY`] frames per direction.
pub fn pipe<T>() -> (Endpoint<T>, Endpoint<T>) {
    pipe_with_capacity(DEFAULT_CAPACITY)
}

/// Creates a pair of linked duplex endpoints, each buffering up to
/// `capacity` frames per direction.
pub fn pipe_with_capacity<T>(capacity: usize) -> (Endpoint<T>, Endpoint<T>) {
    let (left_tx, right_rx) = simplex(capacity);
    let (right_tx, left_rx) = simplex(capacity);
    (
        Endpoint {
            sender: left_tx,
            receiver: left_rx,
        },
        Endpoint {
            sender: right_tx,
            receiver: right_rx,
        },
    )
}

/// The sending half of a link.
pub struct Sender<T> {
    link: mpsc::SyncSender<Vec<u8>>,
    _message_type: PhantomData<fn(T)>,
}

impl<T: Serialize> Sender<T> {
    /// Sends a message, blocking while the link is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelBroken`] if the receiving side is gone, and
    /// [`Error::Codec`] if the message cannot be serialized.
    pub fn send(&self, msg: &T) -> Result<()> {
        self.transmit(&Frame::Message(msg))
    }

    /// Sends the end-of-stream sentinel.
    ///
    /// The link stays usable afterwards; the sentinel only tells the receiver
    /// that the stream it was reading is complete.
    pub fn finish(&self) -> Result<()> {
        self.transmit(&Frame::<&T>::End)
    }

    fn transmit(&self, frame: &Frame<&T>) -> Result<()> {
        let bytes = serde_json::to_vec(frame)?;
        trace!(len = bytes.len(), "sending frame");
        self.link.send(bytes).map_err(|_| Error::ChannelBroken)
    }
}

/// The receiving half of a link.
pub struct Receiver<T> {
    link: mpsc::Receiver<Vec<u8>>,
    finished: bool,
    _message_type: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Receiver<T> {
    /// Blocks until the next frame arrives.
    ///
    /// Returns `Ok(Some(msg))` for a message, and `Ok(None)` for the
    /// end-of-stream sentinel. A sender that goes away right after a sentinel
    /// keeps producing `Ok(None)`; one that sends more messages after the
    /// sentinel has to finish again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelBroken`] if the sender is gone and never sent
    /// the sentinel, and [`Error::Codec`] if a frame cannot be decoded.
    pub fn recv(&mut self) -> Result<Option<T>> {
        match self.link.recv() {
            Ok(bytes) => {
                trace!(len = bytes.len(), "received frame");
                match serde_json::from_slice::<Frame<T>>(&bytes)? {
                    Frame::Message(msg) => {
                        self.finished = false;
                        Ok(Some(msg))
                    }
                    Frame::End => {
                        self.finished = true;
                        Ok(None)
                    }
                }
            }
            Err(_) if self.finished => Ok(None),
            Err(_) => Err(Error::ChannelBroken),
        }
    }

    /// Returns an iterator over messages that stops at the end-of-stream
    /// sentinel, or after the first error.
    pub fn iter(&mut self) -> Iter<'_, T> {
        Iter {
            receiver: self,
            done: false,
        }
    }
}

/// An iterator over the messages of a [`Receiver`]. See [`Receiver::iter`].
pub struct Iter<'a, T> {
    receiver: &'a mut Receiver<T>,
    done: bool,
}

impl<T: DeserializeOwned> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.receiver.recv() {
            Ok(Some(msg)) => Some(Ok(msg)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// One end of a duplex link created by [`pipe`].
pub struct Endpoint<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T: Serialize + DeserializeOwned> Endpoint<T> {
    /// Sends a message to the other endpoint. See [`Sender::send`].
    pub fn send(&self, msg: &T) -> Result<()> {
        self.sender.send(msg)
    }

    /// Sends the end-of-stream sentinel. See [`Sender::finish`].
    pub fn finish(&self) -> Result<()> {
        self.sender.finish()
    }

    /// Receives the next frame sent by the other endpoint. See [`Receiver::recv`].
    pub fn recv(&mut self) -> Result<Option<T>> {
        self.receiver.recv()
    }

    /// See [`Receiver::iter`].
    pub fn iter(&mut self) -> Iter<'_, T> {
        self.receiver.iter()
    }
}

impl<T> Endpoint<T> {
    /// Splits the endpoint into its sending and receiving halves, so they can
    /// be moved into different units.
    pub fn split(self) -> (Sender<T>, Receiver<T>) {
        (self.sender, self.receiver)
    }
}
