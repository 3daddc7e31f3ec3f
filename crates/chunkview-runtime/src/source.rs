#![forbid(unsafe_code)]

//! The data source collaborator.
//!
//! A [`ChunkSource`] receives requests and answers later by handing
//! [`Msg::ChunkLoaded`](crate::Msg::ChunkLoaded),
//! [`Msg::ChunkFailed`](crate::Msg::ChunkFailed) or
//! [`Msg::TotalChanged`](crate::Msg::TotalChanged) back to the session. The
//! session never waits on it. Requests are fire-and-forget; answering in any
//! order, or not at all, is allowed.

use chunkview_core::{LoadRequest, UnloadRequest};

use crate::ledger::RequestToken;

/// Where chunk data comes from.
pub trait ChunkSource {
    /// Start fetching `request`. The answer must echo `token`.
    fn request_load(&mut self, token: RequestToken, request: LoadRequest);

    /// The chunk is no longer needed. Any pending answer for it will be
    /// discarded by the session, so the source may drop the work.
    fn request_unload(&mut self, request: UnloadRequest);

    /// Report the current dataset size via `Msg::TotalChanged`.
    fn request_total(&mut self);
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn request_load(&mut self, token: RequestToken, request: LoadRequest) {
        (**self).request_load(token, request);
    }

    fn request_unload(&mut self, request: UnloadRequest) {
        (**self).request_unload(request);
    }

    fn request_total(&mut self) {
        (**self).request_total();
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn request_load(&mut self, token: RequestToken, request: LoadRequest) {
        (**self).request_load(token, request);
    }

    fn request_unload(&mut self, request: UnloadRequest) {
        (**self).request_unload(request);
    }

    fn request_total(&mut self) {
        (**self).request_total();
    }
}
