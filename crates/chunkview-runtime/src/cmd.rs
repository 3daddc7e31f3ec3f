#![forbid(unsafe_code)]

//! Commands: the requests a session asks its host to carry out.
//!
//! [`Session::update`](crate::Session::update) never talks to the data source
//! itself. It returns a [`Cmd`] describing what to request, and the host
//! either forwards it with [`Cmd::dispatch`] or inspects it.
//!
//! Within one batch, loads queued by an earlier materialization come first,
//! then the unloads of the reconcile pass, then its loads.

use chunkview_core::{LoadRequest, UnloadRequest};

use crate::ledger::RequestToken;
use crate::source::ChunkSource;

/// A request for the data source, or a group of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cmd {
    /// Nothing to do.
    #[default]
    None,
    /// Load one chunk. The answer must echo `token`.
    Load {
        /// Token the completion must carry.
        token: RequestToken,
        /// Range to load.
        request: LoadRequest,
    },
    /// Release one chunk.
    Unload(UnloadRequest),
    /// Ask for the current dataset size.
    RequestTotal,
    /// Several commands, in order.
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Create a no-op command.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a load command.
    #[inline]
    #[must_use]
    pub fn load(token: RequestToken, request: LoadRequest) -> Self {
        Self::Load { token, request }
    }

    /// Create an unload command.
    #[inline]
    #[must_use]
    pub fn unload(request: UnloadRequest) -> Self {
        Self::Unload(request)
    }

    /// Combine commands. No-ops are dropped; an empty batch is `None` and a
    /// single command is returned unwrapped.
    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    /// Whether this is a no-op.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Leaf commands in dispatch order, with batches expanded.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Self>) {
        match self {
            Self::None => {}
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.flatten_into(out);
                }
            }
            leaf => out.push(leaf),
        }
    }

    /// Load commands contained in this command, in order.
    #[must_use]
    pub fn loads(&self) -> Vec<(RequestToken, LoadRequest)> {
        let mut out = Vec::new();
        self.visit(&mut |cmd| {
            if let Self::Load { token, request } = cmd {
                out.push((*token, *request));
            }
        });
        out
    }

    /// Unload commands contained in this command, in order.
    #[must_use]
    pub fn unloads(&self) -> Vec<UnloadRequest> {
        let mut out = Vec::new();
        self.visit(&mut |cmd| {
            if let Self::Unload(request) = cmd {
                out.push(*request);
            }
        });
        out
    }

    /// Number of leaf commands.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.visit(&mut |_| n += 1);
        n
    }

    fn visit(&self, f: &mut impl FnMut(&Self)) {
        match self {
            Self::None => {}
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.visit(f);
                }
            }
            leaf => f(leaf),
        }
    }

    /// Forward every leaf command to `source`. Returns how many were sent.
    pub fn dispatch<S: ChunkSource + ?Sized>(self, source: &mut S) -> usize {
        let leaves = self.flatten();
        let sent = leaves.len();
        for cmd in leaves {
            match cmd {
                Self::Load { token, request } => source.request_load(token, request),
                Self::Unload(request) => source.request_unload(request),
                Self::RequestTotal => source.request_total(),
                Self::None | Self::Batch(_) => {}
            }
        }
        if sent > 0 {
            tracing::trace!(target: "chunkview.session", sent, "dispatched commands");
        }
        sent
    }
}
