//! Background-worker offload for large conversions.
//!
//! Structural conversion is pure computation, so inputs above the size
//! threshold run on a worker thread while the caller keeps its UI thread
//! free. Worker and caller communicate exclusively through a message
//! channel: zero or more `Progress` messages followed by exactly one
//! terminal message (`Success`, `Fallback` or `Error`). There is no shared
//! mutable state and no cancellation - once started, a conversion runs to
//! completion or failure.
//!
//! High-fidelity rendering needs the DOM surface, which only exists on the
//! calling thread; a worker asked for it answers `Fallback` and the caller
//! re-runs synchronously.

use crate::strategy::structural::convert_sync;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// What the worker is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Registry-driven structural conversion (pure, worker-safe)
    Structural,
    /// DOM-surface rendering - always answered with `Fallback`
    HighFidelity,
}

/// Messages the worker sends back.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Ordered progress update
    Progress { percent: u8, label: String },
    /// Terminal: conversion finished with this HTML
    Success(String),
    /// Terminal: the request needs a render surface the worker lacks
    Fallback(String),
    /// Terminal: conversion failed
    Error(String),
}

/// Outcome of an offloaded conversion, from the caller's point of view.
#[derive(Debug)]
pub enum OffloadOutcome {
    /// The worker produced the HTML
    Completed(String),
    /// The worker could not finish; re-run synchronously on this thread
    NeedsSync(String),
}

/// Spawn a detached worker that owns the input buffer.
///
/// The buffer is moved into the worker - transferred, not copied - which
/// is what keeps large payloads from being duplicated. Returns the
/// receiving end of the message channel; spawn failure is an `Err`.
pub fn spawn_conversion(
    bytes: Vec<u8>,
    request: WorkerRequest,
) -> std::io::Result<Receiver<WorkerMessage>> {
    let (tx, rx) = channel();
    thread::Builder::new()
        .name("longan-worker".to_string())
        .spawn(move || run_worker(&bytes, request, &tx))?;
    Ok(rx)
}

fn run_worker(bytes: &[u8], request: WorkerRequest, tx: &Sender<WorkerMessage>) {
    match request {
        WorkerRequest::HighFidelity => {
            // The DOM surface cannot be constructed off the calling thread.
            let _ = tx.send(WorkerMessage::Fallback(
                "render surface unavailable in worker".to_string(),
            ));
        },
        WorkerRequest::Structural => {
            let mut progress = |percent: u8, label: &str| {
                let _ = tx.send(WorkerMessage::Progress {
                    percent,
                    label: label.to_string(),
                });
            };
            // Worker-side diagnostics stay in the worker; the protocol's
            // terminal messages carry only the outcome.
            let mut diagnostics = Vec::new();
            match convert_sync(bytes, &mut progress, &mut diagnostics) {
                Ok(html) => {
                    let _ = tx.send(WorkerMessage::Success(html));
                },
                Err(e) => {
                    let _ = tx.send(WorkerMessage::Error(e.to_string()));
                },
            }
        },
    }
}

/// Run structural conversion on a worker thread, forwarding progress to
/// the caller's callback.
///
/// Uses a scoped thread so the input buffer is borrowed by the worker
/// rather than duplicated. Any non-success terminal message - including a
/// worker that cannot be constructed or dies without reporting - returns
/// [`OffloadOutcome::NeedsSync`] and the caller converts on its own
/// thread.
pub fn offload_structural(
    bytes: &[u8],
    progress: &mut dyn FnMut(u8, &str),
) -> OffloadOutcome {
    thread::scope(|scope| {
        let (tx, rx) = channel();
        let spawned = thread::Builder::new()
            .name("longan-worker".to_string())
            .spawn_scoped(scope, move || {
                run_worker(bytes, WorkerRequest::Structural, &tx)
            });
        if spawned.is_err() {
            return OffloadOutcome::NeedsSync("worker could not be constructed".to_string());
        }

        loop {
            match rx.recv() {
                Ok(WorkerMessage::Progress { percent, label }) => progress(percent, &label),
                Ok(WorkerMessage::Success(html)) => return OffloadOutcome::Completed(html),
                Ok(WorkerMessage::Fallback(reason)) => {
                    log::warn!("worker fell back: {reason}");
                    return OffloadOutcome::NeedsSync(reason);
                },
                Ok(WorkerMessage::Error(message)) => {
                    log::warn!("worker failed: {message}");
                    return OffloadOutcome::NeedsSync(message);
                },
                // The worker died without a terminal message.
                Err(_) => {
                    return OffloadOutcome::NeedsSync(
                        "worker terminated unexpectedly".to_string(),
                    );
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_fidelity_request_falls_back() {
        let rx = spawn_conversion(vec![1, 2, 3], WorkerRequest::HighFidelity).unwrap();
        match rx.recv().unwrap() {
            WorkerMessage::Fallback(reason) => {
                assert!(reason.contains("render surface"));
            },
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_structural_request_on_garbage_reports_error() {
        let rx = spawn_conversion(b"not a container".to_vec(), WorkerRequest::Structural)
            .unwrap();
        // Drain progress, expect a terminal Error.
        loop {
            match rx.recv().unwrap() {
                WorkerMessage::Progress { .. } => continue,
                WorkerMessage::Error(_) => break,
                other => panic!("expected error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_offload_garbage_needs_sync() {
        let mut calls = Vec::new();
        let outcome = offload_structural(b"garbage", &mut |p, l| calls.push((p, l.to_string())));
        assert!(matches!(outcome, OffloadOutcome::NeedsSync(_)));
    }
}
