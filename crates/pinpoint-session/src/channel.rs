//! Per-session delivery channel
//!
//! Each session owns one channel: a dedicated OS thread running a
//! current-thread tokio runtime with its own callback queue, isolated from
//! the caller's thread and from every other session. A wedged provider
//! callback can stall only its own session.

use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use pinpoint_fusion::{Decision, FusionEngine};
use pinpoint_providers::{
    LocationPlatform, ProviderCatalog, ProviderEvent, ProviderEventSink, ProviderMask,
};

use crate::error::SessionError;
use crate::listener::FixListener;
use crate::session::Session;

pub(crate) type SessionTable = Arc<RwLock<HashMap<String, Session>>>;

/// Everything the channel thread needs to dispatch events for one session.
pub(crate) struct ChannelContext {
    pub key: String,
    pub providers: ProviderMask,
    pub engine: FusionEngine,
    pub platform: Arc<dyn LocationPlatform>,
    pub catalog: ProviderCatalog,
    pub listener: Arc<dyn FixListener>,
    pub table: SessionTable,
}

/// Handle to one session's background execution context.
pub struct DeliveryChannel {
    sink: ProviderEventSink,
    shutdown: watch::Sender<bool>,
    join: Option<thread::JoinHandle<()>>,
}

impl DeliveryChannel {
    /// Spawn the channel thread and block until it is accepting callbacks.
    ///
    /// The readiness barrier must complete before any provider
    /// subscription is issued, otherwise a fix could arrive with nowhere
    /// to be dispatched. A barrier timeout fails the start; the partially
    /// started thread is signaled to exit and detached.
    pub(crate) fn start(
        ctx: ChannelContext,
        ready_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<()>(1);

        let sink = ProviderEventSink::new(event_tx);
        let sink_id = sink.id();
        let key = ctx.key.clone();

        let join = thread::Builder::new()
            .name(format!("pinpoint-delivery-{key}"))
            .spawn(move || channel_thread(ctx, sink_id, event_rx, shutdown_rx, ready_tx))
            .map_err(|e| SessionError::ChannelSpawn(e.to_string()))?;

        let mut channel = Self {
            sink,
            shutdown: shutdown_tx,
            join: Some(join),
        };

        if ready_rx.recv_timeout(ready_timeout).is_err() {
            tracing::warn!(session_key = %key, "Delivery channel missed the readiness barrier");
            channel.stop();
            return Err(SessionError::ChannelNotReady);
        }

        tracing::debug!(session_key = %key, sink_id = %sink_id, "Delivery channel ready");
        Ok(channel)
    }

    /// The handle providers deliver through. Cloned into each
    /// subscription; identifies this channel to `unsubscribe`.
    pub fn sink(&self) -> &ProviderEventSink {
        &self.sink
    }

    /// Signal the channel to drain and exit. Idempotent; joins the thread
    /// unless invoked from the channel thread itself (the single-shot
    /// self-teardown path, where the thread detaches instead).
    pub fn stop(&mut self) {
        let _ = self.shutdown.send(true);

        if let Some(join) = self.join.take() {
            if join.thread().id() == thread::current().id() {
                return;
            }
            if join.join().is_err() {
                tracing::error!("Delivery channel thread panicked");
            }
        }
    }
}

impl Drop for DeliveryChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

fn channel_thread(
    ctx: ChannelContext,
    sink_id: Uuid,
    event_rx: mpsc::UnboundedReceiver<ProviderEvent>,
    shutdown_rx: watch::Receiver<bool>,
    ready_tx: std_mpsc::SyncSender<()>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            // Readiness is never signaled; the starter times out and
            // reports the failure.
            tracing::error!(session_key = %ctx.key, error = %e, "Failed to build delivery runtime");
            return;
        }
    };

    runtime.block_on(run_channel(ctx, sink_id, event_rx, shutdown_rx, ready_tx));
}

async fn run_channel(
    mut ctx: ChannelContext,
    sink_id: Uuid,
    mut event_rx: mpsc::UnboundedReceiver<ProviderEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
    ready_tx: std_mpsc::SyncSender<()>,
) {
    let _ = ready_tx.send(());

    // One unavailability notification per disablement edge; cleared by a
    // re-enabled provider or a delivered fix.
    let mut unavailable_latched = false;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    ProviderEvent::Fix(fix) => {
                        let decision = ctx.engine.observe(&fix);
                        if decision.forwards() {
                            unavailable_latched = false;
                            tracing::debug!(
                                session_key = %ctx.key,
                                provider = %fix.provider,
                                "Forwarding fix"
                            );
                            ctx.listener.on_fix_delivered(
                                fix,
                                &ctx.key,
                                ctx.engine.is_single_shot(),
                            );
                        } else {
                            tracing::trace!(
                                session_key = %ctx.key,
                                provider = %fix.provider,
                                decision = ?decision,
                                "Fix withheld"
                            );
                        }

                        if decision == Decision::ForwardAndTerminate {
                            // Single-shot delivery complete: the session
                            // tears itself down.
                            ctx.platform.unsubscribe(sink_id);
                            ctx.table.write().remove(&ctx.key);
                            tracing::info!(session_key = %ctx.key, "Single-shot session finished");
                            break;
                        }
                    }
                    ProviderEvent::ProviderDisabled(kind) => {
                        if ctx.providers.contains(kind)
                            && !unavailable_latched
                            && !ctx.catalog.is_any_enabled(ctx.providers)
                        {
                            unavailable_latched = true;
                            tracing::warn!(
                                session_key = %ctx.key,
                                "All requested providers disabled"
                            );
                            ctx.listener.on_providers_unavailable(&ctx.key);
                        }
                    }
                    ProviderEvent::ProviderEnabled(kind) => {
                        if ctx.providers.contains(kind) {
                            unavailable_latched = false;
                        }
                    }
                }
            }
        }
    }

    tracing::debug!(session_key = %ctx.key, "Delivery channel exited");
}
