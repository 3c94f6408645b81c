//! Connection handle for the simulator endpoint.

use crate::messages::{Envelope, ServiceRequest};
use crate::{Result, TransportError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use sceneflow_core::{PoseBatch, SceneDescription};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, info, warn};

/// Response slot for one in-flight request: (ok, payload).
type PendingReply = Sender<(bool, Value)>;

#[derive(Default)]
struct Routes {
    pending: Mutex<HashMap<u64, PendingReply>>,
    subscriptions: Mutex<HashMap<String, Sender<PoseBatch>>>,
    services: Mutex<HashMap<String, Sender<ServiceRequest>>>,
}

/// Client connection to the simulator's pub/sub endpoint.
///
/// Cheap to clone; all clones share one connection. Every public method is
/// synchronous and safe to call from the render or UI thread.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    // Runtime must outlive the IO tasks spawned on it.
    _runtime: tokio::runtime::Runtime,
    outgoing: UnboundedSender<Envelope>,
    routes: Arc<Routes>,
    next_id: AtomicU64,
}

impl Node {
    /// Connect to the endpoint and spawn the IO tasks.
    pub fn connect(addr: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sceneflow-transport")
            .enable_all()
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let stream = runtime
            .block_on(TcpStream::connect(addr))
            .map_err(|e| TransportError::Connection(format!("{addr}: {e}")))?;
        info!("Connected to simulator endpoint at {}", addr);

        let (outgoing, mut outgoing_rx) = unbounded_channel::<Envelope>();
        let routes = Arc::new(Routes::default());

        let (read_half, mut write_half) = stream.into_split();

        // Writer task: envelopes out, one JSON line each.
        runtime.spawn(async move {
            while let Some(envelope) = outgoing_rx.recv().await {
                let mut line = match serde_json::to_string(&envelope) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to encode envelope: {}", e);
                        continue;
                    }
                };
                line.push('\n');
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        // Reader task: dispatch incoming envelopes to the matching channel.
        let reader_routes = routes.clone();
        let reader_outgoing = outgoing.clone();
        runtime.spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Transport read error: {}", e);
                        break;
                    }
                };
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Envelope>(&line) {
                    Ok(envelope) => dispatch(&reader_routes, &reader_outgoing, envelope),
                    Err(e) => warn!("Dropping malformed envelope: {}", e),
                }
            }
            // Waking every in-flight request; their receivers observe the
            // disconnect instead of running into the full timeout.
            reader_routes.pending.lock().clear();
            info!("Simulator connection closed");
        });

        Ok(Self {
            inner: Arc::new(NodeInner {
                _runtime: runtime,
                outgoing,
                routes,
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Call a service and wait for its reply.
    pub fn request(&self, service: &str, payload: Value, timeout: Duration) -> Result<Value> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(1);
        self.inner.routes.pending.lock().insert(id, tx);

        let envelope = Envelope::Request {
            id,
            service: service.to_string(),
            payload,
        };
        if self.inner.outgoing.send(envelope).is_err() {
            self.inner.routes.pending.lock().remove(&id);
            return Err(TransportError::Closed);
        }

        match rx.recv_timeout(timeout) {
            Ok((true, payload)) => Ok(payload),
            Ok((false, _)) => Err(TransportError::ServiceFailure(service.to_string())),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                self.inner.routes.pending.lock().remove(&id);
                Err(TransportError::Timeout(service.to_string()))
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    /// Request the scene snapshot from the scene service.
    pub fn request_scene(&self, service: &str, timeout: Duration) -> Result<SceneDescription> {
        let payload = self.request(service, Value::Null, timeout)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Subscribe to a pose topic. Batches arrive on the returned receiver
    /// until the node or the connection goes away.
    pub fn subscribe_poses(&self, topic: &str) -> Receiver<PoseBatch> {
        let (tx, rx) = unbounded();
        self.inner
            .routes
            .subscriptions
            .lock()
            .insert(topic.to_string(), tx);
        if self
            .inner
            .outgoing
            .send(Envelope::Subscribe {
                topic: topic.to_string(),
            })
            .is_err()
        {
            warn!("Subscribe to {} failed: connection closed", topic);
        }
        rx
    }

    /// Advertise a service. Incoming calls arrive on the returned receiver;
    /// each one must be answered via [`ServiceRequest::respond`].
    pub fn advertise(&self, service: &str) -> Receiver<ServiceRequest> {
        let (tx, rx) = unbounded();
        self.inner
            .routes
            .services
            .lock()
            .insert(service.to_string(), tx);
        if self
            .inner
            .outgoing
            .send(Envelope::Advertise {
                service: service.to_string(),
            })
            .is_err()
        {
            warn!("Advertise of {} failed: connection closed", service);
        }
        rx
    }
}

fn dispatch(routes: &Routes, outgoing: &UnboundedSender<Envelope>, envelope: Envelope) {
    match envelope {
        Envelope::Response { id, ok, payload } => {
            if let Some(reply) = routes.pending.lock().remove(&id) {
                let _ = reply.send((ok, payload));
            } else {
                debug!("Response for unknown request id {}", id);
            }
        }
        Envelope::Publication { topic, payload } => {
            let mut subscriptions = routes.subscriptions.lock();
            let Some(tx) = subscriptions.get(&topic) else {
                debug!("Publication on topic {} without subscriber", topic);
                return;
            };
            match serde_json::from_value::<PoseBatch>(payload) {
                Ok(batch) => {
                    if tx.send(batch).is_err() {
                        // Receiver dropped; stop routing this topic.
                        subscriptions.remove(&topic);
                    }
                }
                Err(e) => warn!("Malformed pose batch on {}: {}", topic, e),
            }
        }
        Envelope::Request {
            id,
            service,
            payload,
        } => {
            let services = routes.services.lock();
            if let Some(tx) = services.get(&service) {
                let request = ServiceRequest {
                    payload,
                    id,
                    reply: outgoing.clone(),
                };
                if tx.send(request).is_err() {
                    warn!("Handler for {} is gone", service);
                }
            } else {
                debug!("Call to unadvertised service {}", service);
                let _ = outgoing.send(Envelope::Response {
                    id,
                    ok: false,
                    payload: Value::Null,
                });
            }
        }
        // Client nodes never receive these.
        Envelope::Subscribe { .. } | Envelope::Advertise { .. } => {}
    }
}
