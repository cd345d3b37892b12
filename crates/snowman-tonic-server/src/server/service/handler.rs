//! gRPC service implementation for Snowflake ID generation.
//!
//! This module defines [`IdService`], the implementation of the
//! [`SnowflakeService`] gRPC service. Every request shares a single lock-free
//! generator, so there is no worker pool or dispatch: `NextId` calls the
//! generator inline and `BatchNextId` spawns one feeder task per stream.
//!
//! ## Responsibilities
//!
//! - Validate `BatchNextId` requests before any generation happens.
//! - Hand each stream to [`feed_ids`] with a bounded response channel.
//! - Track in-flight streams and drain them on graceful shutdown.

use crate::server::{
    config::ServerConfig,
    streaming::coordinator::feed_ids,
    telemetry::{
        decrement_streams_inflight, increment_ids_generated, increment_requests,
        increment_stream_errors, increment_streams_inflight, record_stream_duration,
    },
};
use core::{pin::Pin, time::Duration};
use futures::TryStreamExt;
use snowman_tonic_core::{
    Error,
    proto::{BatchIdsRequest, Empty, Snowflake, snowflake_service_server::SnowflakeService},
    types::Generator,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::Instrument;

/// gRPC front end for one shared [`Generator`].
///
/// Cloning is cheap and every clone drives the same generator and shutdown
/// state, which lets `main` keep a handle for the shutdown signal.
#[derive(Clone)]
pub struct IdService {
    generator: Arc<Generator>,
    stream_buffer_size: usize,
    shutdown_timeout: Duration,
    lifecycle: Arc<Lifecycle>,
}

#[derive(Default)]
struct Lifecycle {
    draining: AtomicBool,
    streams_inflight: AtomicUsize,
    cancel: CancellationToken,
}

/// Counts a stream as in flight until dropped, whichever way it ends.
struct InflightGuard(Arc<Lifecycle>);

impl InflightGuard {
    fn new(lifecycle: &Arc<Lifecycle>) -> Self {
        lifecycle.streams_inflight.fetch_add(1, Ordering::AcqRel);
        increment_streams_inflight();
        Self(Arc::clone(lifecycle))
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.streams_inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
    }
}

impl IdService {
    pub fn new(generator: Generator, config: &ServerConfig) -> Self {
        Self {
            generator: Arc::new(generator),
            stream_buffer_size: config.stream_buffer_size,
            shutdown_timeout: config.shutdown_timeout,
            lifecycle: Arc::default(),
        }
    }

    /// Number of batch streams that have not finished yet.
    pub fn streams_inflight(&self) -> usize {
        self.lifecycle.streams_inflight.load(Ordering::Acquire)
    }

    /// Gracefully stops the service.
    ///
    /// - Refuses new `BatchNextId` streams with `UNAVAILABLE`.
    /// - Waits up to the configured shutdown timeout for in-flight streams.
    /// - Cancels whatever is left.
    ///
    /// `NextId` keeps working until the transport itself stops.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new streams ===
        tracing::info!("Refusing new batch streams");
        self.lifecycle.draining.store(true, Ordering::Release);

        // === Phase 1: Wait for in-flight streams to drain ===
        tracing::info!(
            "Draining in-flight streams ({} active)",
            self.streams_inflight()
        );
        let drained = timeout(self.shutdown_timeout, async {
            while self.streams_inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight streams drained successfully"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.streams_inflight()
            ),
        }

        // === Phase 2: Cancel any remaining streams ===
        tracing::debug!("Cancelling remaining streams");
        self.lifecycle.cancel.cancel();
    }

    fn is_draining(&self) -> bool {
        self.lifecycle.draining.load(Ordering::Acquire)
    }
}

#[tonic::async_trait]
impl SnowflakeService for IdService {
    type BatchNextIdStream = Pin<Box<dyn Stream<Item = Result<Snowflake, Status>> + Send>>;

    async fn next_id(&self, _req: Request<Empty>) -> Result<Response<Snowflake>, Status> {
        increment_requests();
        let id = self.generator.next_id();
        increment_ids_generated(1);
        Ok(Response::new(id.into()))
    }

    /// Streams `length` freshly generated IDs.
    ///
    /// IDs are produced lazily as the client consumes them. If `metrics` is
    /// enabled, emits request rate, IDs generated, concurrent stream count,
    /// stream duration and stream errors.
    #[tracing::instrument(skip_all, fields(length = req.get_ref().length))]
    async fn batch_next_id(
        &self,
        req: Request<BatchIdsRequest>,
    ) -> Result<Response<Self::BatchNextIdStream>, Status> {
        let start = std::time::Instant::now();
        let length = req.get_ref().length;

        if length <= 0 {
            increment_stream_errors();
            return Err(Error::InvalidRequest {
                reason: "length must be greater than 0".to_string(),
            }
            .into());
        }

        if self.is_draining() {
            return Err(Error::ServiceShutdown.into());
        }

        increment_requests();
        let guard = InflightGuard::new(&self.lifecycle);

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<Snowflake, Status>>(self.stream_buffer_size);
        let generator = Arc::clone(&self.generator);
        let cancel = self.lifecycle.cancel.clone();

        let fut = async move {
            let _guard = guard;
            match feed_ids(length as usize, generator, resp_tx, cancel).await {
                Ok(()) => record_stream_duration(start.elapsed().as_millis() as f64),
                Err(e) => {
                    increment_stream_errors();
                    tracing::warn!("Batch stream aborted: {e}");
                }
            }
        };
        tokio::spawn(fut.instrument(tracing::info_span!("streaming")));

        let stream = ReceiverStream::new(resp_rx).inspect_ok(|_| increment_ids_generated(1));

        Ok(Response::new(Box::pin(stream)))
    }
}
