use snowman_tonic_core::{Error, proto::Snowflake, types::Generator};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Generates `length` IDs one at a time and forwards each to `resp_tx`.
///
/// An ID is only generated once the previous one has been accepted by the
/// channel, so a slow client holds back generation rather than buffering it.
///
/// # Errors
///
/// - [`Error::ChannelError`] if the stream's receiver is gone (the client
///   disconnected). Generation stops immediately; IDs already delivered are
///   not resent and the remainder of the batch is never produced.
/// - [`Error::ServiceShutdown`] if `shutdown` is cancelled mid-stream. A
///   best-effort `UNAVAILABLE` status is pushed to the client first.
pub async fn feed_ids(
    length: usize,
    generator: Arc<Generator>,
    resp_tx: mpsc::Sender<Result<Snowflake, Status>>,
    shutdown: CancellationToken,
) -> snowman_tonic_core::Result<()> {
    for sent in 0..length {
        if shutdown.is_cancelled() {
            return Err(abort_for_shutdown(&resp_tx));
        }

        let msg = Snowflake::from(generator.next_id());

        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                return Err(abort_for_shutdown(&resp_tx));
            }
            res = resp_tx.send(Ok(msg)) => {
                if let Err(e) = res {
                    return Err(Error::ChannelError {
                        context: format!("failed to deliver id {} of {length}: {e}", sent + 1),
                    });
                }
            }
        }
    }

    Ok(())
}

fn abort_for_shutdown(resp_tx: &mpsc::Sender<Result<Snowflake, Status>>) -> Error {
    // The client may have stopped reading, so never wait on a full buffer here.
    if let Err(e) = resp_tx.try_send(Err(Error::ServiceShutdown.into())) {
        tracing::debug!("Failed to forward shutdown status: {e}");
    }
    Error::ServiceShutdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowman_tonic_core::types::{Clock, SnowflakeId};
    use tonic::Code;

    // Pinning the stored timestamp ahead of the wall clock makes every call
    // a plain sequence increment, so the expected ids are known up front.
    const AHEAD: u64 = 1 << 41;

    fn pinned_generator(machine_id: i64) -> Arc<Generator> {
        Arc::new(Generator::from_components(AHEAD, machine_id, 0, Clock::default()).unwrap())
    }

    #[tokio::test]
    async fn delivers_exactly_length_ids_in_order() {
        let generator = pinned_generator(3);
        let (tx, mut rx) = mpsc::channel(1);

        let feeder = tokio::spawn(feed_ids(10, generator, tx, CancellationToken::new()));

        let mut ids = Vec::new();
        while let Some(item) = rx.recv().await {
            ids.push(SnowflakeId::try_from(item.unwrap()).unwrap());
        }
        feeder.await.unwrap().unwrap();

        let expected: Vec<_> = (1..=10)
            .map(|seq| SnowflakeId::from_components(AHEAD, 3, seq))
            .collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn stops_when_client_goes_away() {
        let generator = pinned_generator(0);
        let (tx, mut rx) = mpsc::channel(1);

        let feeder = tokio::spawn(feed_ids(
            100_000,
            Arc::clone(&generator),
            tx,
            CancellationToken::new(),
        ));

        for _ in 0..3 {
            rx.recv().await.unwrap().unwrap();
        }
        drop(rx);

        let err = feeder.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::ChannelError { .. }));

        // Three delivered, at most one buffered and one that failed to send.
        let next = generator.next_id();
        assert!(next.sequence() <= 6, "generation kept going: {next:?}");
    }

    #[tokio::test]
    async fn cancelled_stream_reports_unavailable() {
        let generator = pinned_generator(0);
        let (tx, mut rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = feed_ids(10, Arc::clone(&generator), tx, shutdown)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceShutdown));

        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(rx.recv().await.is_none());

        // Nothing was generated.
        assert_eq!(generator.next_id().sequence(), 1);
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_stalled_send() {
        let (tx, mut rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();

        let feeder = tokio::spawn(feed_ids(
            1_000,
            pinned_generator(0),
            tx,
            shutdown.clone(),
        ));

        // Let the buffer fill while nobody reads.
        let first = rx.recv().await.unwrap();
        assert!(first.is_ok());
        shutdown.cancel();

        let err = feeder.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::ServiceShutdown));
    }
}
