//! JSON-lines lifecycle event consumer.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{Consumer, LifecycleEvent, StreamMessage};
use crate::errors::IngestError;

/// Reads one [`LifecycleEvent`] per line from an async reader.
///
/// Blank lines are skipped. Lines that are not UTF-8 or fail to parse are
/// reported as [`StreamMessage::Error`] and do not stop the stream.
pub struct JsonLinesConsumer<R> {
    reader: Mutex<Option<R>>,
}

impl JsonLinesConsumer<BufReader<Stdin>> {
    /// Consumer over the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> JsonLinesConsumer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Consumer over any buffered async reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

/// Parse one input line. Blank lines yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<LifecycleEvent>, IngestError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| IngestError::parse(e.to_string()))
}

#[async_trait]
impl<R> Consumer for JsonLinesConsumer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| IngestError::consumer("Consumer input was already read"))?;

        let mut lines = reader.split(b'\n');
        let mut line_number: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(lines_read = line_number, "Consumer received shutdown signal");
                    return Ok(());
                }
                line = lines.next_segment() => {
                    let Some(bytes) = line? else {
                        break;
                    };
                    line_number += 1;

                    let parsed = std::str::from_utf8(&bytes)
                        .map_err(|e| IngestError::parse(format!("invalid UTF-8: {}", e)))
                        .and_then(parse_line);

                    let message = match parsed {
                        Ok(Some(event)) => StreamMessage::Event(event),
                        Ok(None) => continue,
                        Err(e) => {
                            warn!(line_number = line_number, error = %e, "Skipping malformed event");
                            StreamMessage::Error(format!("line {}: {}", line_number, e))
                        }
                    };

                    if sender.send(message).await.is_err() {
                        debug!("Event receiver dropped, stopping consumer");
                        return Ok(());
                    }
                }
            }
        }

        info!(lines_read = line_number, "Consumer input exhausted");
        if sender.send(StreamMessage::End).await.is_err() {
            debug!("Event receiver dropped before end of stream");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;

    async fn collect(input: &'static [u8]) -> Vec<StreamMessage> {
        let consumer = JsonLinesConsumer::new(input);
        let (tx, mut rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        consumer.run(tx, shutdown_rx).await.unwrap();

        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn test_parse_line() {
        let event = parse_line(
            r#"{"signal":"pre_delete","model":"Article","instance":{"pk":"5"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.signal, Signal::PreDelete);
        assert_eq!(event.model.name(), "Article");
        assert_eq!(event.instance.pk, "5");

        assert!(parse_line("   ").unwrap().is_none());
        assert!(matches!(
            parse_line(r#"{"signal":"post_update"}"#),
            Err(IngestError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_events_and_reports_bad_lines() {
        let messages = collect(concat!(
            r#"{"signal":"post_save","model":"Article","instance":{"pk":"1","fields":{"title":"a"}}}"#,
            "\n\nnot json\n",
            r#"{"signal":"pre_delete","model":"Article","instance":{"pk":"1"}}"#,
            "\n",
        )
        .as_bytes())
        .await;

        assert_eq!(messages.len(), 4);
        assert!(matches!(&messages[0], StreamMessage::Event(e) if e.signal == Signal::PostSave));
        assert!(matches!(&messages[1], StreamMessage::Error(msg) if msg.starts_with("line 3")));
        assert!(matches!(&messages[2], StreamMessage::Event(e) if e.signal == Signal::PreDelete));
        assert!(matches!(messages[3], StreamMessage::End));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_reported_and_skipped() {
        let input: &'static [u8] = b"{\"signal\":\"post_save\",\"model\":\"Article\",\"instance\":{\"pk\":\"1\"}}\n\
            \xff\xfe\n\
            {\"signal\":\"pre_delete\",\"model\":\"Article\",\"instance\":{\"pk\":\"1\"}}\n";

        let messages = collect(input).await;

        assert_eq!(messages.len(), 4);
        assert!(matches!(&messages[0], StreamMessage::Event(e) if e.signal == Signal::PostSave));
        assert!(
            matches!(&messages[1], StreamMessage::Error(msg) if msg.starts_with("line 2") && msg.contains("UTF-8"))
        );
        assert!(matches!(&messages[2], StreamMessage::Event(e) if e.signal == Signal::PreDelete));
        assert!(matches!(messages[3], StreamMessage::End));
    }

    #[tokio::test]
    async fn test_second_run_fails() {
        let consumer = JsonLinesConsumer::new("".as_bytes());
        let (tx, _rx) = mpsc::channel(4);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        consumer.run(tx.clone(), shutdown_tx.subscribe()).await.unwrap();
        let second = consumer.run(tx, shutdown_tx.subscribe()).await;
        assert!(matches!(second, Err(IngestError::ConsumerError(_))));
    }
}
