use std::time::Duration;

use futures_util::StreamExt;
use timeops_remote::RemoteClient;
use tokio::sync::{mpsc, watch};

const RETRY_DELAY: Duration = Duration::from_secs(5);
const DATA_UPDATE_EVENT: &str = "data-update";

/// Receivers for the event-listener task: `online` flips with the stream's
/// connection state, `data_updates` fires once per server-side change.
pub struct ConnectivityHandle {
    pub online: watch::Receiver<bool>,
    pub data_updates: mpsc::Receiver<()>,
}

/// Connects to the server's event stream and keeps reconnecting forever.
/// A successful connection marks us online; any error or end of stream
/// marks us offline and schedules a retry.
pub fn spawn_event_listener(client: RemoteClient) -> ConnectivityHandle {
    let (online_tx, online_rx) = watch::channel(false);
    let (update_tx, update_rx) = mpsc::channel(16);

    tokio::spawn(async move {
        loop {
            match client.subscribe_events().await {
                Ok(response) => {
                    if online_tx.send(true).is_err() {
                        return;
                    }
                    tracing::debug!("event stream connected");

                    let mut parser = EventParser::default();
                    let mut stream = response.bytes_stream();
                    while let Some(chunk) = stream.next().await {
                        match chunk {
                            Ok(bytes) => {
                                for event in parser.feed(&bytes) {
                                    if event == DATA_UPDATE_EVENT {
                                        // a full buffer means a refresh is
                                        // already queued, dropping is fine
                                        let _ = update_tx.try_send(());
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::debug!(%err, "event stream broke");
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::debug!(%err, "event stream connection failed");
                }
            }

            if online_tx.send(false).is_err() {
                return;
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    });

    ConnectivityHandle {
        online: online_rx,
        data_updates: update_rx,
    }
}

/// Incremental server-sent-events parser. Chunks can split lines anywhere;
/// a blank line dispatches the event named by the preceding `event:` field.
#[derive(Default)]
struct EventParser {
    buffer: String,
    current_event: Option<String>,
}

impl EventParser {
    fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.current_event.take() {
                    events.push(event);
                }
            } else if let Some(name) = line.strip_prefix("event:") {
                self.current_event = Some(name.trim_start().to_string());
            }
            // data:, id: and retry: fields carry nothing we use
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_frame_yields_the_event_name() {
        let mut parser = EventParser::default();
        let events = parser.feed(b"event: data-update\ndata: {}\n\n");
        assert_eq!(events, vec!["data-update"]);
    }

    #[test]
    fn frames_split_across_chunks_still_parse() {
        let mut parser = EventParser::default();
        assert!(parser.feed(b"event: data-up").is_empty());
        assert!(parser.feed(b"date\ndata:").is_empty());
        let events = parser.feed(b" {}\n\n");
        assert_eq!(events, vec!["data-update"]);
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut parser = EventParser::default();
        let events = parser.feed(b"event: data-update\n\nevent: other\n\n");
        assert_eq!(events, vec!["data-update", "other"]);
    }

    #[test]
    fn blank_line_without_an_event_field_is_ignored() {
        let mut parser = EventParser::default();
        assert!(parser.feed(b"data: keepalive\n\n\n").is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = EventParser::default();
        let events = parser.feed(b"event: data-update\r\n\r\n");
        assert_eq!(events, vec!["data-update"]);
    }
}
