//! Reader for the `show protocols` reply of the BIRD control socket.
//!
//! Sample output from BIRD:
//!
//! ```text
//! 0001 BIRD 1.5.0 ready.
//! 2002-name     proto    table    state  since       info
//! 1002-kernel1  Kernel   master   up     2016-11-21
//!  device1  Device   master   up     2016-11-21
//!  direct1  Direct   master   up     2016-11-21
//!  Mesh_172_17_8_102 BGP      master   up     2016-11-21  Established
//! 0000
//! ```
//!
//! Every line starts with a four digit reply code and one separator
//! character, except continuation rows which start with a single space.
use crate::error::StatusError;
use crate::peers::{decode_peer_name, PeerRecord};
use crate::types::AddressFamily;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time;
use tracing::debug;

/// Columns BIRD must announce in the `2002` header row, in this order.
pub const EXPECTED_HEADINGS: [&str; 6] = ["name", "proto", "table", "state", "since", "info"];

/// Protocol column value of BGP sessions.
const BGP_PROTOCOL: &str = "BGP";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    AwaitingHeader,
    Streaming,
}

/// Outcome of feeding one line to [`step`].
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep reading in the given state, emitting at most one peer.
    Continue(ScanState, Option<PeerRecord>),
    /// The end-of-data marker was seen.
    Done,
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Ready,
    Header(&'a str),
    FirstRow(&'a str),
    NextRow(&'a str),
    End,
    Unknown,
}

fn classify(line: &str) -> Line<'_> {
    // Skip the reply code and its separator ("-" or " ").
    let rest = line.get(5..).unwrap_or("");
    if line.starts_with("0000") {
        Line::End
    } else if line.starts_with("0001") {
        Line::Ready
    } else if line.starts_with("2002") {
        Line::Header(rest)
    } else if line.starts_with("1002") {
        Line::FirstRow(rest)
    } else if let Some(row) = line.strip_prefix(' ') {
        Line::NextRow(row)
    } else {
        Line::Unknown
    }
}

/// Applies one line of BIRD output to the scan state.
pub fn step(state: ScanState, line: &str, family: AddressFamily) -> Result<Step, StatusError> {
    match classify(line) {
        Line::End => Ok(Step::Done),
        Line::Ready => Ok(Step::Continue(state, None)),
        Line::Header(headings) => match state {
            ScanState::AwaitingHeader => {
                if !headings.split_whitespace().eq(EXPECTED_HEADINGS) {
                    return Err(StatusError::UnexpectedHeaderShape);
                }
                Ok(Step::Continue(ScanState::Streaming, None))
            }
            ScanState::Streaming => {
                debug!("Ignoring repeated header row");
                Ok(Step::Continue(state, None))
            }
        },
        Line::FirstRow(row) | Line::NextRow(row) => {
            Ok(Step::Continue(state, parse_status_line(row, family)))
        }
        Line::Unknown => Err(StatusError::UnrecognizedLineFormat(line.to_string())),
    }
}

/// Parses one row of the protocol table into a peer.
///
/// Rows for other protocols (kernel, device, direct) and BGP rows whose
/// name does not decode are skipped.
pub fn parse_status_line(line: &str, family: AddressFamily) -> Option<PeerRecord> {
    debug!("Parsing line: {}", line);
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 6 {
        debug!("Not a valid line: fewer than 6 columns");
        return None;
    }
    if columns[1] != BGP_PROTOCOL {
        debug!("Not a valid line: protocol is not BGP");
        return None;
    }
    let Some((kind, address)) = decode_peer_name(columns[0], family.delimiter()) else {
        debug!("Not a valid line: BGP peer name '{}' is not recognized", columns[0]);
        return None;
    };

    Some(PeerRecord {
        address,
        kind,
        admin_state: columns[3].to_string(),
        since: columns[4].to_string(),
        session_state: columns[5].to_string(),
        info: columns[6..].join(" "),
    })
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Reads BIRD output until the end-of-data marker and collects the BGP peers.
///
/// The read deadline applies to each line separately, so a slow but steady
/// reply may take arbitrarily long. A clean end of stream before the marker
/// returns what was collected so far.
pub async fn scan_peers<R>(
    mut reader: R,
    family: AddressFamily,
    read_timeout: Duration,
) -> Result<Vec<PeerRecord>, StatusError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut state = ScanState::AwaitingHeader;
    let mut peers = Vec::new();

    loop {
        buf.clear();
        match time::timeout(read_timeout, reader.read_until(b'\n', &mut buf)).await {
            Err(_) => return Err(StatusError::Timeout(read_timeout)),
            Ok(Err(e)) => return Err(StatusError::Read(e)),
            Ok(Ok(0)) => {
                debug!("BIRD closed the stream before the end-of-data marker");
                break;
            }
            Ok(Ok(_)) => {}
        }
        // Peer supplied text may reach the info column, so decode lossily.
        let line = String::from_utf8_lossy(trim_line_end(&buf));
        debug!("Read: {}", line);

        match step(state, &line, family)? {
            Step::Continue(next, peer) => {
                state = next;
                peers.extend(peer);
            }
            Step::Done => break,
        }
    }

    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::PeerKind;
    use tokio::io::{AsyncWriteExt, BufReader};

    const SAMPLE: &str = "0001 BIRD 1.5.0 ready.\n\
        2002-name     proto    table    state  since       info\n\
        1002-kernel1  Kernel   master   up     2016-11-21\n \
        device1  Device   master   up     2016-11-21\n \
        direct1  Direct   master   up     2016-11-21\n \
        Mesh_172_17_8_102 BGP      master   up     2016-11-21  Established\n\
        0000\n";

    #[test]
    fn header_transitions_to_streaming() {
        let step = step(
            ScanState::AwaitingHeader,
            "2002-name     proto    table    state  since       info",
            AddressFamily::Ipv4,
        )
        .unwrap();
        assert_eq!(step, Step::Continue(ScanState::Streaming, None));
    }

    #[test]
    fn reordered_header_is_rejected() {
        let result = step(
            ScanState::AwaitingHeader,
            "2002 name proto table since state info",
            AddressFamily::Ipv4,
        );
        assert!(matches!(result, Err(StatusError::UnexpectedHeaderShape)));

        let result = step(
            ScanState::AwaitingHeader,
            "2002 name proto table state since info extra",
            AddressFamily::Ipv4,
        );
        assert!(matches!(result, Err(StatusError::UnexpectedHeaderShape)));
    }

    #[test]
    fn repeated_header_is_not_checked_again() {
        let step = step(ScanState::Streaming, "2002 whatever", AddressFamily::Ipv4).unwrap();
        assert_eq!(step, Step::Continue(ScanState::Streaming, None));
    }

    #[test]
    fn ready_and_end_markers() {
        assert_eq!(
            step(ScanState::AwaitingHeader, "0001 BIRD 1.5.0 ready.", AddressFamily::Ipv4).unwrap(),
            Step::Continue(ScanState::AwaitingHeader, None)
        );
        assert_eq!(
            step(ScanState::Streaming, "0000", AddressFamily::Ipv4).unwrap(),
            Step::Done
        );
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let result = step(ScanState::Streaming, "8003 Access denied", AddressFamily::Ipv4);
        assert!(matches!(result, Err(StatusError::UnrecognizedLineFormat(_))));

        let result = step(ScanState::Streaming, "\tMesh_10_0_0_1 BGP", AddressFamily::Ipv4);
        assert!(matches!(result, Err(StatusError::UnrecognizedLineFormat(_))));
    }

    #[test]
    fn short_code_line_does_not_panic() {
        assert!(matches!(
            step(ScanState::Streaming, "1002", AddressFamily::Ipv4),
            Ok(Step::Continue(ScanState::Streaming, None))
        ));
    }

    #[test]
    fn status_line_needs_six_columns() {
        assert_eq!(
            parse_status_line("Mesh_10_0_0_1 BGP master up 2016-11-21", AddressFamily::Ipv4),
            None
        );
    }

    #[test]
    fn status_line_needs_bgp_protocol() {
        assert_eq!(
            parse_status_line(
                "Mesh_10_0_0_1 Kernel master up 2016-11-21 Established",
                AddressFamily::Ipv4
            ),
            None
        );
    }

    #[test]
    fn status_line_needs_known_peer_name() {
        assert_eq!(
            parse_status_line("bgp1 BGP master up 2016-11-21 Established", AddressFamily::Ipv4),
            None
        );
        assert_eq!(
            parse_status_line(
                "Peer_10_0_0_1 BGP master up 2016-11-21 Established",
                AddressFamily::Ipv4
            ),
            None
        );
    }

    #[test]
    fn status_line_maps_columns_and_info() {
        let peer = parse_status_line(
            concat!(
                "Node_fd80_24e2_f998_72d7__2  BGP  master  start  2016-11-22  ",
                "Active  Socket: Connection   refused",
            ),
            AddressFamily::Ipv6,
        )
        .unwrap();
        assert_eq!(peer.address, "fd80:24e2:f998:72d7::2");
        assert_eq!(peer.kind, PeerKind::NodeSpecificPeer);
        assert_eq!(peer.admin_state, "start");
        assert_eq!(peer.since, "2016-11-22");
        assert_eq!(peer.session_state, "Active");
        assert_eq!(peer.info, "Socket: Connection refused");
    }

    #[tokio::test]
    async fn scans_sample_reply() {
        let peers = scan_peers(SAMPLE.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].address, "172.17.8.102");
        assert_eq!(peers[0].kind, PeerKind::MeshPeer);
        assert_eq!(peers[0].session_state, "Established");
        assert_eq!(peers[0].info, "");
    }

    #[tokio::test]
    async fn scans_first_and_continuation_rows_in_order() {
        let reply = "2002 name proto table state since info\n\
            1002 Mesh_192_168_56_101 BGP master up 2016-11-21 Established\n \
            Global_10_0_0_5 BGP master up 2016-11-22 Connect extra info here\n\
            0000\n";
        let peers = scan_peers(reply.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(peers.len(), 2);

        assert_eq!(peers[0].address, "192.168.56.101");
        assert_eq!(peers[0].kind, PeerKind::MeshPeer);
        assert_eq!(peers[0].session_state, "Established");
        assert_eq!(peers[0].info, "");

        assert_eq!(peers[1].address, "10.0.0.5");
        assert_eq!(peers[1].kind, PeerKind::GlobalPeer);
        assert_eq!(peers[1].session_state, "Connect");
        assert_eq!(peers[1].info, "extra info here");
    }

    #[tokio::test]
    async fn stops_at_end_marker() {
        let reply = "2002 name proto table state since info\n\
            0000\n\
            garbage that is never read\n";
        let peers = scan_peers(reply.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(peers.is_empty());
    }

    #[tokio::test]
    async fn bad_header_returns_no_partial_result() {
        let reply = "1002 Mesh_192_168_56_101 BGP master up 2016-11-21 Established\n\
            2002 proto name table state since info\n\
            0000\n";
        let result =
            scan_peers(reply.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(StatusError::UnexpectedHeaderShape)));
    }

    #[tokio::test]
    async fn unrecognized_line_aborts_scan() {
        let reply = "2002 name proto table state since info\n\
            1002 Mesh_192_168_56_101 BGP master up 2016-11-21 Established\n\
            9001 Parse error\n\
            0000\n";
        let result =
            scan_peers(reply.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2)).await;
        assert!(matches!(
            result,
            Err(StatusError::UnrecognizedLineFormat(line)) if line == "9001 Parse error"
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_in_a_row_does_not_abort_scan() {
        let reply: &[u8] = b"2002 name proto table state since info\r\n\
            1002 Mesh_192_168_56_101 BGP master up 2016-11-21 Established\r\n \
            Global_10_0_0_5 BGP master up 2016-11-22 Active Received: shutdown \xff\xfe\r\n \
            kernel1 Kernel master up 2016-11-21 \xff\n\
            0000\n";
        let peers = scan_peers(reply, AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].address, "192.168.56.101");
        assert_eq!(peers[0].session_state, "Established");
        assert_eq!(peers[1].address, "10.0.0.5");
        assert_eq!(peers[1].session_state, "Active");
        assert_eq!(peers[1].info, "Received: shutdown \u{FFFD}\u{FFFD}");
    }

    #[tokio::test]
    async fn end_of_stream_keeps_collected_peers() {
        let reply = "2002 name proto table state since info\n\
            1002 Mesh_192_168_56_101 BGP master up 2016-11-21 Established\n";
        let peers = scan_peers(reply.as_bytes(), AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(peers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_rearmed_after_every_line() {
        let (reader, mut writer) = tokio::io::duplex(1024);
        let feeder = tokio::spawn(async move {
            writer
                .write_all(b"2002 name proto table state since info\n")
                .await
                .unwrap();
            for i in 1..=10 {
                time::sleep(Duration::from_millis(1900)).await;
                let row = format!(" Mesh_10_0_0_{} BGP master up 2016-11-21 Established\n", i);
                writer.write_all(row.as_bytes()).await.unwrap();
            }
            time::sleep(Duration::from_millis(1900)).await;
            writer.write_all(b"0000\n").await.unwrap();
        });

        let peers = scan_peers(BufReader::new(reader), AddressFamily::Ipv4, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(peers.len(), 10);
        assert_eq!(peers[9].address, "10.0.0.10");
        feeder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn silence_past_deadline_times_out() {
        let (reader, mut writer) = tokio::io::duplex(1024);
        let feeder = tokio::spawn(async move {
            writer
                .write_all(b"2002 name proto table state since info\n")
                .await
                .unwrap();
            time::sleep(Duration::from_millis(1900)).await;
            writer
                .write_all(b"1002 Mesh_10_0_0_1 BGP master up 2016-11-21 Established\n")
                .await
                .unwrap();
            time::sleep(Duration::from_secs(3)).await;
            let _ = writer.write_all(b"0000\n").await;
        });

        let result =
            scan_peers(BufReader::new(reader), AddressFamily::Ipv4, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(StatusError::Timeout(d)) if d == Duration::from_secs(2)));
        feeder.await.unwrap();
    }
}
