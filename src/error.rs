/*!
error module defines the error kinds a status query can report.
*/
use crate::types::AddressFamily;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    /// The effective user is not root, so the BIRD sockets cannot be opened.
    ///
    /// Fatal to the whole request.
    #[error("Need super user privileges: Operation not permitted")]
    Privilege,
    /// `/proc` could not be enumerated. Reported, then the report continues
    /// with an empty process view.
    #[error("unable to list running processes: {0}")]
    ProcessInspection(#[source] io::Error),
    /// Both the primary and the fallback control socket refused the
    /// connection. `path` is the last path tried.
    #[error("unable to connect to BIRDv{family} socket {}: {source}", .path.display())]
    Connect {
        family: AddressFamily,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to write to BIRD socket: {0}")]
    Write(#[source] io::Error),
    #[error("unable to read from BIRD socket: {0}")]
    Read(#[source] io::Error),
    /// No data arrived within one read deadline.
    #[error("no response from BIRD within {0:?}")]
    Timeout(Duration),
    /// The `2002` header row did not list the expected columns in order.
    #[error("unknown BIRD table output format")]
    UnexpectedHeaderShape,
    /// A line carried none of the known prefix codes.
    #[error("unexpected output line from BIRD: {0:?}")]
    UnrecognizedLineFormat(String),
    /// The alternate backend could not be queried or returned unreadable data.
    #[error("{0}")]
    Backend(String),
}
