use crate::error::StatusError;

/// Fails unless running as root, which the BIRD control sockets require.
pub fn enforce_root() -> Result<(), StatusError> {
    check_euid(unsafe { libc::geteuid() })
}

fn check_euid(euid: libc::uid_t) -> Result<(), StatusError> {
    if euid != 0 {
        return Err(StatusError::Privilege);
    }
    Ok(())
}
