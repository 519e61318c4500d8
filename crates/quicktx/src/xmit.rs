use crate::buffer::InFlight;

/// Outcome of one transmit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmitStatus {
    /// The device took the frame.
    Ok,
    /// Device queue full.
    Busy,
    /// Queue lock held by another context.
    Locked,
    /// Any other refusal, e.g. queue frozen or stopped.
    Other,
}

impl XmitStatus {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == XmitStatus::Ok
    }
}

/// The lower-layer transmit call.
///
/// `xmit` may be called repeatedly with tokens for the same frame. On
/// anything other than [`XmitStatus::Ok`] the token must be dropped before
/// returning; on `Ok` the implementation keeps it (or a clone) until the
/// device has finished reading the bytes.
pub trait Transmit {
    /// Whether the device can transmit at all. Checked once at startup.
    fn is_usable(&self) -> bool;

    fn xmit(&mut self, frame: InFlight) -> XmitStatus;
}

impl<T: Transmit + ?Sized> Transmit for Box<T> {
    fn is_usable(&self) -> bool {
        (**self).is_usable()
    }

    fn xmit(&mut self, frame: InFlight) -> XmitStatus {
        (**self).xmit(frame)
    }
}

#[cfg(target_os = "linux")]
mod socket {
    use super::{Transmit, XmitStatus};
    use crate::buffer::InFlight;
    use quicktx_core::sys::PacketSocket;
    use std::io;

    pub(crate) fn status_from_errno(err: &io::Error) -> XmitStatus {
        match err.raw_os_error() {
            Some(libc::EAGAIN) | Some(libc::ENOBUFS) => XmitStatus::Busy,
            Some(libc::EINTR) => XmitStatus::Locked,
            _ => XmitStatus::Other,
        }
    }

    impl Transmit for PacketSocket {
        fn is_usable(&self) -> bool {
            match self.is_running() {
                Ok(running) => running,
                Err(e) => {
                    log::error!("failed to query {}: {}", self.interface(), e);
                    false
                }
            }
        }

        // sendto copies into a kernel skb, so the token is released as soon
        // as the call returns.
        fn xmit(&mut self, frame: InFlight) -> XmitStatus {
            match self.send(frame.data()) {
                Ok(_) => XmitStatus::Ok,
                Err(e) => {
                    let status = status_from_errno(&e);
                    if status == XmitStatus::Other {
                        log::trace!("sendto on {} failed: {}", self.interface(), e);
                    }
                    status
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_errno_mapping() {
            assert_eq!(status_from_errno(&io::Error::from_raw_os_error(libc::EAGAIN)), XmitStatus::Busy);
            assert_eq!(status_from_errno(&io::Error::from_raw_os_error(libc::ENOBUFS)), XmitStatus::Busy);
            assert_eq!(status_from_errno(&io::Error::from_raw_os_error(libc::EINTR)), XmitStatus::Locked);
            assert_eq!(status_from_errno(&io::Error::from_raw_os_error(libc::ENETDOWN)), XmitStatus::Other);
        }
    }
}
