use crate::sys::utils::{if_nametoindex, interface_is_running};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd as _, OwnedFd, RawFd};
use std::ptr;

/// Non-blocking `AF_PACKET` socket bound to one interface.
///
/// Frames handed to [`PacketSocket::send`] must already carry their link
/// layer header.
pub struct PacketSocket {
    fd: OwnedFd,
    if_index: u32,
    interface: String,
}

impl PacketSocket {
    pub fn open(interface: &str) -> io::Result<Self> {
        let if_index = if_nametoindex(interface)?;
        let protocol = (libc::ETH_P_ALL as u16).to_be();

        let fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                protocol as libc::c_int,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        let mut sll: libc::sockaddr_ll = unsafe { mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as libc::c_ushort;
        sll.sll_protocol = protocol;
        sll.sll_ifindex = if_index as libc::c_int;

        let ret = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &sll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        log::debug!("opened AF_PACKET socket on {} (ifindex {})", interface, if_index);
        Ok(Self {
            fd,
            if_index,
            interface: interface.to_string(),
        })
    }

    /// Pushes one frame to the device queue without blocking.
    pub fn send(&self, frame: &[u8]) -> io::Result<usize> {
        let ret = unsafe {
            libc::sendto(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                libc::MSG_DONTWAIT | libc::MSG_NOSIGNAL,
                ptr::null(),
                0,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    pub fn is_running(&self) -> io::Result<bool> {
        interface_is_running(&self.interface)
    }

    pub fn if_index(&self) -> u32 {
        self.if_index
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl AsRawFd for PacketSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
