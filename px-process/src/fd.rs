//! File-descriptor table

use alloc::sync::Arc;
use alloc::vec::Vec;

use px_api::error::invalid_argument;
use px_api::{Error, Fd, IoChannel, Result};
use spin::Mutex;

/// Maps small integers to the I/O channels a process has open
pub struct FdRegistry {
    slots: Mutex<Vec<Option<Arc<dyn IoChannel>>>>,
}

impl FdRegistry {
    /// Create a table with `capacity` empty slots
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots: Mutex::new(slots),
        }
    }

    fn index(&self, fd: Fd, len: usize) -> Option<usize> {
        usize::try_from(fd).ok().filter(|&i| i < len)
    }

    /// Install `channel` at `fd`, or at the lowest free slot when `None`
    ///
    /// An explicit `fd` replaces whatever was open there.
    pub fn add_io_channel(&self, channel: Arc<dyn IoChannel>, fd: Option<Fd>) -> Result<Fd> {
        let mut slots = self.slots.lock();
        let index = match fd {
            Some(fd) => self.index(fd, slots.len()).ok_or(Error::InvalidFd(fd))?,
            None => slots
                .iter()
                .position(Option::is_none)
                .ok_or_else(|| invalid_argument("descriptor table full"))?,
        };
        slots[index] = Some(channel);
        Ok(index as Fd)
    }

    /// Close `fd`, returning the channel it referred to
    pub fn remove_io_channel(&self, fd: Fd) -> Result<Arc<dyn IoChannel>> {
        let mut slots = self.slots.lock();
        self.index(fd, slots.len())
            .and_then(|i| slots[i].take())
            .ok_or(Error::InvalidFd(fd))
    }

    /// Channel open at `fd`
    pub fn io_channel_by_fd(&self, fd: Fd) -> Result<Arc<dyn IoChannel>> {
        let slots = self.slots.lock();
        self.index(fd, slots.len())
            .and_then(|i| slots[i].clone())
            .ok_or(Error::InvalidFd(fd))
    }

    pub fn fd_in_use(&self, fd: Fd) -> bool {
        self.io_channel_by_fd(fd).is_ok()
    }

    /// Every open descriptor with its channel, in ascending order
    pub fn open_fds(&self) -> Vec<(Fd, Arc<dyn IoChannel>)> {
        self.slots
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.clone().map(|ch| (i as Fd, ch)))
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }
}
