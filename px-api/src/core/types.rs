//! Core types used throughout the POSIX personality

/// Process identifier type
pub type Pid = u32;

/// File descriptor type
pub type Fd = i32;

/// Address inside a process's address space
pub type Addr = usize;

/// Size type
pub type Size = usize;

/// Platform page size
pub const PAGE_SIZE: Size = 4096;

/// Mask clearing the in-page offset bits
pub const PAGE_MASK: Size = !(PAGE_SIZE - 1);

/// Round `size` up to the next multiple of [`PAGE_SIZE`]
pub const fn page_round_up(size: Size) -> Size {
    (size + PAGE_SIZE - 1) & PAGE_MASK
}

/// Round `addr` down to the start of its page
pub const fn page_round_down(addr: Addr) -> Addr {
    addr & PAGE_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_rounding() {
        assert_eq!(page_round_up(0), 0);
        assert_eq!(page_round_up(1), PAGE_SIZE);
        assert_eq!(page_round_up(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(page_round_up(PAGE_SIZE + 1), 2 * PAGE_SIZE);
        assert_eq!(page_round_down(PAGE_SIZE + 17), PAGE_SIZE);
    }
}
