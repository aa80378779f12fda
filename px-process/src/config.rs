//! Process configuration

use core::mem::size_of;

use px_api::PAGE_SIZE;

/// Sizes and limits applied to every process created from one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Longest process name kept; longer names are truncated
    pub max_name_len: usize,
    /// Capacity of the argument blob
    pub args_ds_size: usize,
    /// Granularity of dataspaces and region placement
    pub page_size: usize,
    /// Stack size of a process's request-dispatch thread
    pub entrypoint_stack_size: usize,
    /// Number of slots in the descriptor table
    pub max_file_descriptors: usize,
    /// Bytes a process may allocate through its RAM session
    pub ram_quota: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_name_len: 64,
            args_ds_size: 4096,
            page_size: PAGE_SIZE,
            entrypoint_stack_size: 64 * 1024 * size_of::<usize>(),
            max_file_descriptors: 64,
            ram_quota: 16 * 1024 * 1024,
        }
    }
}

impl ProcessConfig {
    /// Round `size` up to the configured page size
    pub fn page_round_up(&self, size: usize) -> usize {
        size.div_ceil(self.page_size) * self.page_size
    }

    /// Truncate `name` to `max_name_len` bytes on a character boundary
    pub fn truncate_name<'a>(&self, name: &'a str) -> &'a str {
        if name.len() <= self.max_name_len {
            return name;
        }
        let mut end = self.max_name_len;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        &name[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessConfig::default();
        assert_eq!(config.max_name_len, 64);
        assert_eq!(config.args_ds_size, 4096);
        assert_eq!(config.page_round_up(1), 4096);
        assert_eq!(config.page_round_up(8192), 8192);
    }

    #[test]
    fn test_truncate_name() {
        let config = ProcessConfig {
            max_name_len: 4,
            ..ProcessConfig::default()
        };
        assert_eq!(config.truncate_name("ls"), "ls");
        assert_eq!(config.truncate_name("bash"), "bash");
        assert_eq!(config.truncate_name("python"), "pyth");
        // never splits a multi-byte character
        assert_eq!(config.truncate_name("abcé"), "abc");
    }
}
