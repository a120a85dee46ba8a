//! Choosing a watch from scan results

use crate::config::KnownDevice;

/// Match a Bluetooth address ignoring case
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// The entry in `found` with `address`, if it was seen
pub fn find_by_address<'a>(found: &'a [KnownDevice], address: &str) -> Option<&'a KnownDevice> {
    found.iter().find(|d| same_address(&d.address, address))
}

/// One `[index] name (address)` line per device
pub fn menu(found: &[KnownDevice]) -> String {
    found
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let name = if d.name.is_empty() { "Unknown" } else { &d.name };
            format!("[{}] {} ({})\n", i, name, d.address)
        })
        .collect()
}

/// Parse a menu answer; `None` for anything but a listed index
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|&i| i < count)
}
