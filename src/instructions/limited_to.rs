//! `limitedTo(single, n)` → `LIMIT 1` / `LIMIT n+1` (spec §4.3). The
//! extra row is the has-more sentinel the transaction inspects when
//! emitting pagination cursors.

use crate::ir::LimitedTo;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub fn render_limit(limit: &LimitedTo) -> String {
    if limit.single {
        "LIMIT 1".to_string()
    } else {
        let n = limit.count.unwrap_or(DEFAULT_PAGE_SIZE);
        format!("LIMIT {}", n as u64 + 1)
    }
}

pub fn page_size(limit: &LimitedTo) -> u32 {
    limit.count.unwrap_or(DEFAULT_PAGE_SIZE)
}
