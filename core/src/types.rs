// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Pagination with a limit and an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    /// The maximum number of items to return, negative for no limit.
    pub limit: i64,

    /// The number of items to skip before starting to collect the result set.
    pub offset: i64,
}

impl Pager {
    /// Every item.
    pub const ALL: Pager = Pager {
        limit: -1,
        offset: 0,
    };
}

impl From<(i64, i64)> for Pager {
    fn from((limit, offset): (i64, i64)) -> Self {
        Pager { limit, offset }
    }
}
