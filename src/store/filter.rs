//! Error listing filter and pagination.

use chrono::{DateTime, Utc};

use crate::model::rule::Priority;

#[derive(Debug, Clone, Default)]
pub struct ErrorFilter {
    pub namespace: Option<String>,
    pub pod_contains: Option<String>,
    pub priority: Option<Priority>,
    pub remediated: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}
