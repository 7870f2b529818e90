//! Render-range node kinds (spec §3.6, §6.3 "Ranges"). Plain data; the
//! scheduling algorithm that selects among a sorted list of these lives in
//! [`crate::render_range`].

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeContinuous {
    pub start_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeNoRender {
    pub start_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeOnce {
    pub start_time: f64,
    pub render_time: f64,
    pub updated: bool,
}
