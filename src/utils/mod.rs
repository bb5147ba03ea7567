pub mod mobile_cache;
pub mod mobile_filter;
