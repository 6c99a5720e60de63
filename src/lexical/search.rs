//! Search execution boundary: sorting, requests and the searcher traits.

pub mod searcher;
