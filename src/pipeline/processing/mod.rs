// Pipeline processing: brand/model matching, attribute normalization and
// per-item cleanup

pub mod matcher;
pub mod normalize;
pub mod postprocess;
pub mod slug;
