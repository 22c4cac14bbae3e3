pub mod dispatch;
pub mod runtime;
pub mod status;
