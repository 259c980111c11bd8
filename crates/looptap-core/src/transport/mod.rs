pub(crate) mod fsm;
pub(crate) mod manager;

pub use fsm::{Phase, TransportRequest, TRANSITIONS};
pub use manager::TransportState;
