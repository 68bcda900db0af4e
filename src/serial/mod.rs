pub mod control;
pub mod error;
pub mod interrupt;
pub mod line_info;
pub mod port;
pub mod pump;
pub mod state;

pub use control::{ControlOutcome, SetupPacket};
pub use error::CdcError;
pub use interrupt::CdcInterrupt;
pub use line_info::{LineCoding, LineInfo, LineState, SharedLineInfo};
pub use port::CdcSerial;
pub use state::CdcState;
