//! Live capture socket: wire protocol, send guard and connection task.

pub mod channel;
pub mod protocol;
pub mod socket;

pub use channel::{ChannelHandle, ChannelState, Outbound};
pub use protocol::{ControlToken, OutputType, ServerEvent};
pub use socket::{RelayError, RelayEvent, SocketRelay};
