pub mod address;
pub mod command;
pub mod dropped_frames;
pub mod framing;
pub mod generation;
pub mod response;
pub mod system;

pub use address::{Address, Target};
pub use command::{Command2012, Command2014, KickStyle, RadioCommand, RobotCommand, Sync2014, Velocity};
pub use dropped_frames::{DroppedFrameCounter, DroppedFrameStatistics};
pub use framing::{FrameBuilder, TransceiverReply};
pub use generation::Generation;
pub use response::{ExtendedError, Extension, RadioResponse, Response2012, Response2014, RobotResponse};
pub use system::{GenerationFrame, RadioSystem, RobotSpec, TransceiverEvent, TransceiverOutput};
