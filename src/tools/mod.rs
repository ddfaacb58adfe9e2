pub mod handoff;
pub mod python;
pub mod registry;
pub mod shell;
pub mod traits;
pub mod types;

pub use handoff::TransferTool;
pub use python::PythonTool;
pub use registry::ToolRegistry;
pub use shell::ShellTool;
pub use traits::{CapabilityProvider, Tool};
pub use types::{ToolResult, ToolSpec};
